//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count bytes, not characters

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Span
// ============================================================================

/// Byte offsets into file content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Byte-based Conversions
// ============================================================================

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds content length, returns position at end of content.
pub fn byte_offset_to_position(content: &[u8], offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for &byte in &content[..offset] {
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0)
}

/// Count the number of lines in the content.
pub fn line_count(content: &[u8]) -> u32 {
    let newlines = content.iter().filter(|&&b| b == b'\n').count() as u32;
    if content.is_empty() {
        0
    } else if content.last() == Some(&b'\n') {
        newlines
    } else {
        newlines + 1
    }
}

/// Line terminator used by the content: `"\r\n"` if its first line ends that way.
pub fn line_ending(content: &str) -> &'static str {
    match content.find('\n') {
        Some(i) if i > 0 && content.as_bytes()[i - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

// ============================================================================
// Line Index
// ============================================================================

/// Precomputed line starts for repeated offset -> line lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Build the index for `content`.
    pub fn new(content: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineIndex { starts }
    }

    /// 1-indexed line containing `offset`.
    pub fn line_of(&self, offset: usize) -> u32 {
        match self.starts.binary_search(&offset) {
            Ok(i) => i as u32 + 1,
            Err(i) => i as u32,
        }
    }

    /// 1-indexed `(line, col)` of `offset`.
    pub fn position_of(&self, offset: usize) -> (u32, u32) {
        let line = self.line_of(offset);
        let start = self.starts[line as usize - 1];
        (line, (offset - start) as u32 + 1)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod byte_based_tests {
        use super::*;

        #[test]
        fn offset_to_position_simple() {
            let content = b"line1\nline2\nline3\n";
            assert_eq!(byte_offset_to_position(content, 0), (1, 1));
            assert_eq!(byte_offset_to_position(content, 4), (1, 5));
            assert_eq!(byte_offset_to_position(content, 5), (1, 6));
            assert_eq!(byte_offset_to_position(content, 6), (2, 1));
            assert_eq!(byte_offset_to_position(content, 12), (3, 1));
        }

        #[test]
        fn offset_beyond_content() {
            let content = b"short";
            assert_eq!(byte_offset_to_position(content, 100), (1, 6));
        }

        #[test]
        fn line_start_of_offsets() {
            let content = "ab\ncd\nef";
            assert_eq!(line_start(content, 0), 0);
            assert_eq!(line_start(content, 2), 0);
            assert_eq!(line_start(content, 3), 3);
            assert_eq!(line_start(content, 7), 6);
        }

        #[test]
        fn count_lines() {
            assert_eq!(line_count(b""), 0);
            assert_eq!(line_count(b"a"), 1);
            assert_eq!(line_count(b"a\n"), 1);
            assert_eq!(line_count(b"a\nb"), 2);
        }

        #[test]
        fn detects_crlf() {
            assert_eq!(line_ending("package a\r\n"), "\r\n");
            assert_eq!(line_ending("package a\n"), "\n");
            assert_eq!(line_ending("package a"), "\n");
        }
    }

    mod line_index_tests {
        use super::*;

        #[test]
        fn agrees_with_linear_scan() {
            let content = "package p\n\n// doc\nfunc f() {}\n";
            let index = LineIndex::new(content);
            for offset in 0..content.len() {
                assert_eq!(
                    index.position_of(offset),
                    byte_offset_to_position(content.as_bytes(), offset),
                    "offset {}",
                    offset
                );
            }
        }
    }

    mod span_tests {
        use super::*;

        #[test]
        fn cover_and_contains() {
            let a = Span::new(2, 5);
            let b = Span::new(4, 9);
            let c = a.cover(&b);
            assert_eq!(c, Span::new(2, 9));
            assert!(c.contains(&a));
            assert!(!a.contains(&b));
            assert_eq!(c.len(), 7);
        }

        #[test]
        #[should_panic]
        fn inverted_span_panics() {
            let _ = Span::new(3, 1);
        }
    }
}
