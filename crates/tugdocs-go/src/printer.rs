//! Printing a file back from its code text and comment set.
//!
//! Code is never reformatted. The printer copies the original source and
//! applies two kinds of edits taken from the comment set:
//!
//! - original groups no longer in the set are cut out (with their lines,
//!   when they stand alone on them);
//! - injected groups are written, one comment per line, before their anchor.
//!
//! The comment set must be sorted by position (see
//! [`CommentSet::sort_by_position`](crate::comments::CommentSet::sort_by_position)).

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tugdocs_core::text::{line_ending, line_start, Span};

use crate::ast::SourceFile;
use crate::comments::{CommentGroup, CommentLine};

/// Failure to print or write a file.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("{path}: comment set is not sorted at offset {pos}")]
    CommentOrder { path: String, pos: usize },

    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// An edit to the original source.
enum Edit<'a> {
    /// Drop the bytes of `span`.
    Cut(Span),
    /// Write a comment group before byte `anchor`.
    Insert {
        anchor: usize,
        indent: &'a str,
        lines: &'a [CommentLine],
    },
}

impl Edit<'_> {
    fn pos(&self) -> usize {
        match self {
            Edit::Cut(span) => span.start,
            Edit::Insert { anchor, .. } => *anchor,
        }
    }

    fn is_cut(&self) -> bool {
        matches!(self, Edit::Cut(_))
    }
}

/// Print `file` with its current comment set.
pub fn render(file: &SourceFile) -> Result<String, EmitError> {
    let groups: Vec<&CommentGroup> = file.comments.iter().collect();
    if let Some(w) = groups.windows(2).find(|w| w[0].pos() > w[1].pos()) {
        return Err(EmitError::CommentOrder {
            path: file.display_path.clone(),
            pos: w[1].pos(),
        });
    }

    let source = file.source.as_str();
    let mut edits: Vec<Edit> = Vec::new();
    for group in &file.original_groups {
        if let CommentGroup::Original { id, span, .. } = group {
            if !file.comments.contains(*id) {
                edits.push(Edit::Cut(removal_span(source, *span)));
            }
        }
    }
    for group in groups {
        if let CommentGroup::Injected {
            anchor,
            indent,
            lines,
        } = group
        {
            edits.push(Edit::Insert {
                anchor: *anchor,
                indent,
                lines,
            });
        }
    }
    // Stable: inserts sharing an anchor keep comment set order.
    edits.sort_by_key(|e| (e.pos(), !e.is_cut()));

    let eol = line_ending(source);
    let mut out = String::with_capacity(source.len() + 256);
    let mut cursor = 0;
    for edit in edits {
        match edit {
            Edit::Cut(span) => {
                if span.start > cursor {
                    out.push_str(&source[cursor..span.start]);
                }
                cursor = cursor.max(span.end);
            }
            Edit::Insert {
                anchor,
                indent,
                lines,
            } => {
                let anchor = anchor.clamp(cursor, source.len());
                out.push_str(&source[cursor..anchor]);
                cursor = anchor;
                write_group(&mut out, eol, indent, lines);
            }
        }
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Render `file` and replace it on disk. Returns the new contents.
pub fn emit(file: &SourceFile) -> Result<String, EmitError> {
    let text = render(file)?;
    atomic_write(&file.path, text.as_bytes()).map_err(|source| EmitError::Io {
        path: file.display_path.clone(),
        source,
    })?;
    Ok(text)
}

/// Bytes to drop for a removed group: whole lines when nothing else shares
/// them, otherwise just the comments.
fn removal_span(source: &str, span: Span) -> Span {
    let start = line_start(source, span.start);
    let before_alone = source[start..span.start].trim().is_empty();
    let rest = &source[span.end..];
    let line_rest = rest.find('\n').map_or(rest, |i| &rest[..i]);
    let after_alone = line_rest.trim().is_empty();
    if before_alone && after_alone {
        let end = (span.end + line_rest.len() + 1).min(source.len());
        Span::new(start, end)
    } else {
        span
    }
}

fn write_group(out: &mut String, eol: &str, indent: &str, lines: &[CommentLine]) {
    let mid_line = !out.is_empty() && !out.ends_with('\n');
    if mid_line {
        out.push_str(eol);
    }
    if lines.first().is_some_and(|l| l.leading_blank) && !out.is_empty() && !last_line_blank(out)
    {
        out.push_str(eol);
    }
    for line in lines {
        out.push_str(indent);
        out.push_str(&line.text);
        out.push_str(eol);
    }
    if mid_line {
        out.push_str(indent);
    }
}

/// True if the last complete line of `out` holds only whitespace.
fn last_line_blank(out: &str) -> bool {
    let body = out.strip_suffix('\n').unwrap_or(out);
    let last = body.rfind('\n').map_or(body, |i| &body[i + 1..]);
    last.trim().is_empty()
}

/// Write via a temp file in the same directory, then rename over `path`.
/// The original file's permissions are kept.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let pid = std::process::id();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        pid,
        timestamp
    ));

    let permissions = fs::metadata(path).ok().map(|m| m.permissions());
    fs::write(&temp_path, content)?;
    if let Some(permissions) = permissions {
        fs::set_permissions(&temp_path, permissions)?;
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
