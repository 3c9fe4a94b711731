//! Comment groups and the per-file comment set.
//!
//! A file's comments live in a [`CommentSet`] separate from its code. The
//! set is mutated by appending injected groups and removing original ones;
//! the printer merges it back with the code by position, so the set must be
//! sorted by position before printing (see [`CommentSet::sort_by_position`]).

use std::sync::LazyLock;

use regex::Regex;
use tugdocs_core::text::Span;

/// Identifier of a comment group parsed from a file, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

/// A single `//` or `/* */` comment, with its raw source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub span: Span,
    pub text: String,
}

impl Comment {
    /// True if this comment is a tool directive rather than prose.
    pub fn is_directive(&self) -> bool {
        is_directive(&self.text)
    }
}

/// A line of an injected comment group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    /// Raw comment text, including the `//` or `/* */` markers.
    pub text: String,
    /// Separate the group from preceding code by a blank line.
    pub leading_blank: bool,
}

/// A comment group attached to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentGroup {
    /// A group parsed from the file.
    Original {
        id: GroupId,
        span: Span,
        comments: Vec<Comment>,
    },
    /// A group added by a rewrite. It prints before byte `anchor`.
    Injected {
        anchor: usize,
        indent: String,
        lines: Vec<CommentLine>,
    },
}

impl CommentGroup {
    /// Position used for ordering. Injected groups sort just before their
    /// anchor, ahead of an original group that starts there.
    pub fn pos(&self) -> usize {
        match self {
            CommentGroup::Original { span, .. } => span.start,
            CommentGroup::Injected { anchor, .. } => anchor.saturating_sub(1),
        }
    }

    /// Id of an original group.
    pub fn id(&self) -> Option<GroupId> {
        match self {
            CommentGroup::Original { id, .. } => Some(*id),
            CommentGroup::Injected { .. } => None,
        }
    }

    /// Comment texts of the group, in order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            CommentGroup::Original { comments, .. } => {
                comments.iter().map(|c| c.text.as_str()).collect()
            }
            CommentGroup::Injected { lines, .. } => lines.iter().map(|l| l.text.as_str()).collect(),
        }
    }

    /// Documentation text of the group (see [`doc_text`]).
    pub fn text(&self) -> String {
        doc_text(&self.texts())
    }
}

/// The comment groups of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentSet {
    groups: Vec<CommentGroup>,
}

impl CommentSet {
    /// Create a set from groups in source order.
    pub fn new(groups: Vec<CommentGroup>) -> Self {
        CommentSet { groups }
    }

    /// Append a group. The set is unordered until the next sort.
    pub fn append(&mut self, group: CommentGroup) {
        self.groups.push(group);
    }

    /// Remove every group matching `predicate`; returns how many were removed.
    pub fn remove_where(&mut self, predicate: impl Fn(&CommentGroup) -> bool) -> usize {
        let before = self.groups.len();
        self.groups.retain(|g| !predicate(g));
        before - self.groups.len()
    }

    /// Sort groups by ascending position. Stable, so groups sharing a
    /// position keep their insertion order.
    pub fn sort_by_position(&mut self) {
        self.groups.sort_by_key(CommentGroup::pos);
    }

    /// True when positions are non-decreasing.
    pub fn is_sorted(&self) -> bool {
        self.groups.windows(2).all(|w| w[0].pos() <= w[1].pos())
    }

    /// Original group with `id`, if still present.
    pub fn get(&self, id: GroupId) -> Option<&CommentGroup> {
        self.groups.iter().find(|g| g.id() == Some(id))
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommentGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ============================================================================
// Documentation text
// ============================================================================

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^//(line |extern |export |[a-z0-9]+:[a-z0-9])").expect("directive pattern")
});

/// True if `text` is a `//`-comment directive such as `//go:generate`.
pub fn is_directive(text: &str) -> bool {
    DIRECTIVE.is_match(text)
}

/// Documentation text of a sequence of comments.
///
/// Comment markers are removed, directive comments are dropped, trailing
/// whitespace is stripped from each line, and leading/trailing blank lines
/// are removed. Multiple blank lines collapse into one. An empty result means
/// the comments carry no documentation.
pub fn doc_text(comments: &[&str]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for text in comments {
        if let Some(body) = text.strip_prefix("//") {
            if is_directive(text) {
                continue;
            }
            let body = body.strip_prefix(' ').unwrap_or(body);
            lines.push(body.to_string());
        } else if let Some(body) = text.strip_prefix("/*") {
            let body = body.strip_suffix("*/").unwrap_or(body);
            lines.extend(body.split('\n').map(str::to_string));
        }
    }

    let mut out: Vec<String> = Vec::new();
    for line in lines {
        let line = line.trim_end().to_string();
        if line.is_empty() && out.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }

    if out.is_empty() {
        String::new()
    } else {
        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

// ============================================================================
// Tests
// ============================================================================
