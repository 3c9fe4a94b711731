//! Copying interface documentation onto method declarations.
//!
//! For each method of a type with an implements edge, the method's doc
//! comment is decided from the interface method's doc:
//!
//! | Method doc      | replace off | replace on            |
//! |-----------------|-------------|-----------------------|
//! | none            | inject      | inject                |
//! | directives only | inject      | inject                |
//! | prose           | keep        | replace (unless same) |
//!
//! Directives are never lost: a directive-only group stays below the new
//! doc, and directives of a replaced group are re-attached after it.

use tracing::trace;
use tugdocs_core::output::{DocAction, Location, MethodChange};
use tugdocs_core::text::line_start;
use tugdocs_go::ast::{FuncDecl, SourceFile};
use tugdocs_go::comments::{is_directive, CommentGroup, CommentLine, GroupId};
use tugdocs_go::types::PackageScope;

use crate::implements::ImplementsMap;
use crate::registry::InterfaceRegistry;

/// Result of annotating one file.
#[derive(Debug, Clone, Default)]
pub struct FileAnnotation {
    /// True when the file's comment set was modified.
    pub changed: bool,
    /// Methods whose documentation changed, in source order.
    pub changes: Vec<MethodChange>,
}

/// A planned doc change for one method.
struct Plan {
    remove: Option<GroupId>,
    group: CommentGroup,
    change: MethodChange,
}

/// Annotate every method of `file`, a file of the package summarized by
/// `scope`. Mutates the file's comment set; the set is left unsorted.
pub fn annotate_file(
    file: &mut SourceFile,
    scope: &PackageScope,
    registry: &InterfaceRegistry,
    implements: &ImplementsMap,
    replace: bool,
) -> FileAnnotation {
    let plans: Vec<Plan> = file
        .funcs()
        .filter_map(|func| plan_method(file, func, scope, registry, implements, replace))
        .collect();

    let mut annotation = FileAnnotation::default();
    for plan in plans {
        if let Some(id) = plan.remove {
            file.comments.remove_where(|g| g.id() == Some(id));
        }
        file.comments.append(plan.group);
        annotation.changes.push(plan.change);
    }
    annotation.changed = !annotation.changes.is_empty();
    annotation
}

fn plan_method(
    file: &SourceFile,
    func: &FuncDecl,
    scope: &PackageScope,
    registry: &InterfaceRegistry,
    implements: &ImplementsMap,
    replace: bool,
) -> Option<Plan> {
    let method = func.name.name.as_str();
    let receiver = scope.receiver_type_name(func.single_receiver()?)?;
    let interface = implements.get(&scope.path, &receiver)?;
    let Some(doc) = registry.lookup(interface, method) else {
        trace!(receiver = %receiver, method, interface, "No interface doc for method");
        return None;
    };

    let existing = func
        .doc
        .filter(|id| file.comments.contains(*id))
        .and_then(|id| file.original_group(id).map(|g| (id, g)));

    let source = file.source.as_str();
    let (anchor_at, remove, directives, action) = match existing {
        None => (func.span.start, None, Vec::new(), DocAction::Injected),
        Some((_, group)) if group.text().is_empty() => {
            (group.pos(), None, Vec::new(), DocAction::Injected)
        }
        Some((id, group)) => {
            if !replace {
                trace!(receiver = %receiver, method, "Keeping existing doc");
                return None;
            }
            let texts = group.texts();
            if prose(&texts) == prose_owned(doc) {
                trace!(receiver = %receiver, method, "Existing doc already matches");
                return None;
            }
            let directives: Vec<String> = texts
                .into_iter()
                .filter(|t| is_directive(t))
                .map(str::to_string)
                .collect();
            (func.span.start, Some(id), directives, DocAction::Replaced)
        }
    };

    let (anchor, indent) = anchor_of(source, anchor_at);
    let lines = doc
        .iter()
        .chain(directives.iter())
        .enumerate()
        .map(|(i, text)| CommentLine {
            text: text.clone(),
            leading_blank: i == 0,
        })
        .collect();

    let (line, col) = file.position(func.span.start);
    Some(Plan {
        remove,
        group: CommentGroup::Injected {
            anchor,
            indent,
            lines,
        },
        change: MethodChange {
            location: Location::new(file.display_path.clone(), line, col),
            receiver,
            method: method.to_string(),
            interface: interface.to_string(),
            action,
        },
    })
}

/// Where to print a doc for code starting at `offset`: the start of its
/// line with that line's indentation, or `offset` itself when other code
/// precedes it on the line.
fn anchor_of(source: &str, offset: usize) -> (usize, String) {
    let start = line_start(source, offset);
    let prefix = &source[start..offset];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        (start, prefix.to_string())
    } else {
        (offset, String::new())
    }
}

fn prose<'a>(texts: &[&'a str]) -> Vec<&'a str> {
    texts.iter().copied().filter(|t| !is_directive(t)).collect()
}

fn prose_owned(texts: &[String]) -> Vec<&str> {
    texts
        .iter()
        .map(String::as_str)
        .filter(|t| !is_directive(t))
        .collect()
}
