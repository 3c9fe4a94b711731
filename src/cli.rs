//! CLI front door.
//!
//! Helpers behind the `tugdocs` binary: running a sync against the process
//! environment and rendering its summary.
//!
//! ## Error Handling
//!
//! Functions return `Result<T, DocsError>`; the binary maps the error to an
//! exit status with `DocsError::error_code`.

use std::fmt::Write;
use std::path::Path;

use tugdocs_core::error::DocsError;
use tugdocs_core::output::RunResponse;
use tugdocs_go::loader::GoEnv;

use crate::engine::{DocSync, DocSyncOptions};

/// Run a sync on `packages`, resolving directory selectors against
/// `workspace` and imports against the Go environment variables.
pub fn run_docs(
    workspace: &Path,
    packages: &[String],
    options: DocSyncOptions,
) -> Result<RunResponse, DocsError> {
    if !workspace.is_dir() {
        return Err(DocsError::invalid_args(format!(
            "workspace {} is not a directory",
            workspace.display()
        )));
    }
    DocSync::new(workspace, GoEnv::from_env(), options).run(packages)
}

/// Human-readable summary of a run.
///
/// One line per changed method, a closing count, then the diff of a dry run.
pub fn format_text(response: &RunResponse) -> String {
    let mut out = String::new();
    for change in &response.changes {
        let _ = writeln!(
            out,
            "{}:{}: {} {}.{} from {}",
            change.location.file,
            change.location.line,
            change.action,
            change.receiver,
            change.method,
            change.interface
        );
    }

    let verb = if response.dry_run {
        "would update"
    } else {
        "updated"
    };
    let _ = writeln!(
        out,
        "{} {} {} in {} {}",
        verb,
        response.changes.len(),
        plural(response.changes.len(), "method", "methods"),
        response.files.len(),
        plural(response.files.len(), "file", "files"),
    );

    if let Some(diff) = response.diff.as_deref().filter(|d| !d.is_empty()) {
        out.push('\n');
        out.push_str(diff);
    }
    out
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tugdocs_core::output::{DocAction, Location, MethodChange};

    fn change(method: &str, action: DocAction) -> MethodChange {
        MethodChange {
            location: Location::new("docs/concrete.go", 7, 1),
            receiver: "Concrete".to_string(),
            method: method.to_string(),
            interface: "example.com/m/docs.Fooer".to_string(),
            action,
        }
    }

    #[test]
    fn text_lists_changes_and_counts() {
        let response = RunResponse::new(
            false,
            1,
            vec![
                change("Foo", DocAction::Injected),
                change("Bar", DocAction::Replaced),
            ],
            vec!["docs/concrete.go".to_string()],
            None,
        );
        assert_eq!(
            format_text(&response),
            "docs/concrete.go:7: injected Concrete.Foo from example.com/m/docs.Fooer\n\
             docs/concrete.go:7: replaced Concrete.Bar from example.com/m/docs.Fooer\n\
             updated 2 methods in 1 file\n"
        );
    }

    #[test]
    fn dry_run_text_ends_with_diff() {
        let response = RunResponse::new(true, 1, vec![], vec![], Some("--- a/x\n".to_string()));
        assert_eq!(
            format_text(&response),
            "would update 0 methods in 0 files\n\n--- a/x\n"
        );
    }

    #[test]
    fn missing_workspace_is_invalid() {
        let err = run_docs(
            Path::new("/definitely/not/here"),
            &[".".to_string()],
            DocSyncOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DocsError::InvalidArguments { .. }));
    }
}
