//! Error bridge implementations for Go support errors.
//!
//! `impl From<X> for DocsError` conversions live here rather than in
//! `tugdocs-core`, which knows nothing about Go.

use tugdocs_core::error::DocsError;

use crate::loader::LoadError;
use crate::parser::ParseError;
use crate::printer::EmitError;

// ============================================================================
// Bridge: LoadError -> DocsError
// ============================================================================

impl From<LoadError> for DocsError {
    fn from(err: LoadError) -> Self {
        DocsError::load(err.subject(), err.to_string())
    }
}

impl From<ParseError> for DocsError {
    fn from(err: ParseError) -> Self {
        DocsError::from(LoadError::from(err))
    }
}

// ============================================================================
// Bridge: EmitError -> DocsError
// ============================================================================

impl From<EmitError> for DocsError {
    fn from(err: EmitError) -> Self {
        match err {
            EmitError::Io { path, source } => DocsError::emit(path, source.to_string()),
            // An unsorted comment set is a bug in the caller, not an I/O problem.
            EmitError::CommentOrder { .. } => DocsError::internal(err.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tugdocs_core::error::OutputErrorCode;

    #[test]
    fn load_errors_name_their_subject() {
        let err = DocsError::from(LoadError::NoGoFiles {
            dir: "pkg/empty".to_string(),
        });
        assert_eq!(err.error_code(), OutputErrorCode::LoadError);
        match err {
            DocsError::LoadFailed { package, message } => {
                assert_eq!(package, "pkg/empty");
                assert_eq!(message, "no Go files in pkg/empty");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn parse_errors_are_load_errors() {
        let err = DocsError::from(ParseError::Syntax {
            path: "a.go".to_string(),
            line: 3,
            col: 1,
            message: "expected type".to_string(),
        });
        assert!(matches!(err, DocsError::LoadFailed { ref package, .. } if package == "a.go"));
    }

    #[test]
    fn emit_errors_keep_the_path() {
        let err = DocsError::from(EmitError::Io {
            path: "a.go".to_string(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        });
        assert_eq!(err.error_code(), OutputErrorCode::EmitError);
        assert!(matches!(err, DocsError::EmitFailed { ref path, .. } if path == "a.go"));

        let err = DocsError::from(EmitError::CommentOrder {
            path: "a.go".to_string(),
            pos: 4,
        });
        assert_eq!(err.error_code(), OutputErrorCode::InternalError);
    }
}
