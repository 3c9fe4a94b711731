//! Error types and error code constants for tugdocs.
//!
//! This module provides a unified error type (`DocsError`) that bridges
//! domain-specific errors from the loader, the printer and the command
//! surface into a common format suitable for text or JSON output.
//!
//! ## Error Code Mapping
//!
//! Exit codes:
//! - `2`: Invalid arguments (no package selector, bad flag combination)
//! - `3`: Load errors (unreadable or malformed source, unresolved imports)
//! - `4`: Emit errors (destination could not be written)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! ## Design
//!
//! - **Unified type**: `DocsError` is the single error type for CLI output
//! - **Bridging**: `impl From<X> for DocsError` lives next to each `X`
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for CLI exit status and JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// Source loading or type resolution failed.
    LoadError = 3,
    /// A rewritten file could not be written.
    EmitError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// Every fatal condition of a run ends up here. Pattern mismatches during
/// scanning are never errors and never reach this type.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Loading, parsing or resolving a package failed.
    #[error("load failed for {package}: {message}")]
    LoadFailed { package: String, message: String },

    /// Writing a rewritten file failed.
    #[error("cannot write {path}: {message}")]
    EmitFailed { path: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl From<&DocsError> for OutputErrorCode {
    fn from(err: &DocsError) -> Self {
        match err {
            DocsError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            DocsError::LoadFailed { .. } => OutputErrorCode::LoadError,
            DocsError::EmitFailed { .. } => OutputErrorCode::EmitError,
            DocsError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<DocsError> for OutputErrorCode {
    fn from(err: DocsError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl DocsError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        DocsError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a load error for a package or selector.
    pub fn load(package: impl Into<String>, message: impl Into<String>) -> Self {
        DocsError::LoadFailed {
            package: package.into(),
            message: message.into(),
        }
    }

    /// Create an emit error for a destination path.
    pub fn emit(path: impl Into<String>, message: impl Into<String>) -> Self {
        DocsError::EmitFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        DocsError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn invalid_arguments_maps_to_two() {
            let err = DocsError::invalid_args("no package given");
            assert_eq!(
                OutputErrorCode::from(&err),
                OutputErrorCode::InvalidArguments
            );
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn load_failure_maps_to_three() {
            let err = DocsError::load("./...", "unexpected token");
            assert_eq!(err.error_code(), OutputErrorCode::LoadError);
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn emit_failure_maps_to_four() {
            let err = DocsError::emit("a/b.go", "permission denied");
            assert_eq!(err.error_code().code(), 4);
        }

        #[test]
        fn internal_maps_to_ten() {
            let err = DocsError::internal("oops");
            assert_eq!(OutputErrorCode::from(err).code(), 10);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn load_error_names_package() {
            let err = DocsError::load("example.com/m/pkg", "unresolved import \"x/y\"");
            assert_eq!(
                err.to_string(),
                "load failed for example.com/m/pkg: unresolved import \"x/y\""
            );
        }

        #[test]
        fn emit_error_names_path() {
            let err = DocsError::emit("pkg/impl.go", "read-only file system");
            assert_eq!(
                err.to_string(),
                "cannot write pkg/impl.go: read-only file system"
            );
        }

        #[test]
        fn code_display_is_numeric() {
            assert_eq!(OutputErrorCode::EmitError.to_string(), "4");
        }
    }
}
