//! JSON output types and serialization for CLI responses.
//!
//! These types are the machine-readable contract of `tugdocs --format json`.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as first field
//! 2. **Deterministic:** Same input -> same output (field order, array ordering)
//! 3. **Nullable vs absent:** absent field means "not applicable"
//! 4. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{DocsError, OutputErrorCode};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Location
// ============================================================================

/// Location in a source file.
///
/// - `file`: path as given to / discovered by the loader
/// - `line`: 1-indexed line number
/// - `col`: 1-indexed column, UTF-8 bytes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// File path.
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, UTF-8 bytes).
    pub col: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Location {
            file: file.into(),
            line,
            col,
        }
    }
}

// ============================================================================
// Run Response
// ============================================================================

/// What happened to a single method's documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocAction {
    /// The method had no documentation; the interface doc was copied.
    Injected,
    /// The method's documentation was replaced by the interface doc.
    Replaced,
}

impl std::fmt::Display for DocAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocAction::Injected => write!(f, "injected"),
            DocAction::Replaced => write!(f, "replaced"),
        }
    }
}

/// One method whose documentation was changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodChange {
    /// Location of the method declaration (before rewriting).
    pub location: Location,
    /// Receiver type name, without pointer.
    pub receiver: String,
    /// Method name.
    pub method: String,
    /// Interface the documentation was copied from.
    pub interface: String,
    /// Whether the doc was injected or replaced.
    pub action: DocAction,
}

/// Successful run response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// True when nothing was written to disk.
    pub dry_run: bool,
    /// Number of packages annotated.
    pub packages: usize,
    /// Changed methods, in file then source order.
    pub changes: Vec<MethodChange>,
    /// Files rewritten (or that would be rewritten in a dry run).
    pub files: Vec<String>,
    /// Unified diff of all changes (dry run only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl RunResponse {
    /// Create a run response.
    pub fn new(
        dry_run: bool,
        packages: usize,
        changes: Vec<MethodChange>,
        files: Vec<String>,
        diff: Option<String>,
    ) -> Self {
        RunResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            dry_run,
            packages,
            changes,
            files,
            diff,
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Error information for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code (also the exit status).
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// File the error is about, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorInfo {
    /// Create from a DocsError.
    pub fn from_error(err: &DocsError) -> Self {
        let path = match err {
            DocsError::EmitFailed { path, .. } => Some(path.clone()),
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            path,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a DocsError.
    pub fn from_error(err: &DocsError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
