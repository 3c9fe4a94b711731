//! Binary entry point for the tugdocs CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Copy interface docs onto undocumented methods of one package
//! tugdocs ./pkg/store
//!
//! # Every package of the module, overwriting stale docs
//! tugdocs --replace ./...
//!
//! # Preview as a diff, including interfaces of imported packages
//! tugdocs --dry-run --imports ./...
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use tugdocs::cli::{format_text, run_docs};
use tugdocs::engine::DocSyncOptions;
use tugdocs_core::error::DocsError;
use tugdocs_core::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Copy Go interface method documentation onto implementing methods.
///
/// A type opts in with a marker declaration such as
/// `var _ Fooer = (*Concrete)(nil)`.
#[derive(Parser, Debug)]
#[command(name = "tugdocs", version, about)]
struct Cli {
    /// Packages to update: directories, `dir/...` patterns or import paths.
    #[arg(value_name = "PACKAGE", required = true)]
    packages: Vec<String>,

    /// Also copy docs from interfaces declared in directly imported packages.
    #[arg(long)]
    imports: bool,

    /// Replace existing method documentation.
    #[arg(long)]
    replace: bool,

    /// Print a unified diff instead of writing files.
    #[arg(long)]
    dry_run: bool,

    /// Output format for the run summary.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level for tracing output (`RUST_LOG` overrides).
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Workspace root directory (default: current directory).
    #[arg(long)]
    workspace: Option<PathBuf>,
}

/// Output format for the run summary and errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl Cli {
    fn options(&self) -> DocSyncOptions {
        DocSyncOptions {
            imports: self.imports,
            replace: self.replace,
            dry_run: self.dry_run,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level);

    let format = cli.format;
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, format);
            ExitCode::from(err.error_code().code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the run and print its summary.
fn execute(cli: Cli) -> Result<(), DocsError> {
    let workspace = match &cli.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| DocsError::internal(format!("cannot read current directory: {}", e)))?,
    };

    let response = run_docs(&workspace, &cli.packages, cli.options())?;

    let mut stdout = io::stdout();
    let written = match cli.format {
        OutputFormat::Json => emit_response(&response, &mut stdout),
        OutputFormat::Text => stdout.write_all(format_text(&response).as_bytes()),
    };
    written
        .and_then(|_| stdout.flush())
        .map_err(|e| DocsError::internal(format!("cannot write output: {}", e)))
}

/// Print an error: JSON on stdout, or one line on stderr.
fn report_error(err: &DocsError, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let response = ErrorResponse::from_error(err);
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();
        }
        OutputFormat::Text => {
            eprintln!("error: {}", err);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
