//! Binary entry point for the mov-pkg CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Point every reference to store's models.go types at the models package
//! mov-pkg -f example.com/app/store -t example.com/app/models ./...
//!
//! # Rename while relocating, preview only
//! mov-pkg -f example.com/app/store -t example.com/app/models -s DB -d --format diff ./...
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use movpkg::cli::{parse_names, render_diff, render_json, render_text, run_relocate, workspace_root};
use movpkg_core::error::{MoveError, OutputErrorCode};
use movpkg_core::output::{emit_response, ErrorResponse};
use movpkg_go::ops::relocate::{RelocationRequest, DEFAULT_LOCATED};
use movpkg_go::verification::VerificationMode;

// ============================================================================
// CLI Structure
// ============================================================================

/// Relocate references to Go types from one package to another.
///
/// Every reference to a type declared in the source package (in a file
/// matching --located) is rewritten to point at the target package, and
/// imports are fixed up. The declarations themselves are not moved.
#[derive(Parser, Debug)]
#[command(name = "mov-pkg", version, about = "Relocate references to Go types across packages")]
struct Cli {
    /// Import path of the package the types are declared in.
    #[arg(short = 'f', long = "from")]
    from: String,

    /// Import path of the package references should point at.
    #[arg(short = 't', long = "to")]
    to: String,

    /// Qualifier for the target package (default: its package name).
    #[arg(short = 'a', long)]
    alias: Option<String>,

    /// Only relocate types declared in files whose path contains this.
    #[arg(short = 'l', long, default_value = DEFAULT_LOCATED)]
    located: String,

    /// Only relocate these types. Comma-separated, may be repeated.
    #[arg(short = 'n', long = "names", value_delimiter = ',')]
    names: Vec<String>,

    /// Suffix appended to every relocated name.
    #[arg(short = 's', long, default_value = "")]
    suffix: String,

    /// Report what would change without writing.
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Ignore _test.go files.
    #[arg(long)]
    no_tests: bool,

    /// How rewritten files are checked before writing.
    #[arg(long, value_enum, default_value = "syntax")]
    verify: VerifyMode,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Workspace directory (default: current directory).
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Package patterns, as for `go list` (default: ".").
    patterns: Vec<String>,
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

/// Verification modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum VerifyMode {
    /// No verification.
    None,
    /// Re-parse rewritten files.
    Syntax,
}

impl From<VerifyMode> for VerificationMode {
    fn from(mode: VerifyMode) -> Self {
        match mode {
            VerifyMode::None => VerificationMode::None,
            VerifyMode::Syntax => VerificationMode::Syntax,
        }
    }
}

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// Full JSON response.
    Json,
    /// Unified diff only.
    Diff,
}

impl Cli {
    fn request(&self) -> RelocationRequest {
        let mut request = RelocationRequest::new(self.from.clone(), self.to.clone())
            .with_located(self.located.clone())
            .with_names(parse_names(&self.names))
            .with_suffix(self.suffix.clone())
            .dry_run(self.dry_run)
            .include_tests(!self.no_tests)
            .with_verify(self.verify.into());
        if let Some(alias) = &self.alias {
            request = request.with_alias(alias.clone());
        }
        request
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON; logs stay on stderr.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
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

fn execute(cli: &Cli) -> Result<(), MoveError> {
    let workspace = workspace_root(cli.workspace.as_deref())?;
    let response = run_relocate(&workspace, &cli.request(), &cli.patterns)?;

    let output = match cli.format {
        OutputFormat::Text => render_text(&response),
        OutputFormat::Json => render_json(&response)? + "\n",
        OutputFormat::Diff => render_diff(&response).to_string(),
    };
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| MoveError::internal(format!("failed to write output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn parse_defaults() {
            let cli = Cli::try_parse_from(["mov-pkg", "-f", "example.com/app/store", "-t", "example.com/app/models"]).unwrap();
            assert_eq!(cli.from, "example.com/app/store");
            assert_eq!(cli.to, "example.com/app/models");
            assert_eq!(cli.located, "/models.go");
            assert!(cli.names.is_empty());
            assert_eq!(cli.suffix, "");
            assert!(!cli.dry_run);
            assert!(!cli.no_tests);
            assert_eq!(cli.verify, VerifyMode::Syntax);
            assert_eq!(cli.format, OutputFormat::Text);
            assert!(cli.patterns.is_empty());

            let request = cli.request();
            assert_eq!(request, RelocationRequest::new("example.com/app/store", "example.com/app/models"));
        }

        #[test]
        fn parse_all_flags() {
            let cli = Cli::try_parse_from([
                "mov-pkg",
                "-f",
                "example.com/app/store",
                "-t",
                "example.com/app/models",
                "-a",
                "m",
                "-l",
                "/types.go",
                "-n",
                "Foo,Bar",
                "-n",
                "Baz",
                "-s",
                "DB",
                "-d",
                "--no-tests",
                "--verify",
                "none",
                "--format",
                "json",
                "--workspace",
                "/tmp/ws",
                "./...",
                "example.com/app/api",
            ])
            .unwrap();
            assert_eq!(cli.names, vec!["Foo", "Bar", "Baz"]);
            assert_eq!(cli.format, OutputFormat::Json);
            assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/ws")));
            assert_eq!(cli.patterns, vec!["./...", "example.com/app/api"]);

            let request = cli.request();
            assert_eq!(request.alias.as_deref(), Some("m"));
            assert_eq!(request.located, "/types.go");
            assert_eq!(request.suffix, "DB");
            assert!(request.dry_run);
            assert!(!request.include_tests);
            assert_eq!(request.verify, VerificationMode::None);
        }

        #[test]
        fn parse_diff_format() {
            let cli = Cli::try_parse_from(["mov-pkg", "--from", "a/b", "--to", "a/c", "--format", "diff"]).unwrap();
            assert_eq!(cli.format, OutputFormat::Diff);
        }

        #[test]
        fn from_and_to_are_required() {
            assert!(Cli::try_parse_from(["mov-pkg", "-t", "a/c"]).is_err());
            assert!(Cli::try_parse_from(["mov-pkg", "-f", "a/b"]).is_err());
        }

        #[test]
        fn unknown_verify_mode_is_rejected() {
            assert!(Cli::try_parse_from(["mov-pkg", "-f", "a/b", "-t", "a/c", "--verify", "tests"]).is_err());
        }
    }
}
