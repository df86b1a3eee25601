//! movpkg - relocate references to Go types across packages.
//!
//! This crate provides the `mov-pkg` binary. The work happens in the
//! workspace crates:
//!
//! - `movpkg-core` - patch IR, errors, output schema, diffs
//! - `movpkg-go` - package loading, resolution, rewriting and writing
//!
//! ## Modules
//!
//! - `cli` - running a relocation from the command line and rendering results

pub mod cli;

// Re-export core types for convenience
pub use movpkg_core::error::{MoveError, OutputErrorCode};
pub use movpkg_core::output::{
    ErrorInfo, ErrorResponse, FileReport, ImportStatus, RelocateResponse, Warning, SCHEMA_VERSION,
};
pub use movpkg_go::ops::relocate::{relocate, RelocationRequest, DEFAULT_LOCATED};
pub use movpkg_go::verification::VerificationMode;
