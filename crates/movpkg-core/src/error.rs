//! Error types and error code constants for movpkg.
//!
//! `MoveError` is the single error type rendered by the CLI. Subsystem errors
//! (loading, cataloging, rewriting, writing) bridge into it via `From` impls
//! that live next to the subsystem types.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad request or configuration)
//! - `3`: Load and resolution errors (module, parse, catalog conflicts)
//! - `4`: Apply errors (alias conflicts, patch conflicts, write failures)
//! - `5`: Verification failed (rewritten output does not parse)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Load errors (no module, syntax errors, conflicting declarations).
    ResolutionError = 3,
    /// Apply errors (alias conflicts, stale files, failed writes).
    ApplyError = 4,
    /// Rewritten output failed verification.
    VerificationFailed = 5,
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
#[derive(Debug, Error)]
pub enum MoveError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Packages could not be loaded or resolved.
    #[error("load failed: {message}")]
    LoadFailed {
        message: String,
        file: Option<String>,
    },

    /// The same type name is declared by two files matching the filter.
    #[error("type {name} is declared in both {first} and {second}")]
    CatalogConflict {
        name: String,
        first: String,
        second: String,
    },

    /// The target alias cannot be bound in a file.
    #[error("alias conflict in {file}: {message}")]
    AliasConflict {
        alias: String,
        file: String,
        message: String,
    },

    /// Failed to apply or persist changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Rewritten output failed verification.
    #[error("verification failed ({mode}): {file}")]
    VerificationFailed {
        mode: String,
        file: String,
        output: String,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&MoveError> for OutputErrorCode {
    fn from(err: &MoveError) -> Self {
        match err {
            MoveError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            MoveError::LoadFailed { .. } => OutputErrorCode::ResolutionError,
            MoveError::CatalogConflict { .. } => OutputErrorCode::ResolutionError,
            MoveError::AliasConflict { .. } => OutputErrorCode::ApplyError,
            MoveError::ApplyError { .. } => OutputErrorCode::ApplyError,
            MoveError::VerificationFailed { .. } => OutputErrorCode::VerificationFailed,
            MoveError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<MoveError> for OutputErrorCode {
    fn from(err: MoveError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl MoveError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        MoveError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create a load error, optionally pinned to a file.
    pub fn load_failed(message: impl Into<String>, file: Option<String>) -> Self {
        MoveError::LoadFailed {
            message: message.into(),
            file,
        }
    }

    /// Create an apply error.
    pub fn apply(message: impl Into<String>, file: Option<String>) -> Self {
        MoveError::ApplyError {
            message: message.into(),
            file,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        MoveError::InternalError {
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
