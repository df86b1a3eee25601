//! Conversions from Go-side subsystem errors into the unified `MoveError`.
//!
//! `MoveError` lives in movpkg-core, which knows nothing about loading or
//! rewriting Go, so the bridges live here next to the subsystem types.

use movpkg_core::error::MoveError;

use crate::catalog::CatalogError;
use crate::files::FileError;
use crate::imports::ReconcileError;
use crate::loader::LoadError;
use crate::ops::relocate::RelocateError;
use crate::rewrite::RewriteError;
use crate::verification::VerificationError;
use crate::writer::WriteError;

// ============================================================================
// Loading
// ============================================================================

impl From<FileError> for MoveError {
    fn from(err: FileError) -> Self {
        MoveError::load_failed(err.to_string(), None)
    }
}

impl From<LoadError> for MoveError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::File(file_err) => MoveError::from(file_err),
            LoadError::Parser(message) => MoveError::internal(format!("Go parser: {message}")),
            other => {
                let file = other.file().map(str::to_string);
                MoveError::load_failed(other.to_string(), file)
            }
        }
    }
}

impl From<CatalogError> for MoveError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Conflict {
                name,
                first,
                second,
            } => MoveError::CatalogConflict {
                name,
                first,
                second,
            },
        }
    }
}

// ============================================================================
// Rewriting
// ============================================================================

impl From<RewriteError> for MoveError {
    fn from(err: RewriteError) -> Self {
        MoveError::AliasConflict {
            alias: err.alias().to_string(),
            file: err.file().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ReconcileError> for MoveError {
    fn from(err: ReconcileError) -> Self {
        let message = err.to_string();
        match err {
            ReconcileError::AliasConflict { file, alias, .. } => MoveError::AliasConflict {
                alias,
                file,
                message,
            },
        }
    }
}

// ============================================================================
// Verification and Writing
// ============================================================================

impl From<VerificationError> for MoveError {
    fn from(err: VerificationError) -> Self {
        let message = err.to_string();
        match err {
            VerificationError::Syntax { file, .. } => MoveError::VerificationFailed {
                mode: "syntax".to_string(),
                file,
                output: message,
            },
            VerificationError::Parser(_) => MoveError::internal(message),
        }
    }
}

impl From<WriteError> for MoveError {
    fn from(err: WriteError) -> Self {
        let file = err.file().to_string();
        MoveError::apply(err.to_string(), Some(file))
    }
}

// ============================================================================
// Operation
// ============================================================================

impl From<RelocateError> for MoveError {
    fn from(err: RelocateError) -> Self {
        match err {
            RelocateError::InvalidRequest(message) => MoveError::invalid_args(message),
            RelocateError::Load(e) => e.into(),
            RelocateError::Catalog(e) => e.into(),
            RelocateError::Rewrite(e) => e.into(),
            RelocateError::Reconcile(e) => e.into(),
            RelocateError::Verification(e) => e.into(),
            RelocateError::Write(e) => e.into(),
        }
    }
}
