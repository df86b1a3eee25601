//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as first field
//! 2. **Deterministic:** Same input -> same output (field order, array ordering)
//! 3. **Nullable vs absent:** absent field means "not applicable"
//! 4. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{MoveError, OutputErrorCode};

pub use crate::patch::{MaterializedPatch as Patch, OutputEdit as Edit, Span};
pub use crate::types::{Location, SymbolInfo};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Warnings
// ============================================================================

/// Stable warning codes.
pub mod warning_codes {
    /// A method receiver names a relocated type and was left untouched.
    pub const RECEIVER_NOT_RELOCATED: &str = "RECEIVER_NOT_RELOCATED";
    /// An embedded field's promoted name changes because of the suffix.
    pub const EMBEDDED_FIELD_RENAMED: &str = "EMBEDDED_FIELD_RENAMED";
    /// A name passed with `--names` was not found at the declaration filter.
    pub const NAME_NOT_FOUND: &str = "NAME_NOT_FOUND";
    /// The catalog is empty; nothing will be rewritten.
    pub const NO_SYMBOLS: &str = "NO_SYMBOLS";
}

/// A non-fatal diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Where the warning applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Suggested action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Warning {
    /// Create a simple warning without location.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    /// Create a warning with location.
    pub fn with_location(
        code: impl Into<String>,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            location: Some(location),
            suggestion: None,
        }
    }

    /// Attach a suggested action.
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

// ============================================================================
// Summary and Verification
// ============================================================================

/// Edit statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    /// Files modified.
    pub files_changed: u32,
    /// Total edits.
    pub edits_count: u32,
    /// Net bytes added.
    pub bytes_added: i64,
    /// Net bytes removed.
    pub bytes_removed: i64,
}

impl Summary {
    /// Create from a patch.
    pub fn from_patch(patch: &Patch) -> Self {
        let mut files = std::collections::HashSet::new();
        let mut bytes_added: i64 = 0;
        let mut bytes_removed: i64 = 0;

        for edit in &patch.edits {
            files.insert(&edit.file);
            bytes_added += edit.new_text.len() as i64;
            bytes_removed += edit.old_text.len() as i64;
        }

        Summary {
            files_changed: files.len() as u32,
            edits_count: patch.edits.len() as u32,
            bytes_added: bytes_added - bytes_removed.min(bytes_added),
            bytes_removed: bytes_removed - bytes_added.min(bytes_removed),
        }
    }
}

/// Verification result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    /// "passed", "failed" or "skipped".
    pub status: String,
    /// "none" or "syntax".
    pub mode: String,
    /// Number of files checked.
    pub files_checked: u32,
}

impl Verification {
    /// Create a passed verification result.
    pub fn passed(mode: &str, files_checked: u32) -> Self {
        Verification {
            status: "passed".to_string(),
            mode: mode.to_string(),
            files_checked,
        }
    }

    /// Create a skipped verification result.
    pub fn skipped() -> Self {
        Verification {
            status: "skipped".to_string(),
            mode: "none".to_string(),
            files_checked: 0,
        }
    }
}

// ============================================================================
// Per-file Report
// ============================================================================

/// What happened to a changed file's imports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// The file already imported the target package.
    Present,
    /// The file belongs to the target package.
    SamePackage,
    /// A new import of the target package was inserted.
    Added,
    /// The now-unused source import was rewritten to import the target.
    Replaced,
}

/// A file with at least one rewritten reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Workspace-relative path.
    pub file: String,
    /// Package the file was first registered under.
    pub package: String,
    /// Number of references rewritten.
    pub replacements: u32,
    /// Qualifier used for the target package (empty inside the target package).
    pub alias: String,
    /// Import reconciliation outcome.
    pub import: ImportStatus,
    /// Whether an unused import of the source package was removed.
    pub pruned_source_import: bool,
}

// ============================================================================
// Error Types
// ============================================================================

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a MoveError.
    pub fn from_error(err: &MoveError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let details = match err {
            MoveError::InvalidArguments { details, .. } => details.clone(),
            MoveError::LoadFailed { file, .. } | MoveError::ApplyError { file, .. } => {
                file.as_ref().map(|f| serde_json::json!({ "file": f }))
            }
            MoveError::CatalogConflict {
                name,
                first,
                second,
            } => Some(serde_json::json!({
                "name": name,
                "files": [first, second],
            })),
            MoveError::AliasConflict { alias, file, .. } => Some(serde_json::json!({
                "alias": alias,
                "file": file,
            })),
            MoveError::VerificationFailed { mode, file, output } => Some(serde_json::json!({
                "mode": mode,
                "file": file,
                "output": output,
            })),
            MoveError::InternalError { .. } => None,
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

/// Response emitted when a run fails.
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
    /// Create an error response from a MoveError.
    pub fn from_error(err: &MoveError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Relocate Response
// ============================================================================

/// Response for a relocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocateResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Identifier of this run.
    pub run_id: String,
    /// Whether the run only reported intent.
    pub dry_run: bool,
    /// Source package import path.
    pub source: String,
    /// Target package import path.
    pub target: String,
    /// Default qualifier for the target package.
    pub alias: String,
    /// Symbols relocated.
    #[serde(serialize_with = "serialize_sorted_symbols")]
    pub symbols: Vec<SymbolInfo>,
    /// Source-package types outside the declaration filter.
    #[serde(serialize_with = "serialize_sorted_symbols")]
    pub skipped: Vec<SymbolInfo>,
    /// Files with rewritten references.
    #[serde(serialize_with = "serialize_sorted_files")]
    pub files: Vec<FileReport>,
    /// The generated patch.
    #[serde(serialize_with = "serialize_sorted_patch")]
    pub patch: Patch,
    /// Edit statistics.
    pub summary: Summary,
    /// Verification results.
    pub verification: Verification,
    /// Warnings (may be empty).
    #[serde(serialize_with = "serialize_sorted_warnings")]
    pub warnings: Vec<Warning>,
    /// Files that were written (absent on dry runs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_written: Option<Vec<String>>,
}

impl RelocateResponse {
    /// Total number of references rewritten across all files.
    pub fn replacement_count(&self) -> u32 {
        self.files.iter().map(|f| f.replacements).sum()
    }
}

// ============================================================================
// Sorted Serialization Helpers
// ============================================================================

fn serialize_sorted_symbols<S>(symbols: &[SymbolInfo], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut sorted: Vec<_> = symbols.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.location.cmp(&b.location)));
    sorted.serialize(serializer)
}

fn serialize_sorted_files<S>(files: &[FileReport], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut sorted: Vec<_> = files.iter().collect();
    sorted.sort_by(|a, b| a.file.cmp(&b.file));
    sorted.serialize(serializer)
}

/// Serialize warnings sorted by location (if present).
fn serialize_sorted_warnings<S>(warnings: &[Warning], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut sorted: Vec<_> = warnings.iter().collect();
    sorted.sort_by(|a, b| match (&a.location, &b.location) {
        (Some(loc_a), Some(loc_b)) => loc_a.cmp(loc_b).then_with(|| a.code.cmp(&b.code)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.code.cmp(&b.code).then_with(|| a.message.cmp(&b.message)),
    });
    sorted.serialize(serializer)
}

/// Serialize patch with edits sorted by (file, span.start).
fn serialize_sorted_patch<S>(patch: &Patch, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut edits = patch.edits.clone();
    edits.sort_by(|a, b| a.file.cmp(&b.file).then_with(|| a.span.start.cmp(&b.span.start)));

    Patch {
        edits,
        unified_diff: patch.unified_diff.clone(),
    }
    .serialize(serializer)
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
