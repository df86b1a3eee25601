//! CLI front door.
//!
//! Runs a relocation against a workspace on disk and renders the response
//! in one of the output formats:
//!
//! - text: a human summary
//! - json: the full [`RelocateResponse`]
//! - diff: the unified diff only
//!
//! All functions return `Result<T, MoveError>` so `main` can map failures to
//! an error response and exit code.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::info;

use movpkg_core::error::MoveError;
use movpkg_core::output::{ImportStatus, RelocateResponse, SymbolInfo};
use movpkg_go::loader::GoLoader;
use movpkg_go::ops::relocate::{relocate, RelocationRequest};
use movpkg_go::writer::FsWriter;

// ============================================================================
// Running
// ============================================================================

/// Run `request` over the packages matching `patterns` in `workspace`,
/// writing changed files in place unless it is a dry run.
pub fn run_relocate(
    workspace: &Path,
    request: &RelocationRequest,
    patterns: &[String],
) -> Result<RelocateResponse, MoveError> {
    info!(
        workspace = %workspace.display(),
        source = %request.source,
        target = %request.target,
        dry_run = request.dry_run,
        "starting relocation"
    );
    let loader = GoLoader::new(workspace).include_tests(request.include_tests);
    let mut writer = FsWriter::new();
    let response = relocate(request, &loader, patterns, &mut writer)?;
    Ok(response)
}

/// Workspace directory: the explicit one, else the current directory.
pub fn workspace_root(explicit: Option<&Path>) -> Result<PathBuf, MoveError> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| MoveError::internal(format!("cannot determine current directory: {e}"))),
    }
}

/// Flatten `-n` values: split on commas, trim, drop empties and duplicates.
pub fn parse_names(values: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in values.iter().flat_map(|v| v.split(',')).map(str::trim) {
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

// ============================================================================
// Rendering
// ============================================================================

/// The full response as pretty JSON.
pub fn render_json(response: &RelocateResponse) -> Result<String, MoveError> {
    serde_json::to_string_pretty(response)
        .map_err(|e| MoveError::internal(format!("JSON serialization error: {e}")))
}

/// Human-readable summary.
pub fn render_text(response: &RelocateResponse) -> String {
    let mut out = String::new();
    let count = response.symbols.len();
    if response.dry_run {
        let _ = writeln!(
            out,
            "Dry run: would relocate {count} symbol(s) from {} to {} (alias: {})",
            response.source, response.target, response.alias
        );
    } else {
        let _ = writeln!(
            out,
            "Relocated {count} symbol(s) from {} to {} (alias: {})",
            response.source, response.target, response.alias
        );
    }

    for symbol in sorted_symbols(&response.symbols) {
        let new_name = symbol.new_name.as_deref().unwrap_or(&symbol.name);
        let _ = writeln!(
            out,
            "  {} -> {}.{} ({})",
            symbol.name, response.alias, new_name, symbol.location
        );
    }
    for symbol in sorted_symbols(&response.skipped) {
        let _ = writeln!(out, "  skipped: {} ({})", symbol.name, symbol.location);
    }

    let mut files: Vec<_> = response.files.iter().collect();
    files.sort_by(|a, b| a.file.cmp(&b.file));
    for file in &files {
        let mut line = format!(
            "  {}: {} replacement(s), {}",
            file.file,
            file.replacements,
            import_label(file.import)
        );
        if file.pruned_source_import {
            line.push_str(", source import removed");
        }
        let _ = writeln!(out, "{line}");
    }

    let verb = if response.dry_run { "would be modified" } else { "modified" };
    let _ = writeln!(
        out,
        "  {} file(s) {verb}, {} edit(s)",
        files.len(),
        response.summary.edits_count
    );
    if response.verification.status != "skipped" {
        let _ = writeln!(
            out,
            "  Verification ({}): {}",
            response.verification.mode, response.verification.status
        );
    }

    if !response.warnings.is_empty() {
        let _ = writeln!(out, "  Warnings:");
        for warning in &response.warnings {
            match &warning.location {
                Some(loc) => {
                    let _ = writeln!(out, "    - [{}] {loc}: {}", warning.code, warning.message);
                }
                None => {
                    let _ = writeln!(out, "    - [{}] {}", warning.code, warning.message);
                }
            }
        }
    }
    out
}

/// The unified diff alone.
pub fn render_diff(response: &RelocateResponse) -> &str {
    &response.patch.unified_diff
}

fn sorted_symbols(symbols: &[SymbolInfo]) -> Vec<&SymbolInfo> {
    let mut sorted: Vec<_> = symbols.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.location.cmp(&b.location)));
    sorted
}

fn import_label(status: ImportStatus) -> &'static str {
    match status {
        ImportStatus::Present => "import present",
        ImportStatus::SamePackage => "target package",
        ImportStatus::Added => "import added",
        ImportStatus::Replaced => "import replaced",
    }
}
