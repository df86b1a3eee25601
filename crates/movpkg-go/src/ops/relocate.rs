//! The relocate operation.
//!
//! Given a source and a target package, rewrites every reference to the
//! source package's cataloged types so it points at the target package:
//!
//! 1. Validate the request
//! 2. Load and resolve the packages matching the patterns
//! 3. Build the symbol catalog
//! 4. Register every loaded file
//! 5. Rewrite references, file by file
//! 6. Reconcile the imports of changed files
//! 7. Serialize and verify the changed files
//! 8. Persist them (unless this is a dry run)
//!
//! Every fatal condition except I/O is detected before step 8, so a run that
//! fails writes nothing.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use movpkg_core::diff::{generate_unified_diff, FileChange};
use movpkg_core::output::{
    warning_codes, FileReport, ImportStatus, Location, RelocateResponse, Summary, SymbolInfo,
    Warning, SCHEMA_VERSION,
};
use movpkg_core::patch::PatchSet;
use movpkg_core::text::byte_offset_to_position;
use movpkg_core::util::generate_run_id;

use crate::catalog::{CatalogError, CatalogSymbol, SymbolCatalog};
use crate::imports::{ImportReconciler, ImportReport, ReconcileError};
use crate::loader::{LoadError, PackageLoader};
use crate::registry::{FileEntry, FileRegistry};
use crate::resolve::{assumed_package_name, is_go_identifier};
use crate::rewrite::{RewriteError, RewriteVisitor};
use crate::verification::{verify_files, VerificationError, VerificationMode};
use crate::writer::{WriteError, Writer};

/// Declaration filter used when none is given.
pub const DEFAULT_LOCATED: &str = "/models.go";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during a relocation.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// The request itself is unusable.
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Result type for relocations.
pub type RelocateResult<T> = Result<T, RelocateError>;

// ============================================================================
// Request
// ============================================================================

/// Configuration of one relocation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationRequest {
    /// Import path of the package the types are declared in.
    pub source: String,
    /// Import path of the package references should point at.
    pub target: String,
    /// Qualifier for the target package. Defaults to the package's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Substring a declaring file's path must contain.
    #[serde(default = "default_located")]
    pub located: String,
    /// Restrict the relocation to these names. Empty means all.
    #[serde(default)]
    pub names: Vec<String>,
    /// Appended to every relocated name.
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_include_tests")]
    pub include_tests: bool,
    #[serde(default)]
    pub verify: VerificationMode,
}

fn default_located() -> String {
    DEFAULT_LOCATED.to_string()
}

fn default_include_tests() -> bool {
    true
}

impl RelocationRequest {
    /// Request relocating from `source` to `target` with default options.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        RelocationRequest {
            source: source.into(),
            target: target.into(),
            alias: None,
            located: default_located(),
            names: Vec::new(),
            suffix: String::new(),
            dry_run: false,
            include_tests: true,
            verify: VerificationMode::default(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_located(mut self, located: impl Into<String>) -> Self {
        self.located = located.into();
        self
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }

    pub fn with_verify(mut self, mode: VerificationMode) -> Self {
        self.verify = mode;
        self
    }

    /// Name `name` takes in the target package.
    pub fn new_name(&self, name: &str) -> String {
        format!("{name}{}", self.suffix)
    }

    /// Check the request before anything is loaded.
    pub fn validate(&self) -> RelocateResult<()> {
        let invalid = |msg: String| Err(RelocateError::InvalidRequest(msg));

        if self.source.trim().is_empty() {
            return invalid("source package is required".to_string());
        }
        if self.target.trim().is_empty() {
            return invalid("target package is required".to_string());
        }
        if self.source == self.target {
            return invalid(format!("source and target are the same package: {}", self.source));
        }
        if let Some(alias) = &self.alias {
            if !is_go_identifier(alias) || alias == "_" {
                return invalid(format!("alias '{alias}' is not a valid Go identifier"));
            }
        }
        if !self.suffix.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return invalid(format!("suffix '{}' contains characters not allowed in identifiers", self.suffix));
        }
        if self.located.is_empty() {
            return invalid("declaration filter must not be empty".to_string());
        }
        if let Some(bad) = self.names.iter().find(|n| !is_go_identifier(n)) {
            return invalid(format!("'{bad}' is not a valid type name"));
        }
        Ok(())
    }
}

// ============================================================================
// Operation
// ============================================================================

/// Relocate references per `request` across the packages matching `patterns`.
///
/// On success the response lists the relocated symbols, every changed file
/// and the patch. Files are persisted through `writer` unless the request is
/// a dry run.
pub fn relocate(
    request: &RelocationRequest,
    loader: &dyn PackageLoader,
    patterns: &[String],
    writer: &mut dyn Writer,
) -> RelocateResult<RelocateResponse> {
    request.validate()?;

    let packages = loader.load(patterns)?;
    info!(
        packages = packages.len(),
        include_tests = request.include_tests,
        "loaded packages"
    );

    let target_name = packages
        .iter()
        .find(|p| p.id.path == request.target)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| assumed_package_name(&request.target));
    let alias = request.alias.clone().unwrap_or_else(|| target_name.clone());

    // Catalog
    let allow = (!request.names.is_empty()).then_some(request.names.as_slice());
    let catalog = SymbolCatalog::discover(
        packages.iter().map(|p| &p.info),
        &request.source,
        &request.located,
        allow,
    )?;

    let mut warnings = Vec::new();
    for name in catalog.missing_requested() {
        warn!(name = %name, located = %request.located, "requested name not found");
        warnings.push(
            Warning::new(
                warning_codes::NAME_NOT_FOUND,
                format!("type {name} is not declared in a file matching '{}'", request.located),
            )
            .suggest("check --names and --located"),
        );
    }
    if catalog.is_empty() {
        warn!(source = %request.source, "no symbols to relocate");
        warnings.push(Warning::new(
            warning_codes::NO_SYMBOLS,
            format!(
                "no type declarations of {} found in files matching '{}'",
                request.source, request.located
            ),
        ));
    }
    for symbol in catalog.iter() {
        info!(name = %symbol.name, file = %symbol.file.display(), "relocating symbol");
    }
    for symbol in catalog.skipped() {
        debug!(name = %symbol.name, file = %symbol.file.display(), "skipping symbol outside declaration filter");
    }

    let mut registry = FileRegistry::new(request.target.clone());
    registry.populate(&packages);
    debug!(files = registry.len(), "registered files");

    // Rewrite: each file once, with the facts of the package it was registered under.
    let visitor = RewriteVisitor {
        catalog: &catalog,
        target: &request.target,
        default_alias: &alias,
        suffix: &request.suffix,
    };
    for package in &packages {
        for file in &package.files {
            let Some(entry) = registry.get_mut(&file.path) else {
                continue;
            };
            if entry.package != package.id {
                continue;
            }
            warnings.extend(visitor.visit(entry, &package.info)?);
        }
    }

    // Imports
    let reconciler = ImportReconciler {
        target: &request.target,
        source: &request.source,
        default_alias: &alias,
        target_name: &target_name,
    };
    let mut reports: BTreeMap<PathBuf, ImportReport> = BTreeMap::new();
    for package in &packages {
        for file in &package.files {
            let Some(entry) = registry.get_mut(&file.path) else {
                continue;
            };
            if entry.package != package.id || !entry.is_changed() {
                continue;
            }
            let Some(table) = package.info.file(&file.path) else {
                continue;
            };
            let report = reconciler.reconcile(entry, table)?;
            info!(
                file = entry.rel_path(),
                replacements = entry.count,
                import = ?report.action,
                "rewrote file"
            );
            reports.insert(file.path.clone(), report);
        }
    }

    // Serialize and verify
    let mut rendered: Vec<(&FileEntry, Vec<u8>)> = Vec::new();
    for entry in registry.changed() {
        let bytes = writer.serialize(entry)?;
        rendered.push((entry, bytes));
    }
    let verification = verify_files(
        request.verify,
        rendered.iter().map(|(entry, bytes)| (entry.rel_path(), bytes.as_slice())),
    )?;

    let mut patch_set = PatchSet::new();
    let mut contents = HashMap::new();
    for (entry, _) in &rendered {
        patch_set = patch_set
            .with_edits(entry.edits.iter().cloned())
            .with_file_path(entry.file_id, entry.rel_path());
        contents.insert(entry.file_id, entry.text().as_bytes().to_vec());
    }
    let mut patch = patch_set.materialize(&contents);
    let changes: Vec<FileChange<'_>> = rendered
        .iter()
        .map(|(entry, _)| FileChange {
            path: entry.rel_path(),
            original: entry.text(),
            edits: entry.edits.iter().map(|e| (e.span(), e.text.as_str())).collect(),
        })
        .collect();
    patch.unified_diff = generate_unified_diff(&changes);

    // Persist
    let files_written = if request.dry_run {
        info!(files = rendered.len(), "dry run, nothing written");
        None
    } else {
        for (entry, _) in &rendered {
            writer.check_unchanged(entry)?;
        }
        let mut written = Vec::with_capacity(rendered.len());
        for (entry, bytes) in &rendered {
            writer.persist(&entry.path, bytes)?;
            info!(file = entry.rel_path(), "wrote file");
            written.push(entry.rel_path().to_string());
        }
        Some(written)
    };

    let files = rendered
        .iter()
        .map(|(entry, _)| {
            let report = reports.get(&entry.path);
            FileReport {
                file: entry.rel_path().to_string(),
                package: entry.package.to_string(),
                replacements: entry.count,
                alias: report.map(|r| r.alias.clone()).unwrap_or_default(),
                import: report.map_or(ImportStatus::Present, |r| r.action),
                pruned_source_import: report.is_some_and(|r| r.pruned_source),
            }
        })
        .collect();

    let symbols = catalog
        .iter()
        .map(|s| {
            let info = symbol_info(&registry, &request.source, s);
            if request.suffix.is_empty() {
                info
            } else {
                info.renamed_to(request.new_name(&s.name))
            }
        })
        .collect();
    let skipped = catalog
        .skipped()
        .iter()
        .map(|s| symbol_info(&registry, &request.source, s))
        .collect();

    Ok(RelocateResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        run_id: generate_run_id(),
        dry_run: request.dry_run,
        source: request.source.clone(),
        target: request.target.clone(),
        alias,
        symbols,
        skipped,
        files,
        summary: Summary::from_patch(&patch),
        patch,
        verification,
        warnings,
        files_written,
    })
}

fn symbol_info(registry: &FileRegistry, package: &str, symbol: &CatalogSymbol) -> SymbolInfo {
    let location = match registry.get(&symbol.file) {
        Some(entry) => {
            let (line, col) = byte_offset_to_position(entry.text().as_bytes(), symbol.span.start as usize);
            Location::with_span(entry.rel_path(), line, col, symbol.span.start, symbol.span.end)
        }
        None => Location::new(symbol.file.display().to_string(), 1, 1),
    };
    SymbolInfo::new(&symbol.name, package, location)
}

// ============================================================================
// Tests
// ============================================================================
