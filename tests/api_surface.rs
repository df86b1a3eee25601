//! Compile-only test to verify public API surface.
//!
//! This file is a compile-time contract for the public API. If it fails to
//! compile, the public API has regressed.
//!
//! Run with: cargo test -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Root Crate
// ============================================================================

use movpkg::cli::{parse_names, render_diff, render_json, render_text, run_relocate, workspace_root};
use movpkg::{
    relocate, ErrorInfo, ErrorResponse, FileReport, ImportStatus, MoveError, OutputErrorCode,
    RelocateResponse, RelocationRequest, VerificationMode, Warning, DEFAULT_LOCATED,
    SCHEMA_VERSION,
};

// ============================================================================
// Core Infrastructure Types
// ============================================================================

use movpkg_core::diff::{generate_unified_diff, FileChange};
use movpkg_core::patch::{
    Anchor, ApplyContext, ApplyResult, ContentHash, Edit, EditLabels, FileId, MaterializedPatch,
    OutputEdit, PatchSet, Precondition, Span,
};
use movpkg_core::output::{emit_response, warning_codes, Location, Summary, SymbolInfo, Verification};
use movpkg_core::text::{byte_offset_to_position, expand_to_lines};
use movpkg_core::util::generate_run_id;

// ============================================================================
// Go Pipeline Types
// ============================================================================

use movpkg_go::catalog::{CatalogError, CatalogSymbol, SymbolCatalog};
use movpkg_go::files::{FileError, GoModule, PackagePattern};
use movpkg_go::imports::{ImportReconciler, ImportReport, ReconcileError};
use movpkg_go::loader::{GoLoader, LoadError, Package, PackageId, PackageLoader, SourceFile};
use movpkg_go::registry::{FileEntry, FileRegistry};
use movpkg_go::resolve::{Entity, FileTable, IdentUse, ImportBinding, ResolutionTable, SelectorUse, UseRole};
use movpkg_go::rewrite::{Reference, RewriteError, RewriteVisitor};
use movpkg_go::verification::{verify_files, SyntaxVerifier, VerificationError};
use movpkg_go::writer::{FsWriter, MemoryWriter, WriteError, Writer};
use movpkg_go::ops::relocate::{RelocateError, RelocateResult};

#[test]
fn api_surface_compiles() {
    // Trait objects the relocate operation is written against.
    fn _takes_loader(_: &dyn PackageLoader) {}
    fn _takes_writer(_: &mut dyn Writer) {}

    let _ = RelocationRequest::new("example.com/app/store", "example.com/app/models");
    let _ = MemoryWriter::new();
    let _ = FsWriter::new();
}
