//! End-to-end relocation tests against Go modules on disk.
//!
//! Each test builds a module in a temp dir and runs the same entry point the
//! CLI uses, with the real loader and filesystem writer.

mod support;

use movpkg::cli::run_relocate;
use movpkg::{ImportStatus, MoveError, OutputErrorCode, RelocationRequest};

use support::workspace::{scenario, GoWorkspace, API_GO_DB, MODELS, STORE, USE_GO_DB};

fn all() -> Vec<String> {
    vec!["./...".to_string()]
}

fn snapshot(ws: &GoWorkspace, files: &[&str]) -> Vec<String> {
    files.iter().map(|f| ws.read(f)).collect()
}

const ALL_FILES: &[&str] = &[
    "store/models.go",
    "store/bar.go",
    "store/use.go",
    "api/api.go",
    "report/report.go",
];

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn relocates_with_suffix_and_fixes_imports() {
    let ws = scenario();
    let report_before = ws.read("report/report.go");
    let request = RelocationRequest::new(STORE, MODELS).with_suffix("DB");

    let resp = run_relocate(ws.path(), &request, &all()).unwrap();

    assert_eq!(ws.read("store/use.go"), USE_GO_DB);
    assert_eq!(ws.read("api/api.go"), API_GO_DB);
    assert_eq!(ws.read("report/report.go"), report_before);
    assert_eq!(resp.replacement_count(), 4);
    assert_eq!(resp.verification.status, "passed");
    assert_eq!(resp.verification.files_checked, 2);

    let mut written = resp.files_written.unwrap();
    written.sort();
    assert_eq!(written, vec!["api/api.go", "store/use.go"]);
}

#[test]
fn dry_run_matches_real_run_without_writing() {
    let ws = scenario();
    let before = snapshot(&ws, ALL_FILES);
    let request = RelocationRequest::new(STORE, MODELS).with_suffix("DB");

    let dry = run_relocate(ws.path(), &request.clone().dry_run(true), &all()).unwrap();
    assert_eq!(snapshot(&ws, ALL_FILES), before);
    assert!(dry.files_written.is_none());

    let real = run_relocate(ws.path(), &request, &all()).unwrap();
    assert_eq!(dry.replacement_count(), real.replacement_count());
    assert_eq!(dry.summary, real.summary);
    assert_eq!(dry.patch.unified_diff, real.patch.unified_diff);
    assert_eq!(dry.warnings.len(), real.warnings.len());
}

#[test]
fn second_run_finds_nothing() {
    let ws = scenario();
    let request = RelocationRequest::new(STORE, MODELS).with_suffix("DB");
    run_relocate(ws.path(), &request, &all()).unwrap();
    let after_first = snapshot(&ws, ALL_FILES);

    let second = run_relocate(ws.path(), &request, &all()).unwrap();
    assert_eq!(second.replacement_count(), 0);
    assert!(second.files.is_empty());
    assert_eq!(snapshot(&ws, ALL_FILES), after_first);
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn shadowed_names_are_untouched() {
    let ws = scenario();
    let shadow = "package store\n\nfunc count() int {\n\tFoo := 3\n\treturn Foo\n}\n";
    ws.write("store/shadow.go", shadow);

    let resp = run_relocate(ws.path(), &RelocationRequest::new(STORE, MODELS), &all()).unwrap();
    assert_eq!(ws.read("store/shadow.go"), shadow);
    assert!(resp.files.iter().all(|f| f.file != "store/shadow.go"));
}

#[test]
fn test_variants_share_one_entry_per_file() {
    let ws = scenario();
    ws.write(
        "store/use_test.go",
        "package store\n\nimport \"testing\"\n\nfunc TestFoo(t *testing.T) {\n\t_ = Foo{}\n}\n",
    );
    ws.write(
        "store/ext_test.go",
        "package store_test\n\nimport (\n\t\"testing\"\n\n\t\"example.com/app/store\"\n)\n\nfunc TestExt(t *testing.T) {\n\t_ = store.Foo{}\n}\n",
    );

    let resp = run_relocate(ws.path(), &RelocationRequest::new(STORE, MODELS).dry_run(true), &all()).unwrap();

    let use_go: Vec<_> = resp.files.iter().filter(|f| f.file == "store/use.go").collect();
    assert_eq!(use_go.len(), 1);
    assert_eq!(use_go[0].replacements, 2);
    assert_eq!(use_go[0].package, STORE);

    let in_pkg = resp.files.iter().find(|f| f.file == "store/use_test.go").unwrap();
    assert_eq!(in_pkg.replacements, 1);
    assert_eq!(in_pkg.import, ImportStatus::Added);

    let external = resp.files.iter().find(|f| f.file == "store/ext_test.go").unwrap();
    assert_eq!(external.replacements, 1);
    assert_eq!(external.import, ImportStatus::Replaced);
    assert!(external.pruned_source_import);
}

#[test]
fn no_tests_leaves_test_files_alone() {
    let ws = scenario();
    let test_src = "package store\n\nvar _ = Foo{}\n";
    ws.write("store/use_test.go", test_src);

    let request = RelocationRequest::new(STORE, MODELS).include_tests(false);
    let resp = run_relocate(ws.path(), &request, &all()).unwrap();
    assert_eq!(ws.read("store/use_test.go"), test_src);
    assert!(resp.files.iter().all(|f| f.file != "store/use_test.go"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn alias_collision_aborts_without_writing() {
    let ws = scenario();
    ws.write("other/models/models.go", "package models\n\ntype X struct{}\n");
    ws.write(
        "api/h.go",
        "package api\n\nimport (\n\t\"example.com/app/other/models\"\n\tpkgshort \"example.com/app/store\"\n)\n\nvar _ models.X\nvar _ pkgshort.Foo\n",
    );
    let before = snapshot(&ws, ALL_FILES);

    let err = run_relocate(ws.path(), &RelocationRequest::new(STORE, MODELS), &all()).unwrap_err();
    assert!(matches!(err, MoveError::AliasConflict { ref file, .. } if file == "api/h.go"));
    assert_eq!(err.error_code(), OutputErrorCode::ApplyError);
    assert_eq!(snapshot(&ws, ALL_FILES), before);
}

#[test]
fn shadowed_alias_aborts() {
    let ws = scenario();
    ws.write(
        "store/local.go",
        "package store\n\nfunc build() {\n\tmodels := 1\n\t_ = models\n\tvar f Foo\n\t_ = f\n}\n",
    );
    let err = run_relocate(ws.path(), &RelocationRequest::new(STORE, MODELS), &all()).unwrap_err();
    assert!(matches!(err, MoveError::AliasConflict { ref alias, .. } if alias == "models"));
    assert_eq!(ws.read("store/use.go"), "package store\n\nfunc NewFoo() *Foo {\n\treturn &Foo{}\n}\n");
}

#[test]
fn missing_module_is_a_load_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = run_relocate(dir.path(), &RelocationRequest::new(STORE, MODELS), &all()).unwrap_err();
    assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
}

#[test]
fn same_source_and_target_is_rejected() {
    let ws = scenario();
    let err = run_relocate(ws.path(), &RelocationRequest::new(STORE, STORE), &all()).unwrap_err();
    assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
}
