//! Test helpers: throwaway Go modules on disk and in-memory parses.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::loader::{GoLoader, Package, PackageLoader};

/// Source package of the shared fixtures.
pub const STORE: &str = "example.com/app/store";
/// Target package of the shared fixtures.
pub const TARGET: &str = "example.com/app/models";

/// A temporary Go module. The directory is removed on drop.
pub struct GoWorkspace {
    dir: TempDir,
}

impl GoWorkspace {
    /// Create a module root with a `go.mod` declaring `module_path`.
    pub fn new(module_path: &str) -> Self {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let ws = GoWorkspace { dir };
        ws.write("go.mod", &format!("module {module_path}\n\ngo 1.22\n"));
        ws
    }

    /// Module root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a workspace-relative file.
    pub fn file(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.file(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content).unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    }

    /// Read a file back.
    pub fn read(&self, rel: &str) -> String {
        let path = self.file(rel);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
    }
}

/// Parse Go source with the tree-sitter-go grammar.
pub fn parse_go(src: &str) -> tree_sitter::Tree {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .unwrap_or_else(|e| panic!("failed to load Go grammar: {e}"));
    parser
        .parse(src, None)
        .unwrap_or_else(|| panic!("parser returned no tree"))
}

/// Load every package of `ws`, tests included.
pub fn load_all(ws: &GoWorkspace) -> Vec<Package> {
    GoLoader::new(ws.path())
        .load(&["./...".to_string()])
        .unwrap_or_else(|e| panic!("failed to load {}: {e}", ws.path().display()))
}

/// `Foo` declared in store/models.go, used bare in store/use.go and through
/// an aliased import in api/api.go; `Bar` declared outside the filter and
/// used in report/report.go. The target package exists but is empty.
pub fn relocation_scenario() -> GoWorkspace {
    let ws = GoWorkspace::new("example.com/app");
    ws.write("models/doc.go", "package models\n");
    ws.write("store/models.go", "package store\n\ntype Foo struct {\n\tID int\n}\n");
    ws.write("store/bar.go", "package store\n\ntype Bar struct{}\n");
    ws.write(
        "store/use.go",
        "package store\n\nfunc NewFoo() *Foo {\n\treturn &Foo{}\n}\n",
    );
    ws.write(
        "api/api.go",
        "package api\n\nimport pkgshort \"example.com/app/store\"\n\nfunc Get() pkgshort.Foo {\n\treturn pkgshort.Foo{}\n}\n",
    );
    ws.write(
        "report/report.go",
        "package report\n\nimport \"example.com/app/store\"\n\nvar _ store.Bar\n",
    );
    ws
}
