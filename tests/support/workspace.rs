//! Temporary Go modules for integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const STORE: &str = "example.com/app/store";
pub const MODELS: &str = "example.com/app/models";

/// A temporary Go module. Removed on drop.
pub struct GoWorkspace {
    dir: TempDir,
}

impl GoWorkspace {
    /// Module root with a `go.mod` declaring `module_path`.
    pub fn new(module_path: &str) -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let ws = GoWorkspace { dir };
        ws.write("go.mod", &format!("module {module_path}\n\ngo 1.22\n"));
        ws
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.file(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content).unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    }

    pub fn read(&self, rel: &str) -> String {
        let path = self.file(rel);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
    }
}

/// The reference layout: `Foo` declared in store/models.go and used bare in
/// store/use.go and through an aliased import in api/api.go; `Bar` declared
/// outside the filter and used in report/report.go.
pub fn scenario() -> GoWorkspace {
    let ws = GoWorkspace::new("example.com/app");
    ws.write("models/doc.go", "package models\n");
    ws.write(
        "store/models.go",
        "package store\n\ntype Foo struct {\n\tID int\n}\n",
    );
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

/// Expected store/use.go after relocating with suffix `DB`.
pub const USE_GO_DB: &str = "package store\n\nimport \"example.com/app/models\"\n\nfunc NewFoo() *models.FooDB {\n\treturn &models.FooDB{}\n}\n";

/// Expected api/api.go after relocating with suffix `DB`.
pub const API_GO_DB: &str = "package api\n\nimport \"example.com/app/models\"\n\nfunc Get() models.FooDB {\n\treturn models.FooDB{}\n}\n";
