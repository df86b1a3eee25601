//! Run-scoped registry of the files involved in a relocation.
//!
//! One [`FileEntry`] per file path, however many package variants reach the
//! file. Each entry owns its parsed source, the imports visible in it, and
//! the edits recorded against it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use movpkg_core::patch::{Anchor, Edit, EditLabels, FileId, Span};

use crate::loader::{Package, PackageId, SourceFile};

/// Per-file relocation state.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute path.
    pub path: PathBuf,
    pub file_id: FileId,
    /// Package the file was first registered under.
    pub package: PackageId,
    pub source: SourceFile,
    /// Number of references rewritten in this file.
    pub count: u32,
    /// Import path to the name it is bound under in this file.
    pub imports: BTreeMap<String, String>,
    /// Whether the file already imports the target package.
    pub target_imported: bool,
    /// Pending edits against the original text.
    pub edits: Vec<Edit>,
}

impl FileEntry {
    fn new(file: &SourceFile, file_id: FileId, package: &PackageId) -> Self {
        FileEntry {
            path: file.path.clone(),
            file_id,
            package: package.clone(),
            source: file.clone(),
            count: 0,
            imports: BTreeMap::new(),
            target_imported: false,
            edits: Vec::new(),
        }
    }

    /// Module-relative path.
    pub fn rel_path(&self) -> &str {
        &self.source.rel_path
    }

    pub fn text(&self) -> &str {
        &self.source.text
    }

    /// Whether any reference in the file was rewritten.
    pub fn is_changed(&self) -> bool {
        self.count > 0
    }

    /// Alias this file binds `import_path` to, if imported.
    pub fn alias_for(&self, import_path: &str) -> Option<&str> {
        self.imports.get(import_path).map(String::as_str)
    }

    fn next_edit_id(&self) -> u32 {
        self.edits.len() as u32
    }

    /// Record a replacement of `span`.
    pub fn replace(&mut self, span: Span, text: impl Into<String>, labels: EditLabels) {
        let anchor = Anchor::span_exact(span, self.source.text.as_bytes());
        let edit = Edit::replace(self.next_edit_id(), self.file_id, anchor, text).with_labels(labels);
        self.edits.push(edit);
    }

    /// Record an insertion at `offset`.
    pub fn insert(&mut self, offset: u64, text: impl Into<String>, labels: EditLabels) {
        let anchor = Anchor::span_exact(Span::point(offset), self.source.text.as_bytes());
        let edit = Edit::insert(self.next_edit_id(), self.file_id, anchor, text).with_labels(labels);
        self.edits.push(edit);
    }

    /// Record a deletion of `span`. Empty spans are ignored.
    pub fn delete(&mut self, span: Span, labels: EditLabels) {
        if span.is_empty() {
            return;
        }
        let anchor = Anchor::span_exact(span, self.source.text.as_bytes());
        let edit = Edit::delete(self.next_edit_id(), self.file_id, anchor).with_labels(labels);
        self.edits.push(edit);
    }
}

/// All files reachable from the loaded packages, keyed by path.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    target: String,
    entries: BTreeMap<PathBuf, FileEntry>,
    next_id: u32,
}

impl FileRegistry {
    /// Empty registry for a run relocating into `target`.
    pub fn new(target: impl Into<String>) -> Self {
        FileRegistry {
            target: target.into(),
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Register a file under `package`. Returns false (and keeps the first
    /// entry) when the path is already registered.
    pub fn register(&mut self, file: &SourceFile, package: &PackageId) -> bool {
        if self.entries.contains_key(&file.path) {
            return false;
        }
        let file_id = FileId::new(self.next_id);
        self.next_id += 1;
        self.entries
            .insert(file.path.clone(), FileEntry::new(file, file_id, package));
        true
    }

    /// Record that `path` binds `import_path` as `alias`. Returns false for
    /// unregistered files.
    pub fn record_import(&mut self, path: &Path, import_path: &str, alias: &str) -> bool {
        let Some(entry) = self.entries.get_mut(path) else {
            return false;
        };
        entry
            .imports
            .insert(import_path.to_string(), alias.to_string());
        if import_path == self.target {
            entry.target_imported = true;
        }
        true
    }

    /// Register every file of `packages` and record the qualifier imports
    /// visible in each. Blank and dot imports bind no qualifier and are skipped.
    pub fn populate(&mut self, packages: &[Package]) {
        for package in packages {
            for file in &package.files {
                self.register(file, &package.id);
                let Some(table) = package.info.file(&file.path) else {
                    continue;
                };
                for binding in table.imports.iter().filter(|b| b.is_qualifier()) {
                    self.record_import(&file.path, &binding.path, &binding.local);
                }
            }
        }
    }

    pub fn get(&self, path: &Path) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut FileEntry> {
        self.entries.get_mut(path)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values()
    }

    /// Entries with at least one rewritten reference.
    pub fn changed(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values().filter(|e| e.is_changed())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::go_parser;
    use crate::test_helpers::{load_all, GoWorkspace, TARGET};

    fn source(path: &str, text: &str) -> SourceFile {
        let mut parser = go_parser().unwrap();
        SourceFile::parse(
            &mut parser,
            PathBuf::from(path),
            path.trim_start_matches("/m/").to_string(),
            text.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn registration_is_idempotent_per_path() {
        let file = source("/m/store/use.go", "package store\n");
        let base = PackageId::new("example.com/app/store");
        let variant = PackageId::test_variant("example.com/app/store", "example.com/app/store");

        let mut registry = FileRegistry::new(TARGET);
        assert!(registry.register(&file, &base));
        assert!(!registry.register(&file, &variant));
        assert_eq!(registry.len(), 1);

        let entry = registry.get(Path::new("/m/store/use.go")).unwrap();
        assert_eq!(entry.package, base);
        assert_eq!(entry.file_id, FileId::new(0));
    }

    #[test]
    fn file_ids_follow_registration_order() {
        let mut registry = FileRegistry::new(TARGET);
        let pkg = PackageId::new("example.com/app/store");
        registry.register(&source("/m/store/b.go", "package store\n"), &pkg);
        registry.register(&source("/m/store/a.go", "package store\n"), &pkg);
        assert_eq!(registry.get(Path::new("/m/store/b.go")).unwrap().file_id, FileId::new(0));
        assert_eq!(registry.get(Path::new("/m/store/a.go")).unwrap().file_id, FileId::new(1));
        let order: Vec<_> = registry.iter().map(|e| e.rel_path().to_string()).collect();
        assert_eq!(order, vec!["store/a.go", "store/b.go"]);
    }

    #[test]
    fn recording_target_import_marks_entry() {
        let mut registry = FileRegistry::new(TARGET);
        let path = Path::new("/m/api/api.go");
        registry.register(&source("/m/api/api.go", "package api\n"), &PackageId::new("example.com/app/api"));

        assert!(registry.record_import(path, "example.com/app/store", "pkgshort"));
        assert!(!registry.get(path).unwrap().target_imported);

        assert!(registry.record_import(path, TARGET, "m"));
        assert!(registry.record_import(path, TARGET, "m"));
        let entry = registry.get(path).unwrap();
        assert!(entry.target_imported);
        assert_eq!(entry.imports.len(), 2);
        assert_eq!(entry.alias_for(TARGET), Some("m"));

        assert!(!registry.record_import(Path::new("/m/missing.go"), TARGET, "m"));
    }

    #[test]
    fn populate_skips_blank_and_dot_imports() {
        let ws = GoWorkspace::new("example.com/app");
        ws.write("models/models.go", "package models\n\ntype Foo struct{}\n");
        ws.write(
            "api/api.go",
            "package api\n\nimport (\n\t\"example.com/app/models\"\n\t_ \"embed\"\n\t. \"strings\"\n)\n\nvar _ models.Foo\nvar _ = ToUpper\n",
        );
        ws.write("api/api_test.go", "package api\n");
        let packages = load_all(&ws);

        let mut registry = FileRegistry::new(TARGET);
        registry.populate(&packages);
        assert_eq!(registry.len(), 3);
        let entry = registry.get(&ws.file("api/api.go")).unwrap();
        assert_eq!(entry.imports.len(), 1);
        assert!(entry.target_imported);
        assert_eq!(entry.alias_for(TARGET), Some("models"));
        assert_eq!(entry.package, PackageId::new("example.com/app/api"));
    }

    #[test]
    fn edits_are_anchored_and_counted_separately() {
        let mut registry = FileRegistry::new(TARGET);
        let path = Path::new("/m/store/use.go");
        registry.register(&source("/m/store/use.go", "package store\n\nvar f Foo\n"), &PackageId::new("example.com/app/store"));

        let entry = registry.get_mut(path).unwrap();
        entry.replace(Span::new(21, 24), "models.Foo", EditLabels::default());
        entry.delete(Span::point(3), EditLabels::default());
        assert_eq!(entry.edits.len(), 1);
        assert_eq!(entry.edits[0].span(), Span::new(21, 24));
        assert_eq!(entry.count, 0);
        assert_eq!(registry.changed().count(), 0);

        registry.get_mut(path).unwrap().count += 1;
        assert_eq!(registry.changed().count(), 1);
    }
}
