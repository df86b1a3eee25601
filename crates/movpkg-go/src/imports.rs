//! Import reconciliation for rewritten files.
//!
//! After references are rewritten, a changed file must import the target
//! package under the qualifier its new references use, and an import of the
//! source package whose every use was rewritten must go (Go rejects unused
//! imports). When both happen in one file, the source import spec is turned
//! into the target spec in place.

use movpkg_core::output::ImportStatus;
use movpkg_core::patch::{EditLabels, Span};
use movpkg_core::text::{expand_to_lines, line_end, line_indent, line_start};
use thiserror::Error;
use tracing::debug;
use tree_sitter::Node;

use crate::registry::FileEntry;
use crate::resolve::{named_children, specs_of, unquote, FileTable, ImportBinding};

/// Errors raised while reconciling imports.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The alias is already bound to another package in the file.
    #[error("{file}: alias '{alias}' is already bound to \"{existing}\"")]
    AliasConflict {
        file: String,
        alias: String,
        existing: String,
    },
}

/// What reconciliation did to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub action: ImportStatus,
    /// Qualifier the file's rewritten references use (empty in the target package).
    pub alias: String,
    /// Whether an unused source import was removed or replaced.
    pub pruned_source: bool,
}

/// Reconciles the imports of changed files.
#[derive(Debug, Clone, Copy)]
pub struct ImportReconciler<'a> {
    /// Target package import path.
    pub target: &'a str,
    /// Source package import path.
    pub source: &'a str,
    /// Qualifier for files that do not already import the target.
    pub default_alias: &'a str,
    /// Name an unaliased import of the target binds.
    pub target_name: &'a str,
}

/// An import spec located in the syntax tree.
struct SpecSite {
    span: Span,
    path: String,
    /// Span of the enclosing `import` declaration.
    decl: Span,
    /// Number of specs in that declaration.
    siblings: usize,
}

impl<'a> ImportReconciler<'a> {
    /// Reconcile `entry`'s imports. Files without rewrites are left alone.
    pub fn reconcile(&self, entry: &mut FileEntry, table: &FileTable) -> Result<ImportReport, ReconcileError> {
        let in_target = entry.package.path == self.target;
        if !entry.is_changed() {
            return Ok(ImportReport {
                action: if in_target { ImportStatus::SamePackage } else { ImportStatus::Present },
                alias: String::new(),
                pruned_source: false,
            });
        }

        let sites = import_sites(entry);
        let prunable: Vec<&ImportBinding> = table
            .qualifier_imports(self.source)
            .filter(|b| self.all_uses_rewritten(entry, table, b))
            .collect();

        let alias = if in_target {
            String::new()
        } else {
            entry
                .alias_for(self.target)
                .unwrap_or(self.default_alias)
                .to_string()
        };
        let needs_import = !in_target && !entry.target_imported;

        if needs_import {
            let clash = table.imports.iter().find(|b| {
                b.is_qualifier()
                    && b.local == alias
                    && b.path != self.target
                    && !prunable.iter().any(|p| p.span == b.span)
            });
            if let Some(existing) = clash {
                return Err(ReconcileError::AliasConflict {
                    file: entry.rel_path().to_string(),
                    alias,
                    existing: existing.path.clone(),
                });
            }
        }

        let spec = if alias == self.target_name {
            format!("\"{}\"", self.target)
        } else {
            format!("{alias} \"{}\"", self.target)
        };
        let labels = || EditLabels {
            symbol: None,
            reason: Some("reconcile imports".to_string()),
        };

        let mut prune_spans: Vec<Span> = prunable.iter().map(|b| b.span).collect();
        let mut action = if in_target {
            ImportStatus::SamePackage
        } else {
            ImportStatus::Present
        };

        if needs_import {
            if let Some(first) = prune_spans.first().copied() {
                entry.replace(first, spec.clone(), labels());
                prune_spans.remove(0);
                action = ImportStatus::Replaced;
            } else {
                let (offset, text) = insertion_point(entry, &sites, &spec, self.target, &prune_spans);
                entry.insert(offset, text, labels());
                action = ImportStatus::Added;
            }
            entry.imports.insert(self.target.to_string(), alias.clone());
            entry.target_imported = true;
        }

        for span in &prune_spans {
            if let Some(site) = sites.iter().find(|s| s.span == *span) {
                let removal = if site.siblings == 1 {
                    removal_span(entry.text().as_bytes(), site.decl)
                } else {
                    expand_to_lines(entry.text().as_bytes(), site.span)
                };
                entry.delete(removal, labels());
            }
        }
        let pruned_source = !prunable.is_empty();
        if pruned_source {
            entry.imports.remove(self.source);
        }

        debug!(
            file = entry.rel_path(),
            action = ?action,
            pruned_source,
            "reconciled imports"
        );
        Ok(ImportReport {
            action,
            alias,
            pruned_source,
        })
    }

    /// Whether every use of `binding`'s qualifier in the file was rewritten.
    fn all_uses_rewritten(&self, entry: &FileEntry, table: &FileTable, binding: &ImportBinding) -> bool {
        let mut uses = table
            .selectors
            .iter()
            .filter(|s| s.qualifier.name == binding.local && s.qualifier.entity.imported_path() == Some(self.source))
            .peekable();
        if uses.peek().is_none() {
            return false;
        }
        uses.all(|s| entry.edits.iter().any(|e| e.span() == s.span))
    }
}

// ============================================================================
// Spec Placement
// ============================================================================

fn import_sites(entry: &FileEntry) -> Vec<SpecSite> {
    let root = entry.source.tree.root_node();
    let text = entry.text();
    let mut sites = Vec::new();
    for decl in import_declarations(root) {
        let specs = specs_of(decl, &["import_spec"]);
        let siblings = specs.len();
        for spec in specs {
            let path = spec
                .child_by_field_name("path")
                .map(|p| unquote(p.utf8_text(text.as_bytes()).unwrap_or("")))
                .unwrap_or_default();
            sites.push(SpecSite {
                span: Span::from_range(spec.byte_range()),
                path,
                decl: Span::from_range(decl.byte_range()),
                siblings,
            });
        }
    }
    sites
}

fn import_declarations(root: Node<'_>) -> Vec<Node<'_>> {
    named_children(root)
        .into_iter()
        .filter(|n| n.kind() == "import_declaration")
        .collect()
}

/// Where to insert `spec` and the text to insert.
///
/// Sorted into the last parenthesized group; else after the last import
/// declaration; else after the package clause.
fn insertion_point(
    entry: &FileEntry,
    sites: &[SpecSite],
    spec: &str,
    target: &str,
    pruned: &[Span],
) -> (u64, String) {
    let root = entry.source.tree.root_node();
    let text = entry.text();
    let bytes = text.as_bytes();
    let decls = import_declarations(root);

    let group = decls.iter().rev().find_map(|d| {
        named_children(*d)
            .into_iter()
            .find(|c| c.kind() == "import_spec_list")
    });
    if let Some(list) = group {
        let list_span = Span::from_range(list.byte_range());
        let members: Vec<&SpecSite> = sites
            .iter()
            .filter(|s| list_span.contains(&s.span) && !pruned.contains(&s.span))
            .collect();
        let Some(last) = members.last() else {
            // `import ()`
            let open = list.start_byte() + 1;
            return (open as u64, format!("\n\t{spec}\n"));
        };
        let indent = line_indent(text, members[0].span.start as usize).to_string();
        if let Some(next) = members.iter().find(|s| s.path.as_str() > target) {
            let at = line_start(bytes, next.span.start as usize);
            return (at as u64, format!("{indent}{spec}\n"));
        }
        let at = line_end(bytes, last.span.end as usize);
        return (at as u64, format!("\n{indent}{spec}"));
    }

    if let Some(last) = decls.last() {
        return (last.end_byte() as u64, format!("\nimport {spec}"));
    }

    let clause_end = named_children(root)
        .into_iter()
        .find(|n| n.kind() == "package_clause")
        .map_or(0, |n| n.end_byte());
    (clause_end as u64, format!("\n\nimport {spec}"))
}

/// Span removing a whole import declaration, plus one adjoining blank line.
fn removal_span(bytes: &[u8], decl: Span) -> Span {
    let lines = expand_to_lines(bytes, decl);
    let start = lines.start as usize;
    let end = lines.end as usize;
    let blank_before = start >= 2 && bytes[start - 1] == b'\n' && bytes[start - 2] == b'\n';
    let blank_after = bytes.get(end) == Some(&b'\n');
    if lines != decl && blank_before && blank_after {
        Span::new(lines.start, lines.end + 1)
    } else {
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SymbolCatalog;
    use crate::loader::Package;
    use crate::registry::FileRegistry;
    use crate::rewrite::RewriteVisitor;
    use crate::test_helpers::{load_all, GoWorkspace, STORE, TARGET};
    use crate::writer::render;

    const MODELS: &str = "package store\n\ntype Foo struct{}\n";

    /// Rewrite and reconcile one file; returns the report and the new text.
    fn run(ws: &GoWorkspace, rel: &str, alias: &str) -> Result<(ImportReport, String), ReconcileError> {
        let packages = load_all(ws);
        let catalog =
            SymbolCatalog::discover(packages.iter().map(|p| &p.info), STORE, "/models.go", None).unwrap();
        let mut registry = FileRegistry::new(TARGET);
        registry.populate(&packages);

        let entry = registry.get_mut(&ws.file(rel)).unwrap();
        let package: &Package = packages.iter().find(|p| p.id == entry.package).unwrap();
        let visitor = RewriteVisitor {
            catalog: &catalog,
            target: TARGET,
            default_alias: alias,
            suffix: "DB",
        };
        visitor.visit(entry, &package.info).unwrap();

        let reconciler = ImportReconciler {
            target: TARGET,
            source: STORE,
            default_alias: alias,
            target_name: "models",
        };
        let table = package.info.file(&entry.path).unwrap();
        let report = reconciler.reconcile(entry, table)?;
        let text = String::from_utf8(render(entry).unwrap()).unwrap();
        Ok((report, text))
    }

    fn workspace() -> GoWorkspace {
        let ws = GoWorkspace::new("example.com/app");
        ws.write("store/models.go", MODELS);
        ws.write("models/models.go", "package models\n\ntype FooDB struct{}\n");
        ws
    }

    mod pruning {
        use super::*;

        #[test]
        fn sole_source_import_is_replaced_in_place() {
            let ws = workspace();
            ws.write(
                "api/api.go",
                "package api\n\nimport pkgshort \"example.com/app/store\"\n\nvar v pkgshort.Foo\n",
            );
            let (report, text) = run(&ws, "api/api.go", "models").unwrap();
            assert_eq!(report.action, ImportStatus::Replaced);
            assert!(report.pruned_source);
            assert_eq!(
                text,
                "package api\n\nimport \"example.com/app/models\"\n\nvar v models.FooDB\n"
            );
        }

        #[test]
        fn source_import_still_in_use_is_kept() {
            let ws = workspace();
            ws.write("store/other.go", "package store\n\nfunc New() int { return 0 }\n");
            ws.write(
                "api/api.go",
                "package api\n\nimport \"example.com/app/store\"\n\nvar v store.Foo\nvar n = store.New()\n",
            );
            let (report, text) = run(&ws, "api/api.go", "models").unwrap();
            assert_eq!(report.action, ImportStatus::Added);
            assert!(!report.pruned_source);
            assert_eq!(
                text,
                "package api\n\nimport \"example.com/app/store\"\nimport \"example.com/app/models\"\n\nvar v models.FooDB\nvar n = store.New()\n"
            );
        }

        #[test]
        fn grouped_source_import_line_is_deleted_when_target_present() {
            let ws = workspace();
            ws.write(
                "api/api.go",
                "package api\n\nimport (\n\t\"fmt\"\n\n\t\"example.com/app/models\"\n\t\"example.com/app/store\"\n)\n\nvar v store.Foo\nvar w models.FooDB\nvar _ = fmt.Sprint\n",
            );
            let (report, text) = run(&ws, "api/api.go", "models").unwrap();
            assert_eq!(report.action, ImportStatus::Present);
            assert!(report.pruned_source);
            assert_eq!(
                text,
                "package api\n\nimport (\n\t\"fmt\"\n\n\t\"example.com/app/models\"\n)\n\nvar v models.FooDB\nvar w models.FooDB\nvar _ = fmt.Sprint\n"
            );
        }

        #[test]
        fn sole_declaration_is_removed_in_target_package() {
            let ws = workspace();
            ws.write(
                "models/use.go",
                "package models\n\nimport \"example.com/app/store\"\n\nvar legacy store.Foo\n",
            );
            let (report, text) = run(&ws, "models/use.go", "models").unwrap();
            assert_eq!(report.action, ImportStatus::SamePackage);
            assert_eq!(text, "package models\n\nvar legacy FooDB\n");
        }
    }

    mod insertion {
        use super::*;

        #[test]
        fn sorted_into_last_group() {
            let ws = workspace();
            ws.write(
                "store/use.go",
                "package store\n\nimport (\n\t\"example.com/app/a\"\n\t\"example.com/app/z\"\n)\n\nvar f Foo\nvar _ = a.X\nvar _ = z.Y\n",
            );
            let (report, text) = run(&ws, "store/use.go", "models").unwrap();
            assert_eq!(report.action, ImportStatus::Added);
            assert!(text.starts_with(
                "package store\n\nimport (\n\t\"example.com/app/a\"\n\t\"example.com/app/models\"\n\t\"example.com/app/z\"\n)\n"
            ));
        }

        #[test]
        fn appended_to_group_end() {
            let ws = workspace();
            ws.write(
                "store/use.go",
                "package store\n\nimport (\n    \"bytes\"\n)\n\nvar f Foo\nvar _ = bytes.NewReader\n",
            );
            let (_, text) = run(&ws, "store/use.go", "models").unwrap();
            assert!(text.starts_with(
                "package store\n\nimport (\n    \"bytes\"\n    \"example.com/app/models\"\n)\n"
            ));
        }

        #[test]
        fn after_package_clause_without_imports() {
            let ws = workspace();
            ws.write("store/use.go", "package store\n\nvar f Foo\n");
            let (report, text) = run(&ws, "store/use.go", "m").unwrap();
            assert_eq!(report.alias, "m");
            assert_eq!(
                text,
                "package store\n\nimport m \"example.com/app/models\"\n\nvar f m.FooDB\n"
            );
        }
    }

    mod conflicts {
        use super::*;

        #[test]
        fn alias_bound_to_other_package_is_fatal() {
            let ws = workspace();
            ws.write(
                "store/use.go",
                "package store\n\nimport models \"example.com/other/models\"\n\nvar f Foo\nvar _ = models.X\n",
            );
            let err = run(&ws, "store/use.go", "models").unwrap_err();
            let ReconcileError::AliasConflict { alias, existing, .. } = err;
            assert_eq!(alias, "models");
            assert_eq!(existing, "example.com/other/models");
        }

        #[test]
        fn binding_being_pruned_does_not_collide() {
            let ws = workspace();
            ws.write(
                "api/api.go",
                "package api\n\nimport models \"example.com/app/store\"\n\nvar v models.Foo\n",
            );
            let (report, text) = run(&ws, "api/api.go", "models").unwrap();
            assert_eq!(report.action, ImportStatus::Replaced);
            assert_eq!(
                text,
                "package api\n\nimport \"example.com/app/models\"\n\nvar v models.FooDB\n"
            );
        }
    }

    #[test]
    fn unchanged_file_is_untouched() {
        let ws = workspace();
        ws.write("api/api.go", "package api\n\nvar x int\n");
        let (report, text) = run(&ws, "api/api.go", "models").unwrap();
        assert_eq!(report.action, ImportStatus::Present);
        assert_eq!(text, "package api\n\nvar x int\n");
    }
}
