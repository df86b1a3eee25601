//! Reference rewriting.
//!
//! Each file's resolution facts are first flattened into [`Reference`]s, then
//! the [`RewriteVisitor`] decides per reference whether it denotes a
//! cataloged type and, if so, records a replacement edit on the file entry.
//! The syntax tree itself is never modified.

use movpkg_core::output::{warning_codes, Location, Warning};
use movpkg_core::patch::{EditLabels, Span};
use movpkg_core::text::byte_offset_to_position;
use thiserror::Error;

use crate::catalog::SymbolCatalog;
use crate::registry::FileEntry;
use crate::resolve::{FileTable, IdentUse, ResolutionTable, SelectorUse, UseRole};

/// Errors raised while rewriting a file.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// A local binding would capture the qualifier at a rewrite site.
    #[error("{file}:{line}:{col}: alias '{alias}' is shadowed by a local declaration")]
    AliasShadowed {
        file: String,
        alias: String,
        line: u32,
        col: u32,
    },

    /// The file's package declares the alias name at package level.
    #[error("{file}: alias '{alias}' is declared at package level")]
    AliasDeclared { file: String, alias: String },
}

impl RewriteError {
    pub fn file(&self) -> &str {
        match self {
            RewriteError::AliasShadowed { file, .. } | RewriteError::AliasDeclared { file, .. } => file,
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            RewriteError::AliasShadowed { alias, .. } | RewriteError::AliasDeclared { alias, .. } => alias,
        }
    }
}

// ============================================================================
// References
// ============================================================================

/// A reference occurrence in one of its two shapes.
#[derive(Debug, Clone, Copy)]
pub enum Reference<'t> {
    /// An unqualified identifier.
    Bare(&'t IdentUse),
    /// `qualifier.Member`.
    Qualified(&'t SelectorUse),
}

impl Reference<'_> {
    /// Span the replacement covers.
    pub fn span(&self) -> Span {
        match self {
            Reference::Bare(ident) => ident.span,
            Reference::Qualified(selector) => selector.span,
        }
    }
}

/// All references of a file, in source order.
pub fn references(table: &FileTable) -> Vec<Reference<'_>> {
    let mut refs: Vec<Reference<'_>> = table
        .idents
        .iter()
        .map(Reference::Bare)
        .chain(table.selectors.iter().map(Reference::Qualified))
        .collect();
    refs.sort_by_key(|r| r.span().start);
    refs
}

// ============================================================================
// RewriteVisitor
// ============================================================================

/// Rewrites references to cataloged types into references to the target package.
#[derive(Debug, Clone, Copy)]
pub struct RewriteVisitor<'a> {
    pub catalog: &'a SymbolCatalog,
    /// Target package import path.
    pub target: &'a str,
    /// Qualifier for files that do not already import the target.
    pub default_alias: &'a str,
    pub suffix: &'a str,
}

struct Match<'t> {
    name: &'t str,
    span: Span,
    role: UseRole,
}

impl<'a> RewriteVisitor<'a> {
    fn matches<'t>(&self, reference: Reference<'t>) -> Option<Match<'t>> {
        let source = self.catalog.package();
        match reference {
            Reference::Bare(ident) => {
                if !ident.entity.is_type_in(source) || !self.catalog.contains(&ident.name) {
                    return None;
                }
                Some(Match {
                    name: &ident.name,
                    span: ident.span,
                    role: ident.role,
                })
            }
            Reference::Qualified(selector) => {
                if selector.qualifier.entity.imported_path() != Some(source)
                    || !selector.member.entity.is_type_in(source)
                    || !self.catalog.contains(&selector.member.name)
                {
                    return None;
                }
                Some(Match {
                    name: &selector.member.name,
                    span: selector.span,
                    role: selector.member.role,
                })
            }
        }
    }

    /// Record replacements for every reference in `entry` that denotes a
    /// cataloged type. `package` is the package the entry was registered under.
    pub fn visit(&self, entry: &mut FileEntry, package: &ResolutionTable) -> Result<Vec<Warning>, RewriteError> {
        let Some(table) = package.file(&entry.path) else {
            return Ok(Vec::new());
        };
        let in_target = entry.package.path == self.target;
        let alias = entry
            .alias_for(self.target)
            .unwrap_or(self.default_alias)
            .to_string();

        let mut warnings = Vec::new();
        let mut alias_checked = in_target;
        for reference in references(table) {
            let Some(found) = self.matches(reference) else {
                continue;
            };
            let new_name = format!("{}{}", found.name, self.suffix);
            let location = self.location(entry, found.span);

            // Go cannot declare methods on a type from another package, so a
            // qualified receiver would not compile. Left as is and not counted.
            if found.role == UseRole::Receiver {
                warnings.push(
                    Warning::with_location(
                        warning_codes::RECEIVER_NOT_RELOCATED,
                        format!("method receiver {} was not rewritten", found.name),
                        location,
                    )
                    .suggest(format!("move this method next to {new_name} in {}", self.target)),
                );
                continue;
            }

            let replacement = if in_target {
                new_name.clone()
            } else {
                if !alias_checked {
                    if package.declares(&alias) && !entry.target_imported {
                        return Err(RewriteError::AliasDeclared {
                            file: entry.rel_path().to_string(),
                            alias,
                        });
                    }
                    alias_checked = true;
                }
                if table.is_shadowed(&alias, found.span.start) {
                    return Err(RewriteError::AliasShadowed {
                        file: entry.rel_path().to_string(),
                        alias,
                        line: location.line,
                        col: location.col,
                    });
                }
                format!("{alias}.{new_name}")
            };

            if found.role == UseRole::Embedded && !self.suffix.is_empty() {
                warnings.push(Warning::with_location(
                    warning_codes::EMBEDDED_FIELD_RENAMED,
                    format!(
                        "embedded field {} is promoted as {new_name} after the rewrite",
                        found.name
                    ),
                    location,
                ));
            }

            entry.replace(
                found.span,
                replacement,
                EditLabels {
                    symbol: Some(found.name.to_string()),
                    reason: Some("relocate reference".to_string()),
                },
            );
            entry.count += 1;
        }

        Ok(warnings)
    }

    fn location(&self, entry: &FileEntry, span: Span) -> Location {
        let (line, col) = byte_offset_to_position(entry.text().as_bytes(), span.start as usize);
        Location::with_span(entry.rel_path(), line, col, span.start, span.end)
    }
}
