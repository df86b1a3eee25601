//! Symbol catalog: which type declarations of the source package move.
//!
//! A type is cataloged when it is declared in the source package in a file
//! whose path contains the declaration filter (by default `/models.go`).
//! Types declared elsewhere in the package are reported as skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use movpkg_core::patch::Span;
use thiserror::Error;

use crate::resolve::{DeclKind, ResolutionTable};

/// Errors raised while building the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two files matching the filter declare the same type.
    #[error("type {name} is declared in both {first} and {second}")]
    Conflict {
        name: String,
        first: String,
        second: String,
    },
}

/// A type declaration found in the source package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSymbol {
    pub name: String,
    /// Absolute path of the declaring file.
    pub file: PathBuf,
    /// Span of the declared name.
    pub span: Span,
}

/// The relocation set for one source package.
#[derive(Debug, Clone, Default)]
pub struct SymbolCatalog {
    package: String,
    symbols: BTreeMap<String, CatalogSymbol>,
    skipped: Vec<CatalogSymbol>,
    missing: Vec<String>,
}

impl SymbolCatalog {
    /// Collect the type declarations of `source` whose file path contains
    /// `located`, restricted to `allow` when given.
    ///
    /// The same declaration reached through several package variants is
    /// counted once.
    pub fn discover<'t>(
        tables: impl IntoIterator<Item = &'t ResolutionTable>,
        source: &str,
        located: &str,
        allow: Option<&[String]>,
    ) -> Result<Self, CatalogError> {
        let mut symbols: BTreeMap<String, CatalogSymbol> = BTreeMap::new();
        let mut skipped: BTreeMap<(String, PathBuf), CatalogSymbol> = BTreeMap::new();

        for table in tables {
            for def in &table.defs {
                if def.package != source || def.kind != DeclKind::Type {
                    continue;
                }
                let symbol = CatalogSymbol {
                    name: def.name.clone(),
                    file: def.file.clone(),
                    span: def.span,
                };
                let file_text = def.file.to_string_lossy().replace('\\', "/");
                let allowed = allow.is_none_or(|names| names.iter().any(|n| *n == def.name));
                if !file_text.contains(located) || !allowed {
                    skipped.insert((symbol.name.clone(), symbol.file.clone()), symbol);
                    continue;
                }
                match symbols.get(&def.name) {
                    Some(existing) if existing.file != def.file => {
                        return Err(CatalogError::Conflict {
                            name: def.name.clone(),
                            first: existing.file.display().to_string(),
                            second: def.file.display().to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        symbols.insert(def.name.clone(), symbol);
                    }
                }
            }
        }

        let missing = allow
            .map(|names| {
                names
                    .iter()
                    .filter(|n| !symbols.contains_key(n.as_str()))
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default();

        Ok(SymbolCatalog {
            package: source.to_string(),
            symbols,
            skipped: skipped.into_values().collect(),
            missing,
        })
    }

    /// Import path of the source package.
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogSymbol> {
        self.symbols.get(name)
    }

    /// Cataloged symbols, by name.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogSymbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Type declarations of the source package left out by the filter or allow-list.
    pub fn skipped(&self) -> &[CatalogSymbol] {
        &self.skipped
    }

    /// Allow-listed names that were not cataloged.
    pub fn missing_requested(&self) -> &[String] {
        &self.missing
    }
}
