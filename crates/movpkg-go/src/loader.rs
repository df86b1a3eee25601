//! Package loading for Go modules.
//!
//! [`GoLoader`] is the concrete [`PackageLoader`]: it discovers the module,
//! expands `go list` style patterns, parses every matched file with
//! tree-sitter-go and runs the resolver over each package variant.
//!
//! ## Variants
//!
//! With tests included, a directory `p` yields up to three packages:
//!
//! - `p`: the non-test files
//! - `p [p.test]`: the non-test files plus in-package `_test.go` files
//! - `p_test [p.test]`: external test files (`package p_test`)
//!
//! The same file can therefore appear in more than one package.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use movpkg_core::patch::ContentHash;
use thiserror::Error;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser, Tree};

use crate::files::{
    collect_package_dirs, is_build_ignored, is_test_file, normalize_path, FileError, GoModule,
    PackageDir, PackagePattern,
};
use crate::resolve::{
    collect_definitions, collect_imports, package_name, resolve_file, PackageIndex, PackageScope,
    ResolutionTable,
};

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while loading packages.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("failed to initialize Go parser: {0}")]
    Parser(String),

    /// The file does not parse.
    #[error("{file}:{line}:{col}: syntax error")]
    Syntax { file: String, line: u32, col: u32 },

    /// Non-test files of one directory declare different packages.
    #[error("found packages {first} and {second} in {dir}")]
    MixedPackages {
        dir: String,
        first: String,
        second: String,
    },

    #[error("{file}: expected package clause")]
    MissingPackageClause { file: String },

    #[error("{file}: source is not valid UTF-8")]
    Encoding { file: String },

    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    /// The file the error is about, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            LoadError::Syntax { file, .. }
            | LoadError::MissingPackageClause { file }
            | LoadError::Encoding { file }
            | LoadError::Io { file, .. } => Some(file),
            _ => None,
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

// ============================================================================
// Loaded Packages
// ============================================================================

/// Identity of a loaded package variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    /// Import path (`p`, or `p_test` for external tests).
    pub path: String,
    /// For test variants, the package under test.
    pub test_of: Option<String>,
}

impl PackageId {
    pub fn new(path: impl Into<String>) -> Self {
        PackageId {
            path: path.into(),
            test_of: None,
        }
    }

    pub fn test_variant(path: impl Into<String>, test_of: impl Into<String>) -> Self {
        PackageId {
            path: path.into(),
            test_of: Some(test_of.into()),
        }
    }

    pub fn is_test(&self) -> bool {
        self.test_of.is_some()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.test_of {
            Some(base) => write!(f, "{} [{}.test]", self.path, base),
            None => f.write_str(&self.path),
        }
    }
}

/// A parsed Go source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path.
    pub path: PathBuf,
    /// Path relative to the module root, `/`-separated.
    pub rel_path: String,
    pub text: String,
    pub tree: Tree,
    /// Hash of the bytes read from disk.
    pub hash: ContentHash,
}

impl SourceFile {
    /// Parse `text` as the content of `path`.
    pub fn parse(
        parser: &mut Parser,
        path: PathBuf,
        rel_path: String,
        text: String,
    ) -> LoadResult<Self> {
        let tree = parse_tree(parser, &text)?;
        let hash = ContentHash::compute(text.as_bytes());
        Ok(SourceFile {
            path,
            rel_path,
            text,
            tree,
            hash,
        })
    }

    /// Fail on the first syntax error.
    pub fn check_syntax(&self) -> LoadResult<()> {
        match first_error(self.tree.root_node()) {
            Some(node) => {
                let pos = node.start_position();
                Err(LoadError::Syntax {
                    file: self.rel_path.clone(),
                    line: pos.row as u32 + 1,
                    col: pos.column as u32 + 1,
                })
            }
            None => Ok(()),
        }
    }

    /// Package clause name.
    pub fn package_name(&self) -> Option<String> {
        package_name(self.tree.root_node(), &self.text)
    }
}

/// One loaded package variant with its files and resolution facts.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    /// Declared package name.
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
    pub info: ResolutionTable,
}

/// Loads and resolves the packages matching a set of patterns.
pub trait PackageLoader {
    fn load(&self, patterns: &[String]) -> LoadResult<Vec<Package>>;
}

// ============================================================================
// GoLoader
// ============================================================================

/// Loads Go packages from a module on disk.
#[derive(Debug, Clone)]
pub struct GoLoader {
    workspace: PathBuf,
    include_tests: bool,
}

/// A package variant before resolution.
struct Unit {
    id: PackageId,
    name: String,
    dir: PathBuf,
    files: Vec<SourceFile>,
}

impl GoLoader {
    /// Loader rooted at `workspace`; relative patterns resolve against it.
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        GoLoader {
            workspace: workspace.into(),
            include_tests: true,
        }
    }

    /// Whether `_test.go` files and test variants are loaded.
    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }

    fn workspace_dir(&self) -> LoadResult<PathBuf> {
        if self.workspace.is_absolute() {
            Ok(normalize_path(&self.workspace))
        } else {
            let cwd = std::env::current_dir().map_err(FileError::from)?;
            Ok(normalize_path(&cwd.join(&self.workspace)))
        }
    }

    fn read_file(&self, parser: &mut Parser, module: &GoModule, path: &Path) -> LoadResult<Option<SourceFile>> {
        let rel_path = relative_display(&module.root, path);
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            file: rel_path.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| LoadError::Encoding {
            file: rel_path.clone(),
        })?;
        if is_build_ignored(&text) {
            debug!(file = %rel_path, "skipping build-ignored file");
            return Ok(None);
        }
        SourceFile::parse(parser, path.to_path_buf(), rel_path, text).map(Some)
    }

    /// Parse one directory into its package variants.
    fn parse_dir(&self, parser: &mut Parser, module: &GoModule, dir: &PackageDir) -> LoadResult<Vec<Unit>> {
        let mut sources = Vec::new();
        let mut tests = Vec::new();
        for path in &dir.files {
            let is_test = is_test_file(path);
            if is_test && !self.include_tests {
                continue;
            }
            let Some(file) = self.read_file(parser, module, path)? else {
                continue;
            };
            file.check_syntax()?;
            let name = file
                .package_name()
                .ok_or_else(|| LoadError::MissingPackageClause {
                    file: file.rel_path.clone(),
                })?;
            if is_test {
                tests.push((name, file));
            } else {
                sources.push((name, file));
            }
        }

        let dir_display = relative_display(&module.root, &dir.dir);
        let base_name = match sources.first().or(tests.first()) {
            Some((name, _)) => name.strip_suffix("_test").unwrap_or(name).to_string(),
            None => return Ok(Vec::new()),
        };
        let external_name = format!("{base_name}_test");

        for (name, _) in &sources {
            if *name != base_name {
                return Err(LoadError::MixedPackages {
                    dir: dir_display,
                    first: base_name,
                    second: name.clone(),
                });
            }
        }
        let mut internal = Vec::new();
        let mut external = Vec::new();
        for (name, file) in tests {
            if name == base_name {
                internal.push(file);
            } else if name == external_name {
                external.push(file);
            } else {
                return Err(LoadError::MixedPackages {
                    dir: dir_display,
                    first: base_name,
                    second: name,
                });
            }
        }

        let sources: Vec<SourceFile> = sources.into_iter().map(|(_, f)| f).collect();
        let path = &dir.import_path;
        let mut units = Vec::new();
        if !sources.is_empty() {
            units.push(Unit {
                id: PackageId::new(path.clone()),
                name: base_name.clone(),
                dir: dir.dir.clone(),
                files: sources.clone(),
            });
        }
        if !internal.is_empty() {
            let mut files = sources;
            files.extend(internal);
            units.push(Unit {
                id: PackageId::test_variant(path.clone(), path.clone()),
                name: base_name.clone(),
                dir: dir.dir.clone(),
                files,
            });
        }
        if !external.is_empty() {
            units.push(Unit {
                id: PackageId::test_variant(format!("{path}_test"), path.clone()),
                name: external_name,
                dir: dir.dir.clone(),
                files: external,
            });
        }
        Ok(units)
    }

    /// Package block of an in-module dependency, from its non-test files.
    fn dependency_scope(&self, parser: &mut Parser, module: &GoModule, dir: &PackageDir) -> LoadResult<Option<PackageScope>> {
        let mut name = None;
        let mut defs = Vec::new();
        for path in dir.files.iter().filter(|p| !is_test_file(p)) {
            let Some(file) = self.read_file(parser, module, path)? else {
                continue;
            };
            let root = file.tree.root_node();
            if name.is_none() {
                name = file.package_name();
            }
            defs.extend(collect_definitions(root, &file.text, &dir.import_path, &file.path));
        }
        Ok(name.map(|name| PackageScope::new(dir.import_path.clone(), name, &defs)))
    }
}

impl PackageLoader for GoLoader {
    fn load(&self, patterns: &[String]) -> LoadResult<Vec<Package>> {
        let cwd = self.workspace_dir()?;
        let module = GoModule::discover(&cwd)?;
        debug!(module = %module.path, root = %module.root.display(), "discovered module");

        let default_patterns = [".".to_string()];
        let patterns = if patterns.is_empty() {
            &default_patterns[..]
        } else {
            patterns
        };
        let compiled = patterns
            .iter()
            .map(|p| PackagePattern::parse(p, &module, &cwd))
            .collect::<Result<Vec<_>, _>>()?;

        let dirs = collect_package_dirs(&module)?;
        for pattern in &compiled {
            if !dirs.iter().any(|d| pattern.matches(&d.import_path)) {
                warn!(pattern = pattern.as_str(), "pattern matched no packages");
            }
        }

        let mut parser = go_parser()?;
        let mut units = Vec::new();
        let mut selected = HashSet::new();
        for dir in &dirs {
            if compiled.iter().any(|p| p.matches(&dir.import_path)) {
                selected.insert(dir.import_path.clone());
                units.extend(self.parse_dir(&mut parser, &module, dir)?);
            }
        }

        // Package blocks, test variants replacing their base package.
        let mut index = PackageIndex::default();
        let mut unit_defs = Vec::with_capacity(units.len());
        for unit in &units {
            let defs: Vec<_> = unit
                .files
                .iter()
                .flat_map(|f| collect_definitions(f.tree.root_node(), &f.text, &unit.id.path, &f.path))
                .collect();
            index.insert(PackageScope::new(unit.id.path.clone(), unit.name.clone(), &defs));
            unit_defs.push(defs);
        }

        let mut dependencies = BTreeSet::new();
        for unit in &units {
            for file in &unit.files {
                for binding in collect_imports(file.tree.root_node(), &file.text, &index) {
                    if module.contains(&binding.path) && !selected.contains(&binding.path) {
                        dependencies.insert(binding.path);
                    }
                }
            }
        }
        for dep in &dependencies {
            let Some(dir) = dirs.iter().find(|d| &d.import_path == dep) else {
                continue;
            };
            if let Some(scope) = self.dependency_scope(&mut parser, &module, dir)? {
                debug!(package = %dep, decls = scope.decls.len(), "loaded dependency declarations");
                index.insert(scope);
            }
        }

        let mut packages = Vec::with_capacity(units.len());
        for (unit, defs) in units.into_iter().zip(unit_defs) {
            let scope = PackageScope::new(unit.id.path.clone(), unit.name.clone(), &defs);
            let mut info = ResolutionTable {
                package: unit.id.path.clone(),
                defs,
                ..Default::default()
            };
            for file in &unit.files {
                let root = file.tree.root_node();
                let imports = collect_imports(root, &file.text, &index);
                let table = resolve_file(root, &file.text, &scope, &index, imports);
                info.files.insert(file.path.clone(), table);
            }
            debug!(package = %unit.id, files = unit.files.len(), "resolved package");
            packages.push(Package {
                id: unit.id,
                name: unit.name,
                dir: unit.dir,
                files: unit.files,
                info,
            });
        }

        Ok(packages)
    }
}

// ============================================================================
// Parsing Helpers
// ============================================================================

/// A parser configured for Go.
pub fn go_parser() -> LoadResult<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| LoadError::Parser(e.to_string()))?;
    Ok(parser)
}

/// Parse Go source text.
pub fn parse_tree(parser: &mut Parser, text: &str) -> LoadResult<Tree> {
    parser
        .parse(text, None)
        .ok_or_else(|| LoadError::Parser("parse did not complete".to_string()))
}

/// First ERROR or MISSING node in document order.
pub fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

/// `path` relative to `root`, `/`-separated; the full path when outside it.
pub fn relative_display(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => {
            let parts: Vec<_> = rel
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy()),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                ".".to_string()
            } else {
                parts.join("/")
            }
        }
        Err(_) => path.display().to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
