//! Go module and package directory discovery.
//!
//! Finds the enclosing module (`go.mod`), enumerates package directories the
//! way the go tool does, and matches them against `go list` style patterns.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

// ============================================================================
// Error Types
// ============================================================================

/// Error type for module and file discovery.
#[derive(Debug, Error)]
pub enum FileError {
    /// No `go.mod` at or above the start directory.
    #[error("no go.mod found at or above {start}")]
    NoModule { start: String },

    /// `go.mod` exists but declares no module path.
    #[error("{path} has no module directive")]
    MissingModuleDirective { path: String },

    /// A package pattern could not be interpreted.
    #[error("invalid package pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

// ============================================================================
// Module Discovery
// ============================================================================

/// A Go module: its root directory and declared module path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    /// Directory containing `go.mod`.
    pub root: PathBuf,
    /// Module path from the `module` directive.
    pub path: String,
}

impl GoModule {
    /// Find the module enclosing `start` by walking up to the nearest `go.mod`.
    pub fn discover(start: &Path) -> FileResult<Self> {
        let start = if start.is_absolute() {
            normalize_path(start)
        } else {
            normalize_path(&std::env::current_dir()?.join(start))
        };

        for dir in start.ancestors() {
            let gomod = dir.join("go.mod");
            if gomod.is_file() {
                let content = fs::read_to_string(&gomod)?;
                let path = parse_module_directive(&content).ok_or_else(|| {
                    FileError::MissingModuleDirective {
                        path: gomod.display().to_string(),
                    }
                })?;
                return Ok(GoModule {
                    root: dir.to_path_buf(),
                    path,
                });
            }
        }

        Err(FileError::NoModule {
            start: start.display().to_string(),
        })
    }

    /// Import path of a directory inside this module.
    pub fn import_path_for(&self, dir: &Path) -> Option<String> {
        let rel = dir.strip_prefix(&self.root).ok()?;
        let mut path = self.path.clone();
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    path.push('/');
                    path.push_str(&part.to_string_lossy());
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }

    /// Directory of an import path inside this module.
    pub fn dir_for(&self, import_path: &str) -> Option<PathBuf> {
        if import_path == self.path {
            return Some(self.root.clone());
        }
        let rest = import_path.strip_prefix(&self.path)?.strip_prefix('/')?;
        Some(rest.split('/').fold(self.root.clone(), |dir, part| dir.join(part)))
    }

    /// Whether an import path belongs to this module.
    pub fn contains(&self, import_path: &str) -> bool {
        import_path == self.path
            || import_path
                .strip_prefix(&self.path)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Extract the module path from `go.mod` content.
pub fn parse_module_directive(gomod: &str) -> Option<String> {
    for line in gomod.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        if !rest.starts_with([' ', '\t']) {
            continue;
        }
        let value = rest.trim().trim_matches(|c| c == '"' || c == '`');
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

// ============================================================================
// Package Directories
// ============================================================================

/// A directory holding the `.go` files of one package (and its tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDir {
    /// Absolute directory path.
    pub dir: PathBuf,
    /// Import path of the package.
    pub import_path: String,
    /// `.go` files in the directory, sorted by name.
    pub files: Vec<PathBuf>,
}

/// Enumerate every package directory of a module, sorted by import path.
///
/// Skips `vendor`, `testdata`, directories starting with `.` or `_`, and
/// nested modules.
pub fn collect_package_dirs(module: &GoModule) -> FileResult<Vec<PackageDir>> {
    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

    let walker = WalkDir::new(&module.root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

    for entry in walker {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| io::Error::other("directory walk failed"))
        })?;
        if !entry.file_type().is_file() || !is_go_source(entry.path()) {
            continue;
        }
        if let Some(parent) = entry.path().parent() {
            by_dir
                .entry(parent.to_path_buf())
                .or_default()
                .push(entry.path().to_path_buf());
        }
    }

    let mut dirs: Vec<PackageDir> = by_dir
        .into_iter()
        .filter_map(|(dir, files)| {
            let import_path = module.import_path_for(&dir)?;
            Some(PackageDir {
                dir,
                import_path,
                files,
            })
        })
        .collect();
    dirs.sort_by(|a, b| a.import_path.cmp(&b.import_path));
    Ok(dirs)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.')
        || name.starts_with('_')
        || name == "testdata"
        || name == "vendor"
        || entry.path().join("go.mod").exists()
}

/// Whether a path names a Go source file the go tool would consider.
pub fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    name.ends_with(".go") && !name.starts_with('.') && !name.starts_with('_')
}

/// Whether a file is a test file (`_test.go`).
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().ends_with("_test.go"))
}

/// Whether a file opts out of every build with an `ignore` constraint.
///
/// Only the header before the package clause is consulted.
pub fn is_build_ignored(source: &str) -> bool {
    for line in source.lines() {
        let line = line.trim();
        if line.starts_with("package ") {
            break;
        }
        if line == "//go:build ignore" || line.starts_with("// +build ignore") {
            return true;
        }
    }
    false
}

// ============================================================================
// Package Patterns
// ============================================================================

/// A `go list` style package pattern compiled to a regex over import paths.
#[derive(Debug, Clone)]
pub struct PackagePattern {
    raw: String,
    regex: Regex,
}

impl PackagePattern {
    /// Compile a pattern. Relative patterns (`.`, `./x`, `../x/...`) are
    /// resolved against `cwd` and must fall inside `module`.
    pub fn parse(pattern: &str, module: &GoModule, cwd: &Path) -> FileResult<Self> {
        let import_pattern = if is_relative_pattern(pattern) {
            let (dir_part, recursive) = match pattern.strip_suffix("/...") {
                Some(prefix) => (prefix, true),
                None => (pattern, false),
            };
            let dir = normalize_path(&cwd.join(dir_part));
            let base = module
                .import_path_for(&dir)
                .ok_or_else(|| FileError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: format!("directory {} is outside module {}", dir.display(), module.path),
                })?;
            if recursive {
                format!("{}/...", base)
            } else {
                base
            }
        } else {
            pattern.to_string()
        };

        let mut re = regex::escape(&import_pattern).replace(r"\.\.\.", ".*");
        if let Some(prefix) = re.strip_suffix("/.*") {
            re = format!("{}(/.*)?", prefix);
        }
        let regex = Regex::new(&format!("^{}$", re)).map_err(|e| FileError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(PackagePattern {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Whether an import path matches this pattern.
    pub fn matches(&self, import_path: &str) -> bool {
        self.regex.is_match(import_path)
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn is_relative_pattern(pattern: &str) -> bool {
    pattern == "."
        || pattern == ".."
        || pattern.starts_with("./")
        || pattern.starts_with("../")
        || Path::new(pattern).is_absolute()
}

/// Lexically normalize a path, resolving `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
