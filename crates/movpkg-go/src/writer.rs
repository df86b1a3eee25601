//! Serializing and persisting rewritten files.
//!
//! A file's new content is its original text with the entry's pending edits
//! applied through a [`PatchSet`], so overlapping edits are caught before
//! anything is written. Persisting goes through a temp file in the same
//! directory that is renamed over the original.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use movpkg_core::patch::{ApplyContext, ApplyResult, ContentHash, PatchSet, Precondition};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::registry::FileEntry;

/// Errors raised while serializing or persisting files.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The file's edits could not be applied together.
    #[error("{file}: conflicting edits: {}", conflicts.join("; "))]
    Conflict { file: String, conflicts: Vec<String> },

    /// The file changed on disk after it was loaded.
    #[error("{file} changed on disk since it was loaded")]
    Stale { file: String },

    #[error("failed to write {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    pub fn file(&self) -> &str {
        match self {
            WriteError::Conflict { file, .. } | WriteError::Stale { file } | WriteError::Io { file, .. } => file,
        }
    }
}

pub type WriteResult<T> = Result<T, WriteError>;

/// Turns file entries into bytes and stores them.
pub trait Writer {
    /// New content of `entry`.
    fn serialize(&self, entry: &FileEntry) -> WriteResult<Vec<u8>> {
        render(entry)
    }

    /// Fail if `entry`'s file no longer holds the content it was loaded from.
    fn check_unchanged(&self, entry: &FileEntry) -> WriteResult<()>;

    /// Store `bytes` as the content of `path`.
    fn persist(&mut self, path: &Path, bytes: &[u8]) -> WriteResult<()>;
}

/// Apply an entry's edits to its original text.
pub fn render(entry: &FileEntry) -> WriteResult<Vec<u8>> {
    let original = entry.text().as_bytes();
    if entry.edits.is_empty() {
        return Ok(original.to_vec());
    }

    let patch = PatchSet::new()
        .with_precondition(Precondition::NoOverlaps)
        .with_edits(entry.edits.iter().cloned())
        .with_file_path(entry.file_id, entry.rel_path());
    let ctx = ApplyContext::default().with_file(entry.file_id, original);

    match patch.apply(&ctx) {
        ApplyResult::Success { mut modified_files } => Ok(modified_files
            .remove(&entry.file_id)
            .unwrap_or_else(|| original.to_vec())),
        ApplyResult::Failed { conflicts } => Err(WriteError::Conflict {
            file: entry.rel_path().to_string(),
            conflicts: conflicts.iter().map(ToString::to_string).collect(),
        }),
    }
}

// ============================================================================
// FsWriter
// ============================================================================

/// Writes files in place, atomically per file.
#[derive(Debug, Default)]
pub struct FsWriter {
    written: Vec<PathBuf>,
}

impl FsWriter {
    pub fn new() -> Self {
        FsWriter::default()
    }

    /// Paths persisted so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl Writer for FsWriter {
    fn check_unchanged(&self, entry: &FileEntry) -> WriteResult<()> {
        let current = fs::read(&entry.path).map_err(|source| WriteError::Io {
            file: entry.rel_path().to_string(),
            source,
        })?;
        if ContentHash::compute(&current) != entry.source.hash {
            return Err(WriteError::Stale {
                file: entry.rel_path().to_string(),
            });
        }
        Ok(())
    }

    fn persist(&mut self, path: &Path, bytes: &[u8]) -> WriteResult<()> {
        let file = path.display().to_string();
        let io_err = |source: io::Error| WriteError::Io {
            file: file.clone(),
            source,
        };

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(io_err)?;
        }
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        debug!(file = %file, bytes = bytes.len(), "persisted file");
        self.written.push(path.to_path_buf());
        Ok(())
    }
}

// ============================================================================
// MemoryWriter
// ============================================================================

/// Collects writes in memory; nothing touches the disk.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    /// Persisted content, in write order.
    pub files: Vec<(PathBuf, Vec<u8>)>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        MemoryWriter::default()
    }

    /// Last content persisted for `path`.
    pub fn content(&self, path: &Path) -> Option<&[u8]> {
        self.files
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, bytes)| bytes.as_slice())
    }
}

impl Writer for MemoryWriter {
    fn check_unchanged(&self, _entry: &FileEntry) -> WriteResult<()> {
        Ok(())
    }

    fn persist(&mut self, path: &Path, bytes: &[u8]) -> WriteResult<()> {
        self.files.push((path.to_path_buf(), bytes.to_vec()));
        Ok(())
    }
}
