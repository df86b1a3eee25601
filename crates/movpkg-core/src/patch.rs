//! Patch IR: Edit, Anchor, PatchSet for atomic file rewrites.
//!
//! A relocation run never mutates syntax trees. Every change is recorded as an
//! anchored edit against the original bytes of a file and applied here:
//! - Anchored edits verified by content hash
//! - Conflict detection (overlapping spans, out-of-bounds anchors)
//! - Atomic apply semantics (all-or-nothing)
//! - Patch materialization for JSON output

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::text::byte_offset_to_position;

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Core Types
// ============================================================================

/// Stable file identifier within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new file ID.
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// Byte offsets into file content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: u64,
    /// End byte offset (exclusive).
    pub end: u64,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Create a span from a `usize` byte range, as produced by parsers.
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start as u64, range.end as u64)
    }

    /// An empty span at `offset`, used for insertions.
    pub fn point(offset: u64) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if a byte offset falls inside this span.
    pub fn contains_offset(&self, offset: u64) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Anchor Model
// ============================================================================

/// How an edit finds and validates its target location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    /// Exact span with hash verification.
    ///
    /// The edit only applies if the bytes at `span` hash to `expected_before_hash`.
    SpanExact {
        span: Span,
        expected_before_hash: ContentHash,
    },
}

impl Anchor {
    /// Create a SpanExact anchor over the bytes currently at `span`.
    pub fn span_exact(span: Span, content: &[u8]) -> Self {
        let start = (span.start as usize).min(content.len());
        let end = (span.end as usize).min(content.len());
        Anchor::SpanExact {
            span,
            expected_before_hash: ContentHash::compute(&content[start..end]),
        }
    }

    /// Get the span of this anchor.
    pub fn span(&self) -> Span {
        match self {
            Anchor::SpanExact { span, .. } => *span,
        }
    }

    /// Resolve this anchor against the given file content.
    pub fn resolve(&self, content: &[u8]) -> AnchorResolution {
        match self {
            Anchor::SpanExact {
                span,
                expected_before_hash,
            } => {
                if span.end as usize > content.len() {
                    return AnchorResolution::OutOfBounds {
                        span: *span,
                        file_len: content.len() as u64,
                    };
                }

                let slice = &content[span.start as usize..span.end as usize];
                let actual = ContentHash::compute(slice);
                if &actual != expected_before_hash {
                    return AnchorResolution::HashMismatch {
                        span: *span,
                        expected: expected_before_hash.clone(),
                        actual,
                    };
                }

                AnchorResolution::Resolved(*span)
            }
        }
    }
}

/// Outcome of resolving an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorResolution {
    /// Anchor resolved to this span.
    Resolved(Span),
    /// The bytes at the span changed since the anchor was created.
    HashMismatch {
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },
    /// The span extends past the end of the file.
    OutOfBounds { span: Span, file_len: u64 },
}

// ============================================================================
// Preconditions and Conflicts
// ============================================================================

/// Checks that must pass before any edit can apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precondition {
    /// Edits in a file must not overlap once ordered.
    NoOverlaps,
}

/// A detected overlap or invalidation that prevents apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conflict {
    /// Two edits have overlapping spans in the same file.
    OverlappingSpans {
        file_id: FileId,
        edit1_span: Span,
        edit2_span: Span,
    },

    /// Anchor hash mismatch.
    AnchorHashMismatch {
        file_id: FileId,
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },

    /// Span is out of bounds for the file.
    SpanOutOfBounds {
        file_id: FileId,
        span: Span,
        file_len: u64,
    },

    /// File not found in context.
    FileMissing { file_id: FileId },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::OverlappingSpans {
                edit1_span,
                edit2_span,
                ..
            } => write!(f, "edits {} and {} overlap", edit1_span, edit2_span),
            Conflict::AnchorHashMismatch { span, .. } => {
                write!(f, "content at {} changed since it was read", span)
            }
            Conflict::SpanOutOfBounds { span, file_len, .. } => {
                write!(f, "span {} is past end of file ({} bytes)", span, file_len)
            }
            Conflict::FileMissing { file_id } => write!(f, "{} has no content", file_id),
        }
    }
}

// ============================================================================
// Edit Operations
// ============================================================================

/// The kind of edit operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditKind {
    /// Insert text at `anchor.span.start`.
    Insert,
    /// Delete the bytes in `anchor.span`.
    Delete,
    /// Replace the bytes in `anchor.span` with new text.
    Replace,
}

/// Optional labels for provenance tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditLabels {
    /// The symbol this edit relates to.
    pub symbol: Option<String>,
    /// Human-readable reason for the edit.
    pub reason: Option<String>,
}

/// A single atomic text change anchored in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Stable identifier for ordering.
    pub id: u32,
    /// The file this edit applies to.
    pub file_id: FileId,
    /// The kind of operation.
    pub kind: EditKind,
    /// How to find/verify the target location.
    pub anchor: Anchor,
    /// The new text (empty for Delete).
    pub text: String,
    /// Optional provenance labels.
    pub labels: EditLabels,
}

impl Edit {
    /// Create an Insert edit.
    ///
    /// # Panics
    /// Panics if the anchor's span is not empty.
    pub fn insert(id: u32, file_id: FileId, anchor: Anchor, text: impl Into<String>) -> Self {
        let span = anchor.span();
        assert!(
            span.is_empty(),
            "Insert anchor span must be empty (start == end), got {:?}",
            span
        );
        Edit {
            id,
            file_id,
            kind: EditKind::Insert,
            anchor,
            text: text.into(),
            labels: EditLabels::default(),
        }
    }

    /// Create a Delete edit.
    ///
    /// # Panics
    /// Panics if the anchor's span is empty.
    pub fn delete(id: u32, file_id: FileId, anchor: Anchor) -> Self {
        let span = anchor.span();
        assert!(
            !span.is_empty(),
            "Delete anchor span must be non-empty (start != end), got {:?}",
            span
        );
        Edit {
            id,
            file_id,
            kind: EditKind::Delete,
            anchor,
            text: String::new(),
            labels: EditLabels::default(),
        }
    }

    /// Create a Replace edit.
    pub fn replace(id: u32, file_id: FileId, anchor: Anchor, text: impl Into<String>) -> Self {
        Edit {
            id,
            file_id,
            kind: EditKind::Replace,
            anchor,
            text: text.into(),
            labels: EditLabels::default(),
        }
    }

    /// Add labels to this edit.
    pub fn with_labels(mut self, labels: EditLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Get the anchor's span.
    pub fn span(&self) -> Span {
        self.anchor.span()
    }
}

// ============================================================================
// PatchSet
// ============================================================================

/// An ordered set of edits, applied atomically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchSet {
    /// Preconditions that must pass before applying.
    pub preconditions: Vec<Precondition>,

    /// The edits to apply.
    pub edits: Vec<Edit>,

    /// Mapping from FileId to file path (for materialization).
    pub file_paths: HashMap<FileId, String>,
}

impl PatchSet {
    /// Create a new empty PatchSet.
    pub fn new() -> Self {
        PatchSet::default()
    }

    /// Add a precondition.
    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    /// Add an edit.
    pub fn with_edit(mut self, edit: Edit) -> Self {
        self.edits.push(edit);
        self
    }

    /// Add several edits.
    pub fn with_edits(mut self, edits: impl IntoIterator<Item = Edit>) -> Self {
        self.edits.extend(edits);
        self
    }

    /// Register a file path mapping.
    pub fn with_file_path(mut self, file_id: FileId, path: impl Into<String>) -> Self {
        self.file_paths.insert(file_id, path.into());
        self
    }

    /// Sort edits in deterministic order: by file path, then by span start, then by edit ID.
    pub fn sort_edits(&mut self) {
        let paths = &self.file_paths;
        self.edits.sort_by(|a, b| {
            let path_a = paths.get(&a.file_id).map(String::as_str);
            let path_b = paths.get(&b.file_id).map(String::as_str);
            path_a
                .cmp(&path_b)
                .then_with(|| a.span().start.cmp(&b.span().start))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    /// Detect overlapping edits within this PatchSet.
    #[must_use]
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        let mut edits_by_file: BTreeMap<FileId, Vec<&Edit>> = BTreeMap::new();
        for edit in &self.edits {
            edits_by_file.entry(edit.file_id).or_default().push(edit);
        }

        for (file_id, edits) in edits_by_file {
            for i in 0..edits.len() {
                for j in (i + 1)..edits.len() {
                    let span_i = edits[i].span();
                    let span_j = edits[j].span();
                    // Two insertions at one point have no defined order.
                    let same_point = span_i.is_empty() && span_j == span_i;
                    if span_i.overlaps(&span_j) || same_point {
                        conflicts.push(Conflict::OverlappingSpans {
                            file_id,
                            edit1_span: span_i,
                            edit2_span: span_j,
                        });
                    }
                }
            }
        }

        conflicts
    }
}

// ============================================================================
// Atomic Apply
// ============================================================================

/// Result of attempting to apply a PatchSet.
#[derive(Debug, Clone)]
pub enum ApplyResult {
    /// All edits applied successfully.
    Success {
        /// The new content for each modified file.
        modified_files: HashMap<FileId, Vec<u8>>,
    },

    /// Apply failed due to conflicts or precondition failures.
    Failed {
        /// The conflicts/failures that prevented apply.
        conflicts: Vec<Conflict>,
    },
}

/// Context for applying a PatchSet.
#[derive(Debug, Default)]
pub struct ApplyContext {
    /// File contents, keyed by FileId.
    pub file_contents: HashMap<FileId, Vec<u8>>,
}

impl ApplyContext {
    /// Register a file's original content.
    pub fn with_file(mut self, file_id: FileId, content: impl Into<Vec<u8>>) -> Self {
        self.file_contents.insert(file_id, content.into());
        self
    }
}

impl PatchSet {
    /// Apply this PatchSet atomically.
    ///
    /// Either all edits apply, or none do. Edits are applied in reverse offset
    /// order within each file so earlier spans stay valid.
    #[must_use]
    pub fn apply(&self, ctx: &ApplyContext) -> ApplyResult {
        let mut conflicts = Vec::new();

        for precondition in &self.preconditions {
            match precondition {
                Precondition::NoOverlaps => {
                    conflicts.extend(self.detect_conflicts());
                }
            }
        }

        let mut edits_by_file: BTreeMap<FileId, Vec<(Span, &Edit)>> = BTreeMap::new();

        for edit in &self.edits {
            let Some(content) = ctx.file_contents.get(&edit.file_id) else {
                conflicts.push(Conflict::FileMissing {
                    file_id: edit.file_id,
                });
                continue;
            };

            match edit.anchor.resolve(content) {
                AnchorResolution::Resolved(span) => {
                    edits_by_file
                        .entry(edit.file_id)
                        .or_default()
                        .push((span, edit));
                }
                AnchorResolution::HashMismatch {
                    span,
                    expected,
                    actual,
                } => conflicts.push(Conflict::AnchorHashMismatch {
                    file_id: edit.file_id,
                    span,
                    expected,
                    actual,
                }),
                AnchorResolution::OutOfBounds { span, file_len } => {
                    conflicts.push(Conflict::SpanOutOfBounds {
                        file_id: edit.file_id,
                        span,
                        file_len,
                    })
                }
            }
        }

        if !conflicts.is_empty() {
            return ApplyResult::Failed { conflicts };
        }

        let mut modified_files = HashMap::new();

        for (file_id, mut file_edits) in edits_by_file {
            let Some(original) = ctx.file_contents.get(&file_id) else {
                continue;
            };
            let mut content = original.clone();

            file_edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));

            for (span, edit) in file_edits {
                let start = span.start as usize;
                let end = span.end as usize;

                match edit.kind {
                    EditKind::Insert => {
                        content.splice(start..start, edit.text.bytes());
                    }
                    EditKind::Delete => {
                        content.drain(start..end);
                    }
                    EditKind::Replace => {
                        content.splice(start..end, edit.text.bytes());
                    }
                }
            }

            modified_files.insert(file_id, content);
        }

        ApplyResult::Success { modified_files }
    }
}

// ============================================================================
// Patch Materialization
// ============================================================================

/// A single edit as it appears in output (for JSON serialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputEdit {
    /// Workspace-relative file path.
    pub file: String,
    /// Byte range being replaced.
    pub span: Span,
    /// Original text.
    pub old_text: String,
    /// Replacement text.
    pub new_text: String,
    /// 1-indexed line number (for display).
    pub line: u32,
    /// 1-indexed column (for display).
    pub col: u32,
}

/// Materialized patch output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializedPatch {
    /// Individual edits (ordered by file, then span.start).
    pub edits: Vec<OutputEdit>,
    /// Standard unified diff format.
    pub unified_diff: String,
}

impl PatchSet {
    /// Materialize the edits of this PatchSet to output form.
    ///
    /// The unified diff is produced separately (see [`crate::diff`]) since it
    /// needs whole-line context; `unified_diff` is left empty here.
    pub fn materialize(&self, file_contents: &HashMap<FileId, Vec<u8>>) -> MaterializedPatch {
        let mut sorted = self.clone();
        sorted.sort_edits();

        let edits = sorted
            .edits
            .iter()
            .map(|edit| {
                let file = self
                    .file_paths
                    .get(&edit.file_id)
                    .cloned()
                    .unwrap_or_else(|| edit.file_id.to_string());
                let span = edit.span();

                let (old_text, line, col) = match file_contents.get(&edit.file_id) {
                    Some(content) => {
                        let old = content
                            .get(span.start as usize..span.end as usize)
                            .unwrap_or_default();
                        let (line, col) = byte_offset_to_position(content, span.start as usize);
                        (String::from_utf8_lossy(old).into_owned(), line, col)
                    }
                    None => (String::new(), 1, 1),
                };

                let new_text = match edit.kind {
                    EditKind::Delete => String::new(),
                    _ => edit.text.clone(),
                };

                OutputEdit {
                    file,
                    span,
                    old_text,
                    new_text,
                    line,
                    col,
                }
            })
            .collect();

        MaterializedPatch {
            edits,
            unified_diff: String::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
