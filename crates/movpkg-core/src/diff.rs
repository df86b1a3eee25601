//! Unified diff generation.
//!
//! Hunks are whole-line and carry no context lines: each hunk covers the
//! lines touched by one cluster of edits, before and after. Edits whose lines
//! touch are merged into a single hunk.

use crate::patch::Span;
use crate::text::{line_end, line_start};

/// The edits made to one file, against its original text.
#[derive(Debug, Clone)]
pub struct FileChange<'a> {
    /// Workspace-relative path, used in the `---`/`+++` headers.
    pub path: &'a str,
    /// Original file content.
    pub original: &'a str,
    /// Replacements as (span in `original`, new text). Insertions use empty spans.
    pub edits: Vec<(Span, &'a str)>,
}

struct Hunk<'a> {
    start: usize,
    end: usize,
    edits: Vec<(Span, &'a str)>,
}

/// Generate a unified diff covering every file in `changes`.
///
/// Files are emitted in path order; files without edits are skipped.
pub fn generate_unified_diff(changes: &[FileChange<'_>]) -> String {
    let mut sorted: Vec<&FileChange<'_>> = changes.iter().filter(|c| !c.edits.is_empty()).collect();
    sorted.sort_by(|a, b| a.path.cmp(b.path));

    let mut diff = String::new();
    for change in sorted {
        diff.push_str(&format!("--- a/{}\n", change.path));
        diff.push_str(&format!("+++ b/{}\n", change.path));

        let mut delta: i64 = 0;
        for hunk in hunks(change) {
            let old = &change.original[hunk.start..hunk.end];
            let new = apply_relative(old, hunk.start, &hunk.edits);

            let old_lines: Vec<&str> = old.split('\n').collect();
            let new_lines: Vec<&str> = if new.is_empty() {
                Vec::new()
            } else {
                new.split('\n').collect()
            };

            let old_first = line_number(change.original, hunk.start);
            let new_first = old_first as i64 + delta;
            diff.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                old_first,
                old_lines.len(),
                new_first,
                new_lines.len()
            ));
            for line in &old_lines {
                diff.push_str(&format!("-{}\n", line));
            }
            for line in &new_lines {
                diff.push_str(&format!("+{}\n", line));
            }
            delta += new_lines.len() as i64 - old_lines.len() as i64;
        }
    }

    diff
}

fn hunks<'a>(change: &FileChange<'a>) -> Vec<Hunk<'a>> {
    let bytes = change.original.as_bytes();
    let mut edits = change.edits.clone();
    edits.sort_by_key(|(span, _)| (span.start, span.end));

    let mut hunks: Vec<Hunk<'a>> = Vec::new();
    for (span, text) in edits {
        let start = line_start(bytes, span.start as usize);
        // A span swallowing its trailing newline still ends on its own line.
        let last = if span.is_empty() {
            span.start
        } else {
            span.end - 1
        };
        let end = line_end(bytes, last as usize);
        match hunks.last_mut() {
            Some(last) if start <= last.end => {
                last.end = last.end.max(end);
                last.edits.push((span, text));
            }
            _ => hunks.push(Hunk {
                start,
                end,
                edits: vec![(span, text)],
            }),
        }
    }
    hunks
}

/// Apply sorted edits to `old`, a slice of the original starting at `base`.
fn apply_relative(old: &str, base: usize, edits: &[(Span, &str)]) -> String {
    let mut out = String::with_capacity(old.len());
    let mut cursor = 0;
    for (span, text) in edits {
        let start = span.start as usize - base;
        let end = (span.end as usize - base).min(old.len());
        if start >= cursor {
            out.push_str(&old[cursor..start]);
        }
        out.push_str(text);
        cursor = cursor.max(end);
    }
    out.push_str(&old[cursor.min(old.len())..]);
    out
}

fn line_number(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() + 1
}

// ============================================================================
// Tests
// ============================================================================
