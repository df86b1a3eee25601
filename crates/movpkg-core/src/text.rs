//! Text position utilities for byte offsets, lines and columns.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count bytes, not characters

use crate::patch::Span;

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds content length, returns the position at end of content.
pub fn byte_offset_to_position(content: &[u8], offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for &byte in &content[..offset] {
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Byte offset of the first byte of the line containing `offset`.
pub fn line_start(content: &[u8], offset: usize) -> usize {
    let offset = offset.min(content.len());
    content[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1)
}

/// Byte offset of the newline ending the line containing `offset`, or the
/// content length when the line is the last one.
pub fn line_end(content: &[u8], offset: usize) -> usize {
    let offset = offset.min(content.len());
    content[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(content.len(), |i| offset + i)
}

/// The leading whitespace of the line containing `offset`.
pub fn line_indent(content: &str, offset: usize) -> &str {
    let start = line_start(content.as_bytes(), offset);
    let rest = &content[start..];
    let width = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    &rest[..width]
}

/// Widen `span` to whole lines when nothing but whitespace shares those lines
/// with it, swallowing the trailing newline. Otherwise returns `span` as is.
pub fn expand_to_lines(content: &[u8], span: Span) -> Span {
    let start = span.start as usize;
    let end = span.end as usize;
    let ls = line_start(content, start);
    let le = line_end(content, end);

    let blank = |bytes: &[u8]| bytes.iter().all(|b| b.is_ascii_whitespace());
    if blank(&content[ls..start]) && blank(&content[end..le]) {
        let stop = if le < content.len() { le + 1 } else { le };
        Span::new(ls as u64, stop as u64)
    } else {
        span
    }
}

// ============================================================================
// Tests
// ============================================================================
