//! Core infrastructure for movpkg.
//!
//! This crate provides the language-agnostic pieces of a relocation run:
//! - Patch IR for representing source edits (anchored, applied all-or-nothing)
//! - Error types and stable error codes
//! - JSON output types for CLI responses
//! - Text position utilities and unified diff generation

pub mod diff;
pub mod error;
pub mod output;
pub mod patch;
pub mod text;
pub mod types;
pub mod util;
