//! Go language support for movpkg.
//!
//! The relocation pipeline, leaves first:
//! - [`files`]: module discovery, package directories and patterns
//! - [`loader`]: parsing (tree-sitter-go) and package variants
//! - [`resolve`]: lexical resolution of every identifier use
//! - [`catalog`]: which type declarations get relocated
//! - [`registry`]: one entry per involved file
//! - [`rewrite`]: reference replacement
//! - [`imports`]: import reconciliation
//! - [`writer`] and [`verification`]: serialization, checks and persistence
//! - [`ops::relocate`]: the orchestrating operation

pub mod catalog;
mod error_bridges;
pub mod files;
pub mod imports;
pub mod loader;
pub mod ops;
pub mod registry;
pub mod resolve;
pub mod rewrite;
pub mod verification;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
