//! Refactoring operations.
//!
//! There is one: [`relocate`], which moves references to a set of type
//! symbols from one package to another.

pub mod relocate;

pub use crate::verification::VerificationMode;
pub use relocate::{relocate, RelocateError, RelocateResult, RelocationRequest};
