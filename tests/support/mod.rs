//! Shared test support utilities.
//!
//! Integration tests build throwaway Go modules on disk and run relocations
//! against them, either through the library or the `mov-pkg` binary.

pub mod workspace;
