//! Verification of rewritten sources before they are written.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tree_sitter::Parser;

use movpkg_core::output::Verification;

use crate::loader::{first_error, go_parser};

// ============================================================================
// Types
// ============================================================================

/// How rewritten files are checked before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// No verification.
    None,
    /// Re-parse every rewritten file.
    #[default]
    Syntax,
}

impl VerificationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMode::None => "none",
            VerificationMode::Syntax => "syntax",
        }
    }
}

/// Error from verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// A rewritten file does not parse.
    #[error("{file}:{line}:{col}: rewritten source does not parse")]
    Syntax { file: String, line: u32, col: u32 },

    #[error("failed to initialize Go parser: {0}")]
    Parser(String),
}

impl VerificationError {
    pub fn file(&self) -> Option<&str> {
        match self {
            VerificationError::Syntax { file, .. } => Some(file),
            VerificationError::Parser(_) => None,
        }
    }
}

// ============================================================================
// Syntax Verification
// ============================================================================

/// Re-parses rewritten sources.
pub struct SyntaxVerifier {
    parser: Parser,
    checked: u32,
}

impl SyntaxVerifier {
    pub fn new() -> Result<Self, VerificationError> {
        let parser = go_parser().map_err(|e| VerificationError::Parser(e.to_string()))?;
        Ok(SyntaxVerifier { parser, checked: 0 })
    }

    /// Fail if `bytes` does not parse as Go.
    pub fn check(&mut self, file: &str, bytes: &[u8]) -> Result<(), VerificationError> {
        let tree = self
            .parser
            .parse(bytes, None)
            .ok_or_else(|| VerificationError::Parser("parse did not complete".to_string()))?;
        self.checked += 1;
        if let Some(node) = first_error(tree.root_node()) {
            let pos = node.start_position();
            return Err(VerificationError::Syntax {
                file: file.to_string(),
                line: pos.row as u32 + 1,
                col: pos.column as u32 + 1,
            });
        }
        Ok(())
    }

    pub fn files_checked(&self) -> u32 {
        self.checked
    }
}

/// Verify `files` (path, new content) under `mode`.
pub fn verify_files<'f>(
    mode: VerificationMode,
    files: impl IntoIterator<Item = (&'f str, &'f [u8])>,
) -> Result<Verification, VerificationError> {
    match mode {
        VerificationMode::None => Ok(Verification::skipped()),
        VerificationMode::Syntax => {
            let mut verifier = SyntaxVerifier::new()?;
            for (file, bytes) in files {
                verifier.check(file, bytes)?;
            }
            Ok(Verification::passed(mode.as_str(), verifier.files_checked()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_sources_pass() {
        let files = [
            ("a.go", &b"package a\n\nvar x = 1\n"[..]),
            ("b.go", &b"package a\n\nimport \"fmt\"\n\nvar _ = fmt.Sprint\n"[..]),
        ];
        let result = verify_files(VerificationMode::Syntax, files).unwrap();
        assert_eq!(result.status, "passed");
        assert_eq!(result.mode, "syntax");
        assert_eq!(result.files_checked, 2);
    }

    #[test]
    fn broken_source_reports_position() {
        let files = [("a.go", &b"package a\n\nvar x models.\n"[..])];
        let err = verify_files(VerificationMode::Syntax, files).unwrap_err();
        match err {
            VerificationError::Syntax { file, line, .. } => {
                assert_eq!(file, "a.go");
                assert!(line >= 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn none_mode_skips() {
        let files = [("a.go", &b"not go"[..])];
        let result = verify_files(VerificationMode::None, files).unwrap();
        assert_eq!(result.status, "skipped");
        assert_eq!(result.files_checked, 0);
    }

    #[test]
    fn mode_names() {
        assert_eq!(VerificationMode::default(), VerificationMode::Syntax);
        assert_eq!(VerificationMode::None.as_str(), "none");
        assert_eq!(serde_json::to_string(&VerificationMode::Syntax).unwrap(), "\"syntax\"");
    }
}
