//! Application error types and user-facing error formatting.
//!
//! Provides structured error types for the engine:
//! - [`ParseError`] for the grammar-parsed extractor (callers skip the file)
//! - [`SearchError`] for reference-scan setup failures
//! - [`RippleError`] as the unified top-level error type
//!
//! Absence of results is never an error: an unknown symbol yields an empty
//! result. Only malformed requests, such as a file-mode impact query on a
//! path outside the file set, surface as [`RippleError`].

use thiserror::Error;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Process exit codes.
///
/// * `0` - success
/// * `1` - general runtime error
/// * `2` - usage / argument error (bad CLI invocation)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

// ---------------------------------------------------------------------------
// Layer-specific error types
// ---------------------------------------------------------------------------

/// Errors from the grammar-parsed extractor.
///
/// The heuristic extractors never fail; they degrade to fewer symbols.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The source contains a syntax error.
    #[error("{path}:{line}: syntax error")]
    Syntax { path: String, line: usize },

    /// The bundled grammar could not be loaded into the parser.
    #[error("failed to load grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    /// The parser gave up without producing a tree.
    #[error("{path}: parser produced no syntax tree")]
    NoTree { path: String },
}

/// Errors arising while preparing a reference scan.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The matcher for a symbol name could not be built.
    #[error("search failed: {0}")]
    SearchFailed(String),
}

// ---------------------------------------------------------------------------
// Unified application error
// ---------------------------------------------------------------------------

/// Unified error type for the entire application.
#[derive(Error, Debug)]
pub enum RippleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// A file-mode impact target that is not part of the indexed file set.
    #[error("file is not indexed: {0}")]
    TargetFileNotIndexed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A usage / argument error (exit code 2).
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RippleError {
    /// Return the appropriate process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RippleError::Usage(_) => EXIT_USAGE,
            _ => EXIT_ERROR,
        }
    }

    /// Return an optional human-readable hint that may help the user fix
    /// the problem.  Returns `None` when no specific guidance applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            RippleError::TargetFileNotIndexed(_) => Some(
                "pass the path relative to --root; ignored, oversized and unsupported files are not indexed",
            ),
            RippleError::Parse(ParseError::Syntax { .. }) => {
                Some("fix the syntax error or query a different file")
            }
            RippleError::Search(SearchError::SearchFailed(_)) => {
                Some("check the symbol name for unusual characters")
            }
            RippleError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Some("verify the file or directory exists")
            }
            RippleError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Some("check file permissions")
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_usage() {
        let err = RippleError::Usage("bad flag".into());
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn exit_code_general() {
        let err = RippleError::TargetFileNotIndexed("src/a.ts".into());
        assert_eq!(err.exit_code(), EXIT_ERROR);
    }

    #[test]
    fn hint_not_indexed() {
        let err = RippleError::TargetFileNotIndexed("src/a.ts".into());
        assert!(err.hint().unwrap().contains("--root"));
    }

    #[test]
    fn hint_syntax_error() {
        let err = RippleError::Parse(ParseError::Syntax {
            path: "main.go".into(),
            line: 3,
        });
        assert!(err.hint().unwrap().contains("syntax"));
    }

    #[test]
    fn hint_io_not_found() {
        let err = RippleError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(err.hint().unwrap().contains("exists"));
    }

    #[test]
    fn hint_none_for_other() {
        let err = RippleError::Other(anyhow::anyhow!("something went wrong"));
        assert!(err.hint().is_none());
    }

    #[test]
    fn display_no_debug_formatting() {
        let err = RippleError::TargetFileNotIndexed("lib/x.py".into());
        let msg = format!("{err}");
        assert_eq!(msg, "file is not indexed: lib/x.py");
        assert!(!msg.contains("TargetFileNotIndexed"));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::Syntax {
            path: "a.go".into(),
            line: 12,
        };
        assert_eq!(format!("{err}"), "a.go:12: syntax error");
    }

    #[test]
    fn search_error_display() {
        let err = SearchError::SearchFailed("bad pattern".to_string());
        assert_eq!(format!("{err}"), "search failed: bad pattern");
    }

    #[test]
    fn ripple_error_from_parse_error() {
        let err: RippleError = ParseError::NoTree { path: "a.go".into() }.into();
        assert!(matches!(err, RippleError::Parse(ParseError::NoTree { .. })));
    }

    #[test]
    fn ripple_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RippleError = io_err.into();
        assert!(matches!(err, RippleError::Io(_)));
    }
}
