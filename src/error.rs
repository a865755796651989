//! Error taxonomy for the injection pipeline.
//!
//! Every variant is scoped to a single file or a single language profile.
//! Batch drivers turn file-scoped errors into per-file outcomes and keep going.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which of a profile's queries failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    ExistingImports,
    EntryPoint,
    InsertionPriority,
    Preamble,
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QueryKind::ExistingImports => "existing-imports",
            QueryKind::EntryPoint => "entry-point",
            QueryKind::InsertionPriority => "insertion-priority",
            QueryKind::Preamble => "preamble",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum InjectError {
    /// No profile is registered for the requested language id.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The file does not conform to the claimed grammar.
    #[error("failed to parse {} as {language}: {message}", path.display())]
    Parse {
        path: PathBuf,
        language: String,
        message: String,
    },

    /// A profile's query string is malformed.
    #[error("invalid {kind} query for {language}: {source}")]
    QueryCompile {
        language: String,
        kind: QueryKind,
        #[source]
        source: tree_sitter::QueryError,
    },

    /// The grammar could not be loaded into a parser.
    #[error("incompatible grammar for {language}: {source}")]
    Grammar {
        language: String,
        #[source]
        source: tree_sitter::LanguageError,
    },

    /// Read, backup or write failure.
    #[error("{action} {}: {source}", path.display())]
    FileIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InjectError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        InjectError::FileIo {
            action,
            path: path.into(),
            source,
        }
    }

    /// Whether the error means "skip this file" rather than a hard failure.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            InjectError::UnsupportedLanguage(_) | InjectError::Parse { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, InjectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_classification() {
        assert!(InjectError::UnsupportedLanguage("cobol".into()).is_skip());
        assert!(InjectError::Parse {
            path: "a.go".into(),
            language: "go".into(),
            message: "syntax error".into(),
        }
        .is_skip());
        let io_err = InjectError::io(
            "failed to write",
            "a.go",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!io_err.is_skip());
        assert_eq!(io_err.to_string(), "failed to write a.go: denied");
    }
}
