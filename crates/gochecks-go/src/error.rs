//! Errors raised while analyzing Go sources.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while analyzing a Go source tree.
#[derive(Debug, Error)]
pub enum GoError {
    /// IO error reading a file or directory.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A Go source file could not be parsed.
    #[error("{}:{line}:{column}: {message}", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Line of the first syntax error (1-indexed).
        line: usize,
        /// Column of the first syntax error (1-indexed).
        column: usize,
        /// Description of the error.
        message: String,
    },

    /// A `//go:build` line could not be parsed.
    #[error("{}: invalid //go:build line: {message}", path.display())]
    Constraint {
        /// File carrying the constraint.
        path: PathBuf,
        /// Description of the error.
        message: String,
    },

    /// The project path does not exist or is not a directory.
    #[error("project directory not found: {}", .0.display())]
    ProjectDir(PathBuf),

    /// Invalid exclude pattern.
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// The Go grammar could not be loaded into the parser.
    #[error("failed to load Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
}

impl GoError {
    /// Wraps an IO error with the path it concerns.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
