//! Error types for depgraph operations.
//!
//! Errors are categorized into two main types:
//!
//! - **`Error`**: Failures that abort the current command or query
//! - **`ExtractionWarning`**: File-level problems that are collected but don't halt indexing
//!
//! ## Error Philosophy
//!
//! Indexing is "best effort":
//! - A single malformed or unreadable file never prevents indexing the rest
//! - Warnings are collected and reported, not thrown
//! - Only an unreadable project root, storage failures, or cancellation abort a build
//!
//! Queries are strict: an unknown file or a malformed range aborts that
//! query with a message naming the file or the offending input.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for depgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for depgraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The project root does not exist or cannot be read
    #[error("cannot scan {}: {source}", .root.display())]
    Scan {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The queried file is not part of the index
    #[error("file not in index: {} (re-run `depgraph index` if it was just added)", .0.display())]
    UnknownFile(PathBuf),

    /// The stored index is unreadable or from an incompatible version
    #[error("corrupt index at {}: {reason}", .path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    /// A line range is malformed or inverted
    #[error("invalid line range '{input}': {reason}")]
    InvalidRange { input: String, reason: String },

    /// The build was interrupted before every file was processed
    #[error("indexing cancelled")]
    Cancelled,

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal invariant violated (e.g., poisoned lock)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Every variant maps to a non-zero code; the specific values let
    /// scripts tell query mistakes apart from infrastructure failures.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidRange { .. } => 2,
            Self::UnknownFile(_) => 3,
            Self::CorruptIndex { .. } => 4,
            Self::Scan { .. } => 5,
            Self::Cancelled => 130,
            Self::Database(_) | Self::Io(_) | Self::Config(_) | Self::Internal(_) => 1,
        }
    }
}

/// A problem with one file encountered while indexing.
///
/// Warnings are collected into [`IndexStats`](crate::IndexStats) and the
/// build continues. Depending on the kind, the file contributes either
/// nothing or a partial extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionWarning {
    /// Path to the file (relative to the project root when known)
    pub path: PathBuf,
    /// Category of the problem
    pub kind: ExtractionWarningKind,
    /// Line where the problem was detected, if any
    pub line: Option<u32>,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{}:{line}: {} ({})",
                self.path.display(),
                self.message,
                self.kind
            ),
            None => write!(f, "{}: {} ({})", self.path.display(), self.message, self.kind),
        }
    }
}

impl std::error::Error for ExtractionWarning {}

/// Categorization of extraction warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionWarningKind {
    // === Whole file excluded ===
    /// Could not read the file from disk
    Unreadable,

    /// File content is not valid UTF-8
    Encoding,

    /// File exceeds the configured size limit
    TooLarge,

    // === Partial result kept ===
    /// A string literal or block comment runs to end of file
    UnterminatedLiteral,

    /// Braces do not balance
    UnbalancedBraces,
}

impl std::fmt::Display for ExtractionWarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable => write!(f, "unreadable"),
            Self::Encoding => write!(f, "encoding error"),
            Self::TooLarge => write!(f, "too large"),
            Self::UnterminatedLiteral => write!(f, "unterminated literal"),
            Self::UnbalancedBraces => write!(f, "unbalanced braces"),
        }
    }
}

impl ExtractionWarningKind {
    /// Returns `true` if the file contributes nothing to the index.
    #[must_use]
    pub fn excludes_file(&self) -> bool {
        matches!(self, Self::Unreadable | Self::Encoding | Self::TooLarge)
    }
}

impl ExtractionWarning {
    /// Create a new warning.
    #[must_use]
    pub fn new(
        path: PathBuf,
        kind: ExtractionWarningKind,
        line: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path,
            kind,
            line,
            message: message.into(),
        }
    }

    /// Create an unreadable-file warning.
    #[must_use]
    pub fn unreadable(path: PathBuf, error: &std::io::Error) -> Self {
        Self::new(path, ExtractionWarningKind::Unreadable, None, error.to_string())
    }

    /// Create an encoding warning.
    #[must_use]
    pub fn encoding(path: PathBuf) -> Self {
        Self::new(
            path,
            ExtractionWarningKind::Encoding,
            None,
            "file is not valid UTF-8",
        )
    }

    /// Create a size-limit warning.
    #[must_use]
    pub fn too_large(path: PathBuf, size: u64, limit: u64) -> Self {
        Self::new(
            path,
            ExtractionWarningKind::TooLarge,
            None,
            format!("{size} bytes exceeds limit of {limit} bytes"),
        )
    }
}
