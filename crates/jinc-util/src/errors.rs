use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all jinc operations.
#[derive(Debug, Error, Diagnostic)]
pub enum JincError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed project manifest (`Jinc.toml`).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Jinc.toml for syntax errors"))]
    Manifest { message: String },

    /// Persistent state could not be written or flushed.
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Another build holds the output location.
    #[error("Build output is locked by another process: {}", path.display())]
    #[diagnostic(help("Wait for the other build or `jinc watch` on this output to finish"))]
    Locked { path: PathBuf },

    /// An engine invariant does not hold; nothing was committed.
    #[error("Internal invariant violated: {message}")]
    Invariant { message: String },

    /// One or more sources failed to compile.
    #[error("Compilation failed: {message}")]
    Compilation { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type JincResult<T> = miette::Result<T>;
