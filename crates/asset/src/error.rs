//! Error taxonomy for asset ingestion.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("truncated data: expected {expected} bytes, found {found}")]
    TruncatedData { expected: usize, found: usize },

    /// A post-condition of a pure computation failed. Always fatal.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
