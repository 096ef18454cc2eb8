//! Error types for the settlers_io crate.

use settlers_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Rkyv error: {0}")]
    Rkyv(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Record written by a newer (or unknown) format revision.
    #[error("Unsupported {kind} schema version {found} (supported: {supported})")]
    UnsupportedVersion {
        kind: &'static str,
        found: u32,
        supported: u32,
    },

    /// The decoded genome does not fit the network topology.
    #[error("Invalid genome: {0}")]
    Genome(#[from] CoreError),

    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<IoError>,
    },
}

/// Result type alias for settlers_io operations.
pub type Result<T> = std::result::Result<T, IoError>;

impl IoError {
    #[must_use]
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    #[must_use]
    pub fn rkyv<S: Into<String>>(msg: S) -> Self {
        Self::Rkyv(msg.into())
    }

    #[must_use]
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Self::Compression(msg.into())
    }

    #[must_use]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Wraps an error with the operation that produced it.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping context wrappers.
    #[must_use]
    pub fn root(&self) -> &IoError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}
