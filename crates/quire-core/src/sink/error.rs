//! Sink and source error types

use thiserror::Error;

/// Sink operation errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Write operation failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Sink is closed and cannot accept writes
    #[error("Sink closed")]
    Closed,
}

/// Specialized Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

impl SinkError {
    /// Create a write failure error
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Get error category for logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::WriteFailed(_) => "write_failed",
            Self::Closed => "closed",
        }
    }
}

/// Note source errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// One record could not be turned into a note; reading continues
    #[error("Invalid note {id}: {message}")]
    InvalidNote {
        /// Identifier of the bad record, if known
        id: String,
        /// What is wrong with it
        message: String,
    },

    /// The source cannot continue
    #[error("Source read failed: {0}")]
    ReadFailed(String),
}

/// Specialized Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    /// Create an invalid note error
    pub fn invalid_note(id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidNote {
            id: id.into(),
            message: msg.into(),
        }
    }

    /// Whether reading can continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidNote { .. })
    }
}
