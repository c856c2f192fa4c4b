//! Classification error taxonomy

use std::fmt;
use thiserror::Error;

/// Transport failure detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Request exceeded the configured timeout
    Timeout,
    /// Could not connect or the connection dropped
    Connection,
    /// Backend asked us to slow down (HTTP 429)
    RateLimited,
    /// Backend failed (HTTP 5xx)
    Server(u16),
    /// Backend refused the request (non-auth HTTP 4xx)
    Rejected(u16),
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Timeout => f.write_str("timeout"),
            TransportKind::Connection => f.write_str("connection"),
            TransportKind::RateLimited => f.write_str("rate limited"),
            TransportKind::Server(status) => write!(f, "server error {status}"),
            TransportKind::Rejected(status) => write!(f, "rejected {status}"),
        }
    }
}

/// Errors raised while classifying a note
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    /// Bad or missing credential, invalid provider selection, auth refused
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network-level failure talking to the backend
    #[error("Transport error ({kind}): {message}")]
    Transport {
        /// What went wrong
        kind: TransportKind,
        /// Backend or client message
        message: String,
    },

    /// Response did not match the strict result schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// Cache store could not be read or written
    #[error("Cache I/O error: {0}")]
    CacheIo(String),
}

/// Result type for classification operations
pub type ClassifyResult<T> = Result<T, ClassifyError>;

impl ClassifyError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a transport error
    pub fn transport(kind: TransportKind, msg: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: msg.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::transport(TransportKind::Timeout, msg)
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a cache I/O error
    pub fn cache_io(msg: impl Into<String>) -> Self {
        Self::CacheIo(msg.into())
    }

    /// Check if another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { kind, .. } => !matches!(kind, TransportKind::Rejected(_)),
            Self::Parse(_) => true,
            Self::Configuration(_) | Self::CacheIo(_) => false,
        }
    }

    /// Check if this error is fatal (not retryable)
    pub fn is_fatal(&self) -> bool {
        !self.is_retryable()
    }

    /// Check if this is a parse failure
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Get error category for logs and reports
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Transport { .. } => "transport",
            Self::Parse(_) => "parse",
            Self::CacheIo(_) => "cache_io",
        }
    }
}
