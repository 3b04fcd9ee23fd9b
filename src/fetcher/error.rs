//! Per-URL failure taxonomy
//!
//! These are data, not control flow: a failed fetch or extraction produces an
//! `ErrorKind` that is stored in the session while the batch keeps going.

use serde::Serialize;
use thiserror::Error;

/// Why a single URL failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed URL or DNS failure. Never retried.
    #[error("Could not resolve URL: {message}")]
    Resolution { message: String },

    /// The request exceeded its timeout. Retryable.
    #[error("Request timed out")]
    Timeout,

    /// Connection refused or reset, or the body was cut off. Retryable.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// HTTP 4xx other than 429. Never retried.
    #[error("HTTP client error {status}")]
    Client { status: u16 },

    /// HTTP 5xx or 429. Retryable.
    #[error("HTTP {status} from server")]
    ServerOrThrottle { status: u16 },

    /// Redirect loops and other non-transient protocol failures. Never retried.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Every allowed attempt hit a retryable failure.
    #[error("Gave up after {attempts} attempts, last error: {last}")]
    RetryExhausted { attempts: u32, last: Box<ErrorKind> },

    /// The extractor returned an error or panicked.
    #[error("Extraction failed: {message}")]
    Extraction { message: String },

    /// The batch was cancelled before this URL finished.
    #[error("Cancelled before completion")]
    Cancelled,
}

impl ErrorKind {
    /// Maps a non-success HTTP status to its failure kind
    ///
    /// Returns None for statuses below 400.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            429 | 500..=599 => Some(Self::ServerOrThrottle { status }),
            400..=499 => Some(Self::Client { status }),
            _ => None,
        }
    }

    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Connection { .. } | Self::ServerOrThrottle { .. }
        )
    }

    /// Stable tag used in events and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resolution { .. } => "resolution",
            Self::Timeout => "timeout",
            Self::Connection { .. } => "connection",
            Self::Client { .. } => "client",
            Self::ServerOrThrottle { .. } => "server_or_throttle",
            Self::Protocol { .. } => "protocol",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::Extraction { .. } => "extraction",
            Self::Cancelled => "cancelled",
        }
    }

    /// HTTP status carried by this failure, looking through retry exhaustion
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status } | Self::ServerOrThrottle { status } => Some(*status),
            Self::RetryExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}
