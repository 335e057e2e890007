//! Error types for transport operations

use std::time::Duration;
use thiserror::Error;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures surfaced by a publish/subscribe transport.
///
/// These never travel on the wire; clients surface them as local failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("No responders available for subject '{0}'")]
    NoResponders(String),

    #[error("Invalid subject: '{0}'")]
    InvalidSubject(String),

    #[error("Transport closed unexpectedly")]
    Closed,

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
