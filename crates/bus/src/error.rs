use thiserror::Error;

/// Errors from Bus publish and rule-control operations, independent of
/// backend.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("publish rejected: {0}")]
    PublishRejected(String),

    #[error("unknown rule: {0}")]
    UnknownRule(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl BusError {
    /// Whether a caller may reasonably retry the operation that produced
    /// this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}
