use thiserror::Error;

/// Errors from Store operations, independent of backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("row not found: {0}")]
    NotFound(String),

    #[error("conditional write failed: {0}")]
    ConditionFailed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl StoreError {
    /// Whether a caller may reasonably retry the operation that produced
    /// this error. Connection hiccups and timeouts are; everything else
    /// (not-found, a failed condition, a serialization bug) is a stable
    /// outcome that retrying would not change.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}
