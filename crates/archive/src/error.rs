use thiserror::Error;

/// Errors from Archive operations, independent of backend.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ArchiveError {
    /// Whether a caller may reasonably retry the operation that produced
    /// this error. Mirrors `StoreError::is_retryable`: connection hiccups
    /// and timeouts are retryable, a missing object or a malformed payload
    /// is a stable outcome retrying would not change.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_and_timeout_are_retryable() {
        assert!(ArchiveError::Connection("reset".into()).is_retryable());
        assert!(ArchiveError::Timeout(std::time::Duration::from_secs(5)).is_retryable());
    }

    #[test]
    fn not_found_and_serialization_are_not_retryable() {
        assert!(!ArchiveError::NotFound("k".into()).is_retryable());
        assert!(!ArchiveError::Serialization("bad json".into()).is_retryable());
    }
}
