/// Coarse classification of an AWS SDK error string, shared by the
/// `DynamoDB`/S3/`EventBridge` backend crates so each can map it onto its
/// own domain error type (`StoreError`, `ArchiveError`, `BusError`)
/// without duplicating the pattern matching three times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkErrorClass {
    /// The request was throttled by the AWS service.
    Throttled,
    /// The request timed out.
    Timeout,
    /// A network or connection error occurred communicating with AWS.
    Connection,
    /// Any other service-side error.
    Service,
}

/// Classify an AWS SDK error's `Display` output into an [`SdkErrorClass`].
#[must_use]
pub fn classify_sdk_error(error_str: &str) -> SdkErrorClass {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl") || lower.contains("rate exceed") || lower.contains("too many") {
        SdkErrorClass::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        SdkErrorClass::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        SdkErrorClass::Connection
    } else {
        SdkErrorClass::Service
    }
}
