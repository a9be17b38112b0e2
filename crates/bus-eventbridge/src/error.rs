use evharness_aws::SdkErrorClass;
use evharness_bus::error::BusError;

/// Map an AWS SDK error's `Display` output onto a [`BusError`].
pub fn map_sdk_error<E: std::fmt::Display>(err: E) -> BusError {
    let err_str = err.to_string();
    tracing::error!(error = %err_str, "EventBridge operation failed");
    match evharness_aws::classify_sdk_error(&err_str) {
        SdkErrorClass::Throttled | SdkErrorClass::Connection => BusError::Connection(err_str),
        SdkErrorClass::Timeout => BusError::Timeout(std::time::Duration::from_secs(30)),
        SdkErrorClass::Service => BusError::Backend(err_str),
    }
}
