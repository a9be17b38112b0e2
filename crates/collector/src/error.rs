use evharness_store::StoreError;
use thiserror::Error;

/// Errors a `handle` invocation can produce. Archive failures are
/// deliberately absent here — per the Collector's non-fatal archive-write
/// rule, they are logged and folded into [`crate::result::CollectResponse`]
/// as `archived: false` rather than surfaced as an error.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
