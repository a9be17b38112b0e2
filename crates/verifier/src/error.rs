use evharness_archive::ArchiveError;
use evharness_core::HarnessError;
use evharness_store::StoreError;
use thiserror::Error;

/// Errors a `status` or `verify` invocation can produce.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("expectation file at {key} is not a JSON array: {message}")]
    MalformedScenario { key: String, message: String },
}
