use evharness_archive::ArchiveError;
use evharness_core::HarnessError;
use evharness_store::StoreError;
use thiserror::Error;

/// Errors a `generate` invocation can produce.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
}
