use evharness_archive::ArchiveError;
use evharness_bus::BusError;
use evharness_core::HarnessError;
use evharness_store::StoreError;
use thiserror::Error;

/// Errors a `seed` invocation can produce.
#[derive(Debug, Error)]
pub enum SeederError {
    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("bus error publishing event {index}: {source}")]
    Publish {
        index: usize,
        #[source]
        source: BusError,
    },

    #[error("scenario file at {key} is not a JSON array: {message}")]
    MalformedScenario { key: String, message: String },
}
