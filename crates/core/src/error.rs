use thiserror::Error;

/// Errors that are intrinsic to the harness domain, independent of which
/// Store/Archive/Bus backend is in play.
///
/// Backend-specific errors (`StoreError`, `ArchiveError`, `BusError`) live in
/// their own crates and are folded into a worker's own error type instead of
/// here, to avoid a dependency cycle back into `evharness-core`.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Missing or unparseable process-wide configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied input was missing or malformed (unknown run, unknown
    /// action, non-array scenario file). Not retried.
    #[error("invalid input: {0}")]
    Input(String),

    /// An invariant the harness relies on was violated by the data it read
    /// back from the Store or Archive.
    #[error("inconsistent state: {0}")]
    Internal(String),
}
