use serde::{Deserialize, Serialize};

/// Why an envelope was not turned into an Observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// `detail` carried no `testRunId` — this is not a test event.
    NoTestRunId,
    /// `detail.testRunId` named a run with no `RunMeta` row, so it is
    /// either unknown or has already expired.
    UnknownRun,
}

/// Outcome of one [`crate::Collector::handle`] invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CollectResponse {
    Ignored {
        reason: IgnoreReason,
    },
    Collected {
        run_id: String,
        event_id: String,
        archived: bool,
        observed_count: i64,
    },
}
