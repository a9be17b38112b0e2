use serde::{Deserialize, Serialize};

/// Status as reported by [`crate::Verifier::status`].
///
/// A superset of [`evharness_core::RunStatus`]'s pre-verdict values plus
/// `Unknown`, which is not itself a `RunMeta` status — it means no
/// `RunMeta` row exists for the run at all (never seeded, or expired).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatusView {
    Unknown,
    Running,
    Ready,
    Timeout,
}

impl std::fmt::Display for RunStatusView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Running => "running",
            Self::Ready => "ready",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Result of a `status` poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResult {
    pub status: RunStatusView,
    pub observed_count: i64,
    pub expected_count: i64,
}
