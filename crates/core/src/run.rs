use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a test run: `"it-" + UUIDv4`.
pub type RunId = String;

/// Lifecycle status of a test run.
///
/// Monotone along `Running -> {Ready, Timeout} -> {Passed, Failed}`. No
/// transition ever moves backward; see `evharness-store`'s `transition_status`
/// for the conditional-write that enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Ready,
    Timeout,
    Passed,
    Failed,
}

impl RunStatus {
    /// Whether this status is terminal from the status-poll loop's
    /// perspective (`Ready` and `Timeout` both stop polling, even though
    /// `Ready`/`Timeout` are themselves followed by `Passed`/`Failed` once
    /// verify runs).
    #[must_use]
    pub fn is_poll_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Timeout)
    }

    /// Whether this status is a final verdict.
    #[must_use]
    pub fn is_verdict(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Ready => "ready",
            Self::Timeout => "timeout",
            Self::Passed => "passed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One row per run, `sort = "run#meta"`.
///
/// Created by the Seeder; mutated by the Collector (atomic counter
/// increment) and by the Verifier (status transitions). Lives until TTL
/// expiry (typically 2x `timeout_at`), enforced by the Store backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: RunId,
    pub service_name: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub timeout_at: DateTime<Utc>,
    pub observed_count: i64,
    pub verified_at: Option<DateTime<Utc>>,
    pub report_location: Option<String>,
}

impl RunMeta {
    /// Construct a freshly-seeded run: `status = Running`, `observed_count = 0`.
    #[must_use]
    pub fn new_running(
        run_id: impl Into<RunId>,
        service_name: impl Into<String>,
        started_at: DateTime<Utc>,
        timeout: chrono::Duration,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            service_name: service_name.into(),
            status: RunStatus::Running,
            started_at,
            timeout_at: started_at + timeout,
            observed_count: 0,
            verified_at: None,
            report_location: None,
        }
    }
}
