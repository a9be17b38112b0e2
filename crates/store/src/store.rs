use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evharness_core::{MissingRecord, Observation, RunMeta, RunStatus};

use crate::error::StoreError;

/// Composite partition/sort key-value store holding all harness state for a
/// run: its metadata row, its observation rows, and its missing-expectation
/// rows. See `key.rs` for the key layout.
///
/// Implementations must be `Send + Sync` and safe for concurrent access from
/// multiple workers polling and mutating the same run concurrently.
#[async_trait]
pub trait Store: Send + Sync {
    /// Create a run's metadata row. Called once, by the Seeder, at the end
    /// of a successful seed. Overwrites if the row already exists (callers
    /// never reuse a `run_id`, so this is not expected to race).
    async fn put_run_meta(&self, meta: &RunMeta) -> Result<(), StoreError>;

    /// Fetch a run's metadata row. `None` means the run either never existed
    /// or its seed failed before the row was written; callers treat both the
    /// same way.
    async fn get_run_meta(&self, run_id: &str) -> Result<Option<RunMeta>, StoreError>;

    /// Conditionally move a run's status forward. Succeeds (`true`) only if
    /// the row's current status is one of `from`; otherwise leaves the row
    /// untouched and returns `false`. This is how concurrent status polls on
    /// the same run avoid double-transitioning or moving status backward.
    async fn transition_status(
        &self,
        run_id: &str,
        from: &[RunStatus],
        to: RunStatus,
    ) -> Result<bool, StoreError>;

    /// Stamp the run's final verdict: status, `verified_at`, and the
    /// Archive location of the rendered report. Called once by the Verifier
    /// at the end of a `verify` pass; the Verifier owns all mutations past
    /// this point so no conditional check is needed here.
    async fn finalize_run(
        &self,
        run_id: &str,
        status: RunStatus,
        verified_at: DateTime<Utc>,
        report_location: Option<String>,
    ) -> Result<(), StoreError>;

    /// Atomically add `delta` to a run's `observed_count`, creating the
    /// counter at zero first if the row predates this call. Returns the
    /// value after the increment. Never a read-modify-write: backends
    /// implement this with their native atomic add primitive.
    async fn increment_observed_count(&self, run_id: &str, delta: i64) -> Result<i64, StoreError>;

    /// Append an observation row, keyed by its full sort key (arrival
    /// millisecond + `event_id`). A redelivery of the same `event_id` at a
    /// later millisecond is a distinct sort key and therefore a distinct
    /// row — this is deliberate: the harness defers de-duplication to
    /// `verify`, which resolves duplicates by making every extra copy
    /// `Unexpected`. Only a retry with the identical sort key (the Collector
    /// re-invoked for the exact same delivery attempt) overwrites in place.
    async fn put_observation(&self, run_id: &str, observation: &Observation) -> Result<(), StoreError>;

    /// Overwrite an observation row already written by `put_observation`.
    /// Used only by the Verifier to stamp match results.
    async fn update_observation(
        &self,
        run_id: &str,
        observation: &Observation,
    ) -> Result<(), StoreError>;

    /// List every observation row for a run, in sort-key (arrival) order.
    async fn scan_observations(&self, run_id: &str) -> Result<Vec<Observation>, StoreError>;

    /// Write a missing-expectation row for the expectation at `index`.
    async fn put_missing_record(&self, run_id: &str, record: &MissingRecord) -> Result<(), StoreError>;

    /// List every missing-expectation row for a run.
    async fn scan_missing_records(&self, run_id: &str) -> Result<Vec<MissingRecord>, StoreError>;
}
