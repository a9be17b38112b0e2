use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use evharness_core::{MissingRecord, Observation, RunMeta, RunStatus};
use evharness_store::error::StoreError;
use evharness_store::key::event_sort;
use evharness_store::store::Store;

/// In-memory [`Store`] backed by [`DashMap`]s keyed by `run_id`.
///
/// Observations and missing records for a run are kept in arrival-inserted
/// `Vec`s behind an `RwLock`; `scan_observations` re-sorts by
/// `(received_at, event_id)` rather than relying on insertion order, so a
/// racing pair of collector writes still reads back in the same order a
/// sort-key range scan on a real backend would produce. Rows are identified
/// by their full sort key (millisecond + `event_id`), not by `event_id`
/// alone, so a redelivered event at a later timestamp inserts a second row
/// rather than overwriting the first — matching a real composite-key
/// backend, where the sort key is literally part of the row's identity.
#[derive(Default)]
pub struct MemoryStore {
    runs: DashMap<String, RunMeta>,
    observations: DashMap<String, RwLock<Vec<Observation>>>,
    missing: DashMap<String, RwLock<Vec<MissingRecord>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("runs", &self.runs.len())
            .field("observations", &self.observations.len())
            .field("missing", &self.missing.len())
            .finish()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_run_meta(&self, meta: &RunMeta) -> Result<(), StoreError> {
        self.runs.insert(meta.run_id.clone(), meta.clone());
        Ok(())
    }

    async fn get_run_meta(&self, run_id: &str) -> Result<Option<RunMeta>, StoreError> {
        Ok(self.runs.get(run_id).map(|entry| entry.clone()))
    }

    async fn transition_status(
        &self,
        run_id: &str,
        from: &[RunStatus],
        to: RunStatus,
    ) -> Result<bool, StoreError> {
        let Some(mut entry) = self.runs.get_mut(run_id) else {
            return Err(StoreError::NotFound(run_id.to_string()));
        };
        if from.contains(&entry.status) {
            entry.status = to;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn finalize_run(
        &self,
        run_id: &str,
        status: RunStatus,
        verified_at: DateTime<Utc>,
        report_location: Option<String>,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))?;
        entry.status = status;
        entry.verified_at = Some(verified_at);
        entry.report_location = report_location;
        Ok(())
    }

    async fn increment_observed_count(&self, run_id: &str, delta: i64) -> Result<i64, StoreError> {
        let mut entry = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))?;
        entry.observed_count += delta;
        Ok(entry.observed_count)
    }

    async fn put_observation(&self, run_id: &str, observation: &Observation) -> Result<(), StoreError> {
        let bucket = self.observations.entry(run_id.to_string()).or_default();
        let mut rows = bucket
            .write()
            .map_err(|_| StoreError::Backend("observation lock poisoned".into()))?;
        let sort_key = event_sort(observation.received_at.timestamp_millis(), &observation.event_id);
        if let Some(existing) = rows
            .iter_mut()
            .find(|o| event_sort(o.received_at.timestamp_millis(), &o.event_id) == sort_key)
        {
            *existing = observation.clone();
        } else {
            rows.push(observation.clone());
        }
        Ok(())
    }

    async fn update_observation(
        &self,
        run_id: &str,
        observation: &Observation,
    ) -> Result<(), StoreError> {
        self.put_observation(run_id, observation).await
    }

    async fn scan_observations(&self, run_id: &str) -> Result<Vec<Observation>, StoreError> {
        let Some(bucket) = self.observations.get(run_id) else {
            return Ok(Vec::new());
        };
        let rows = bucket
            .read()
            .map_err(|_| StoreError::Backend("observation lock poisoned".into()))?;
        let mut sorted = rows.clone();
        sorted.sort_by(|a, b| {
            a.received_at
                .cmp(&b.received_at)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        Ok(sorted)
    }

    async fn put_missing_record(&self, run_id: &str, record: &MissingRecord) -> Result<(), StoreError> {
        let bucket = self.missing.entry(run_id.to_string()).or_default();
        let mut rows = bucket
            .write()
            .map_err(|_| StoreError::Backend("missing-record lock poisoned".into()))?;
        if let Some(existing) = rows.iter_mut().find(|r| r.index == record.index) {
            *existing = record.clone();
        } else {
            rows.push(record.clone());
        }
        Ok(())
    }

    async fn scan_missing_records(&self, run_id: &str) -> Result<Vec<MissingRecord>, StoreError> {
        let Some(bucket) = self.missing.get(run_id) else {
            return Ok(Vec::new());
        };
        let rows = bucket
            .read()
            .map_err(|_| StoreError::Backend("missing-record lock poisoned".into()))?;
        let mut sorted = rows.clone();
        sorted.sort_by_key(|r| r.index);
        Ok(sorted)
    }
}
