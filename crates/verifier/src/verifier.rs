use std::sync::Arc;

use chrono::Utc;
use evharness_archive::keys::scenario_expectations_key;
use evharness_archive::Archive;
use evharness_core::{
    matches_expected_detail, Expectation, HarnessError, MissingRecord, MissingStatus, Observation,
    ObservationStatus, RunStatus,
};
use evharness_store::Store;
use tracing::{info, instrument, warn};

use crate::error::VerifierError;
use crate::status::{RunStatusView, StatusResult};
use crate::verify::VerifyResult;

/// Computes run readiness (`status` mode) and reconciles observations
/// against expectations (`verify` mode).
///
/// Both modes read the same `RunMeta`/Observation rows the Seeder and
/// Collector wrote, but only `verify` mutates Observations — `status` only
/// ever moves `RunMeta.status` forward along
/// `Running -> {Ready, Timeout}`.
pub struct Verifier {
    store: Arc<dyn Store>,
    archive: Arc<dyn Archive>,
}

impl Verifier {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, archive: Arc<dyn Archive>) -> Self {
        Self { store, archive }
    }

    /// Reports whether a run is ready for `verify`, has timed out, or is
    /// still running, self-healing `RunMeta.status` forward as it goes.
    ///
    /// Once a run has already been marked `Timeout`, every subsequent call
    /// keeps reporting `Timeout` without re-deriving anything from the
    /// current observation count — `Timeout` is as terminal to this method
    /// as `Ready` is, so neither branch below it is re-examined (see
    /// DESIGN.md). Evaluating the conditions fresh on every call would let
    /// a run that already timed out flip back to `Ready` on a later slow
    /// poll, defeating the timeout-wins tie-break's own intent.
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn status(&self, run_id: &str) -> Result<StatusResult, VerifierError> {
        let Some(meta) = self.store.get_run_meta(run_id).await? else {
            return Ok(StatusResult {
                status: RunStatusView::Unknown,
                observed_count: 0,
                expected_count: 0,
            });
        };

        let expected_count = self.load_expectations(&meta.service_name).await?.len() as i64;
        let observed_count = self.store.scan_observations(run_id).await?.len() as i64;

        if meta.status == RunStatus::Timeout {
            return Ok(StatusResult {
                status: RunStatusView::Timeout,
                observed_count,
                expected_count,
            });
        }

        if Utc::now() >= meta.timeout_at {
            self.store
                .transition_status(run_id, &[RunStatus::Running, RunStatus::Ready], RunStatus::Timeout)
                .await?;
            warn!(run_id = %run_id, "run timed out");
            return Ok(StatusResult {
                status: RunStatusView::Timeout,
                observed_count,
                expected_count,
            });
        }

        if meta.status == RunStatus::Ready {
            return Ok(StatusResult {
                status: RunStatusView::Ready,
                observed_count,
                expected_count,
            });
        }

        if expected_count > 0 && observed_count >= expected_count {
            self.store
                .transition_status(run_id, &[RunStatus::Running], RunStatus::Ready)
                .await?;
            info!(run_id = %run_id, "run ready for verification");
            return Ok(StatusResult {
                status: RunStatusView::Ready,
                observed_count,
                expected_count,
            });
        }

        Ok(StatusResult {
            status: RunStatusView::Running,
            observed_count,
            expected_count,
        })
    }

    /// Matches expectations against observations and writes the verdict.
    ///
    /// Expects `RunMeta` to already exist (the external driver only calls
    /// `verify` once `status` has reported `Ready` or `Timeout`); a missing
    /// row is an input error rather than an `Unknown` result, since calling
    /// `verify` on a run that was never seeded is a caller bug, not a race
    /// the harness needs to tolerate quietly the way `status` does.
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn verify(&self, run_id: &str) -> Result<VerifyResult, VerifierError> {
        let meta = self.store.get_run_meta(run_id).await?.ok_or_else(|| {
            VerifierError::Harness(HarnessError::Input(format!("no such run: {run_id}")))
        })?;

        let expectations = self.load_expectations(&meta.service_name).await?;
        let observations = self.store.scan_observations(run_id).await?;
        let now = Utc::now();

        let mut claimed = vec![false; observations.len()];
        let mut matched_count = 0usize;
        let mut missing_count = 0usize;

        for (index, expectation) in expectations.iter().enumerate() {
            let candidate = self.find_match(&observations, &claimed, expectation).await;
            match candidate {
                Some(obs_index) => {
                    claimed[obs_index] = true;
                    let mut updated = observations[obs_index].clone();
                    updated.status = ObservationStatus::Matched;
                    updated.matched_expectation_index = Some(index);
                    updated.verified_at = Some(now);
                    updated.expected_event = Some(expectation.clone());
                    self.store.update_observation(run_id, &updated).await?;
                    matched_count += 1;
                }
                None => {
                    let record = MissingRecord {
                        index,
                        source: expectation.source.clone(),
                        detail_type: expectation.detail_type.clone(),
                        expected_event: expectation.clone(),
                        status: MissingStatus::Missed,
                        verified_at: now,
                    };
                    self.store.put_missing_record(run_id, &record).await?;
                    missing_count += 1;
                }
            }
        }

        let mut unexpected_count = 0usize;
        for (obs_index, observation) in observations.iter().enumerate() {
            if claimed[obs_index] {
                continue;
            }
            let mut updated = observation.clone();
            updated.status = ObservationStatus::Unexpected;
            updated.verified_at = Some(now);
            self.store.update_observation(run_id, &updated).await?;
            unexpected_count += 1;
        }

        let run_status = if meta.status == RunStatus::Timeout {
            RunStatus::Failed
        } else if missing_count > 0 || unexpected_count > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        };

        self.store.finalize_run(run_id, run_status, now, None).await?;
        info!(
            run_id = %run_id,
            run_status = %run_status,
            matched_count,
            missing_count,
            unexpected_count,
            "verify complete"
        );

        Ok(VerifyResult {
            run_status,
            matched_count,
            missing_count,
            unexpected_count,
            total_expected: expectations.len(),
        })
    }

    /// Finds the first unclaimed observation (in arrival order, since
    /// `scan_observations` returns sort-key order) matching `expectation`'s
    /// `source`/`detail_type` and, if an archived body is available, whose
    /// match-field values equal the expectation's. An observation whose
    /// archive write failed (`archive_key = None`, or the body is no longer
    /// readable) fails open: source/detail-type equality alone is enough to
    /// claim it, since there is no body left to compare fields against.
    async fn find_match(
        &self,
        observations: &[Observation],
        claimed: &[bool],
        expectation: &Expectation,
    ) -> Option<usize> {
        for (obs_index, observation) in observations.iter().enumerate() {
            if claimed[obs_index] {
                continue;
            }
            if observation.source != expectation.source || observation.detail_type != expectation.detail_type {
                continue;
            }
            let is_match = match self.candidate_detail(observation).await {
                Some(detail) => {
                    // Match fields are dot-paths rooted at the envelope (e.g.
                    // "detail.jobId"), matching the scenario file convention,
                    // so both sides are wrapped back under a `detail` key
                    // before the path walk.
                    let expected_envelope = serde_json::json!({"detail": expectation.detail});
                    let candidate_envelope = serde_json::json!({"detail": detail});
                    matches_expected_detail(&expected_envelope, &candidate_envelope, &expectation.match_fields)
                }
                None => true,
            };
            if is_match {
                return Some(obs_index);
            }
        }
        None
    }

    async fn candidate_detail(&self, observation: &Observation) -> Option<serde_json::Value> {
        let key = observation.archive_key.as_ref()?;
        let body = match self.archive.get(key).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                warn!(key = %key, "archived envelope missing, failing open on match fields");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read archived envelope, failing open on match fields");
                return None;
            }
        };
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(envelope) => envelope.get("detail").cloned(),
            Err(e) => {
                warn!(key = %key, error = %e, "archived envelope is not valid JSON, failing open on match fields");
                None
            }
        }
    }

    async fn load_expectations(&self, service_name: &str) -> Result<Vec<Expectation>, VerifierError> {
        let key = scenario_expectations_key(service_name);
        let body = self.archive.get(&key).await?.ok_or_else(|| {
            VerifierError::Harness(HarnessError::Input(format!("missing expectation file {key}")))
        })?;
        serde_json::from_slice(&body).map_err(|e| VerifierError::MalformedScenario {
            key,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use evharness_archive_memory::MemoryArchive;
    use evharness_core::RunMeta;
    use evharness_store_memory::MemoryStore;
    use serde_json::json;

    use super::*;

    async fn put_expectations(archive: &MemoryArchive, service_name: &str, expectations: serde_json::Value) {
        archive
            .put(
                &scenario_expectations_key(service_name),
                Some("application/json"),
                Bytes::from(expectations.to_string()),
            )
            .await
            .unwrap();
    }

    async fn archive_envelope(
        archive: &MemoryArchive,
        run_id: &str,
        event_id: &str,
        source: &str,
        detail_type: &str,
        detail: serde_json::Value,
    ) -> String {
        let received_at = Utc::now();
        let key = evharness_archive::keys::raw_event_key(run_id, received_at, event_id);
        let envelope = json!({
            "id": event_id,
            "source": source,
            "detail-type": detail_type,
            "detail": detail,
        });
        archive
            .put(&key, Some("application/json"), Bytes::from(envelope.to_string()))
            .await
            .unwrap();
        key
    }

    async fn seed_run(store: &MemoryStore, run_id: &str, service_name: &str, timeout: chrono::Duration) {
        store
            .put_run_meta(&RunMeta::new_running(run_id, service_name, Utc::now(), timeout))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn status_is_unknown_when_run_meta_absent() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        let verifier = Verifier::new(store, archive);

        let result = verifier.status("nope").await.unwrap();
        assert_eq!(result.status, RunStatusView::Unknown);
    }

    #[tokio::test]
    async fn status_is_running_when_below_expected_count() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-1", "svc", chrono::Duration::minutes(15)).await;
        put_expectations(&archive, "svc", json!([{"source": "a", "detail-type": "T", "detail": {}}])).await;

        let verifier = Verifier::new(store, archive);
        let result = verifier.status("it-1").await.unwrap();
        assert_eq!(result.status, RunStatusView::Running);
        assert_eq!(result.expected_count, 1);
        assert_eq!(result.observed_count, 0);
    }

    #[tokio::test]
    async fn status_becomes_ready_when_observed_meets_expected() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-2", "svc", chrono::Duration::minutes(15)).await;
        put_expectations(&archive, "svc", json!([{"source": "a", "detail-type": "T", "detail": {}}])).await;
        store
            .put_observation(
                "it-2",
                &Observation::new("evt-1", "a", "T", Utc::now(), "hash", None),
            )
            .await
            .unwrap();

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.status("it-2").await.unwrap();
        assert_eq!(result.status, RunStatusView::Ready);

        let meta = store.get_run_meta("it-2").await.unwrap().unwrap();
        assert_eq!(meta.status, RunStatus::Ready);
    }

    #[tokio::test]
    async fn status_times_out_even_with_zero_expectations() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-3", "svc", chrono::Duration::seconds(-1)).await;
        put_expectations(&archive, "svc", json!([])).await;

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.status("it-3").await.unwrap();
        assert_eq!(result.status, RunStatusView::Timeout);

        let meta = store.get_run_meta("it-3").await.unwrap().unwrap();
        assert_eq!(meta.status, RunStatus::Timeout);
    }

    #[tokio::test]
    async fn status_timeout_wins_when_both_conditions_hold() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-4", "svc", chrono::Duration::seconds(-1)).await;
        put_expectations(&archive, "svc", json!([{"source": "a", "detail-type": "T", "detail": {}}])).await;
        store
            .put_observation(
                "it-4",
                &Observation::new("evt-1", "a", "T", Utc::now(), "hash", None),
            )
            .await
            .unwrap();

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.status("it-4").await.unwrap();
        assert_eq!(result.status, RunStatusView::Timeout, "timeout must dominate ready");
    }

    #[tokio::test]
    async fn status_keeps_reporting_timeout_on_repeat_polls() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-5", "svc", chrono::Duration::seconds(-1)).await;
        put_expectations(&archive, "svc", json!([])).await;

        let verifier = Verifier::new(store, archive);
        let first = verifier.status("it-5").await.unwrap();
        let second = verifier.status("it-5").await.unwrap();
        assert_eq!(first.status, RunStatusView::Timeout);
        assert_eq!(second.status, RunStatusView::Timeout);
    }

    #[tokio::test]
    async fn verify_happy_path_two_events() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-happy", "svc", chrono::Duration::minutes(15)).await;
        put_expectations(
            &archive,
            "svc",
            json!([
                {"source": "svc.a", "detail-type": "Started", "detail": {"jobId": "J1"}, "__match": {"fields": ["detail.jobId"]}},
                {"source": "svc.a", "detail-type": "Completed", "detail": {"jobId": "J1"}, "__match": {"fields": ["detail.jobId"]}},
            ]),
        )
        .await;

        for (event_id, detail_type) in [("evt-1", "Started"), ("evt-2", "Completed")] {
            let key = archive_envelope(&archive, "it-happy", event_id, "svc.a", detail_type, json!({"jobId": "J1"})).await;
            store
                .put_observation(
                    "it-happy",
                    &Observation::new(event_id, "svc.a", detail_type, Utc::now(), "hash", Some(key)),
                )
                .await
                .unwrap();
        }

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.verify("it-happy").await.unwrap();
        assert_eq!(result.run_status, RunStatus::Passed);
        assert_eq!(result.matched_count, 2);
        assert_eq!(result.missing_count, 0);
        assert_eq!(result.unexpected_count, 0);
        assert_eq!(result.total_expected, 2);

        let meta = store.get_run_meta("it-happy").await.unwrap().unwrap();
        assert_eq!(meta.status, RunStatus::Passed);
        assert!(meta.verified_at.is_some());
    }

    #[tokio::test]
    async fn verify_missing_event_yields_failed_with_missing_record() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-missing", "svc", chrono::Duration::minutes(15)).await;
        put_expectations(
            &archive,
            "svc",
            json!([
                {"source": "svc.a", "detail-type": "Started", "detail": {}},
                {"source": "svc.a", "detail-type": "Completed", "detail": {}},
            ]),
        )
        .await;
        let key = archive_envelope(&archive, "it-missing", "evt-1", "svc.a", "Started", json!({})).await;
        store
            .put_observation(
                "it-missing",
                &Observation::new("evt-1", "svc.a", "Started", Utc::now(), "hash", Some(key)),
            )
            .await
            .unwrap();

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.verify("it-missing").await.unwrap();
        assert_eq!(result.run_status, RunStatus::Failed);
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.missing_count, 1);
        assert_eq!(result.unexpected_count, 0);

        let missing = store.scan_missing_records("it-missing").await.unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].index, 1);
    }

    #[tokio::test]
    async fn verify_duplicate_delivery_marks_extra_copy_unexpected() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-dup", "svc", chrono::Duration::minutes(15)).await;
        put_expectations(
            &archive,
            "svc",
            json!([{"source": "svc.a", "detail-type": "Started", "detail": {}}]),
        )
        .await;

        for event_id in ["evt-1", "evt-1-redelivered"] {
            let key = archive_envelope(&archive, "it-dup", event_id, "svc.a", "Started", json!({})).await;
            store
                .put_observation(
                    "it-dup",
                    &Observation::new(event_id, "svc.a", "Started", Utc::now(), "hash", Some(key)),
                )
                .await
                .unwrap();
        }

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.verify("it-dup").await.unwrap();
        assert_eq!(result.run_status, RunStatus::Failed);
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.missing_count, 0);
        assert_eq!(result.unexpected_count, 1, "the redelivered copy must be unexpected");
    }

    #[tokio::test]
    async fn verify_match_field_mismatch_yields_missing_and_unexpected() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-mismatch", "svc", chrono::Duration::minutes(15)).await;
        put_expectations(
            &archive,
            "svc",
            json!([{"source": "svc.a", "detail-type": "Started", "detail": {"jobId": "J1"}, "__match": {"fields": ["detail.jobId"]}}]),
        )
        .await;
        let key = archive_envelope(&archive, "it-mismatch", "evt-1", "svc.a", "Started", json!({"jobId": "J2"})).await;
        store
            .put_observation(
                "it-mismatch",
                &Observation::new("evt-1", "svc.a", "Started", Utc::now(), "hash", Some(key)),
            )
            .await
            .unwrap();

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.verify("it-mismatch").await.unwrap();
        assert_eq!(result.run_status, RunStatus::Failed);
        assert_eq!(result.matched_count, 0);
        assert_eq!(result.missing_count, 1);
        assert_eq!(result.unexpected_count, 1);
    }

    #[tokio::test]
    async fn verify_timeout_dominates_even_when_everything_matched() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        let run_id = "it-timeout-verify";
        store
            .put_run_meta(&RunMeta {
                status: RunStatus::Timeout,
                ..RunMeta::new_running(run_id, "svc", Utc::now(), chrono::Duration::minutes(15))
            })
            .await
            .unwrap();
        put_expectations(
            &archive,
            "svc",
            json!([{"source": "svc.a", "detail-type": "Started", "detail": {}}]),
        )
        .await;
        let key = archive_envelope(&archive, run_id, "evt-1", "svc.a", "Started", json!({})).await;
        store
            .put_observation(
                run_id,
                &Observation::new("evt-1", "svc.a", "Started", Utc::now(), "hash", Some(key)),
            )
            .await
            .unwrap();

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.verify(run_id).await.unwrap();
        assert_eq!(result.run_status, RunStatus::Failed, "timeout must dominate a clean match");
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.missing_count, 0);
        assert_eq!(result.unexpected_count, 0);
    }

    #[tokio::test]
    async fn verify_zero_expectations_passes_iff_zero_observations() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-zero", "svc", chrono::Duration::minutes(15)).await;
        put_expectations(&archive, "svc", json!([])).await;

        let verifier = Verifier::new(store.clone(), archive.clone());
        let result = verifier.verify("it-zero").await.unwrap();
        assert_eq!(result.run_status, RunStatus::Passed);

        seed_run(&store, "it-zero-stray", "svc", chrono::Duration::minutes(15)).await;
        let key = archive_envelope(&archive, "it-zero-stray", "evt-1", "svc.a", "Stray", json!({})).await;
        store
            .put_observation(
                "it-zero-stray",
                &Observation::new("evt-1", "svc.a", "Stray", Utc::now(), "hash", Some(key)),
            )
            .await
            .unwrap();
        let verifier = Verifier::new(store, archive);
        let stray_result = verifier.verify("it-zero-stray").await.unwrap();
        assert_eq!(stray_result.run_status, RunStatus::Failed);
        assert_eq!(stray_result.unexpected_count, 1);
    }

    #[tokio::test]
    async fn verify_missing_archived_body_fails_open_on_match_fields() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-fail-open", "svc", chrono::Duration::minutes(15)).await;
        put_expectations(
            &archive,
            "svc",
            json!([{"source": "svc.a", "detail-type": "Started", "detail": {"jobId": "J1"}, "__match": {"fields": ["detail.jobId"]}}]),
        )
        .await;
        // archive_key is None: the Collector's archive write failed.
        store
            .put_observation(
                "it-fail-open",
                &Observation::new("evt-1", "svc.a", "Started", Utc::now(), "hash", None),
            )
            .await
            .unwrap();

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.verify("it-fail-open").await.unwrap();
        assert_eq!(result.matched_count, 1, "an observation with no archived body should match anyway");
        assert_eq!(result.run_status, RunStatus::Passed);
    }

    #[tokio::test]
    async fn verify_greedy_match_gives_earlier_expectation_the_earlier_arrival() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_run(&store, "it-collision", "svc", chrono::Duration::minutes(15)).await;
        // Two expectations with identical match fields; the earlier
        // declared one must claim the earlier arrival.
        put_expectations(
            &archive,
            "svc",
            json!([
                {"source": "svc.a", "detail-type": "Started", "detail": {"jobId": "J1"}, "__match": {"fields": ["detail.jobId"]}},
                {"source": "svc.a", "detail-type": "Started", "detail": {"jobId": "J1"}, "__match": {"fields": ["detail.jobId"]}},
            ]),
        )
        .await;

        let first_arrival = Utc::now();
        let second_arrival = first_arrival + chrono::Duration::seconds(1);
        let key_a = archive_envelope(&archive, "it-collision", "evt-a", "svc.a", "Started", json!({"jobId": "J1"})).await;
        let key_b = archive_envelope(&archive, "it-collision", "evt-b", "svc.a", "Started", json!({"jobId": "J1"})).await;
        store
            .put_observation(
                "it-collision",
                &Observation::new("evt-a", "svc.a", "Started", first_arrival, "hash", Some(key_a)),
            )
            .await
            .unwrap();
        store
            .put_observation(
                "it-collision",
                &Observation::new("evt-b", "svc.a", "Started", second_arrival, "hash", Some(key_b)),
            )
            .await
            .unwrap();

        let verifier = Verifier::new(store.clone(), archive);
        let result = verifier.verify("it-collision").await.unwrap();
        assert_eq!(result.matched_count, 2);
        assert_eq!(result.run_status, RunStatus::Passed);

        let observations = store.scan_observations("it-collision").await.unwrap();
        let evt_a = observations.iter().find(|o| o.event_id == "evt-a").unwrap();
        let evt_b = observations.iter().find(|o| o.event_id == "evt-b").unwrap();
        assert_eq!(evt_a.matched_expectation_index, Some(0));
        assert_eq!(evt_b.matched_expectation_index, Some(1));
    }
}
