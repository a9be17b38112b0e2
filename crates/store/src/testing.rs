use chrono::Utc;
use evharness_core::{MissingStatus, Observation, ObservationStatus, RunMeta, RunStatus};

use crate::error::StoreError;
use crate::store::Store;

/// Runs the full Store conformance suite against a fresh backend instance.
///
/// Call this from a backend crate's own test module, e.g.
/// `store_conformance_tests(&MemoryStore::new()).await.unwrap()`.
///
/// # Errors
///
/// Returns the first conformance failure encountered.
pub async fn store_conformance_tests(store: &dyn Store) -> Result<(), StoreError> {
    test_get_missing_run(store).await?;
    test_put_and_get_run_meta(store).await?;
    test_transition_status_respects_from_set(store).await?;
    test_increment_observed_count_accumulates(store).await?;
    test_put_and_scan_observations_arrival_order(store).await?;
    test_redelivery_at_later_timestamp_is_a_distinct_row(store).await?;
    test_update_observation_overwrites(store).await?;
    test_missing_records_round_trip(store).await?;
    Ok(())
}

fn sample_meta(run_id: &str) -> RunMeta {
    let now = Utc::now();
    RunMeta::new_running(run_id, "svc", now, chrono::Duration::minutes(15))
}

async fn test_get_missing_run(store: &dyn Store) -> Result<(), StoreError> {
    let meta = store.get_run_meta("does-not-exist").await?;
    assert!(meta.is_none(), "unknown run should read back as None");
    Ok(())
}

async fn test_put_and_get_run_meta(store: &dyn Store) -> Result<(), StoreError> {
    let meta = sample_meta("it-put-get");
    store.put_run_meta(&meta).await?;
    let fetched = store.get_run_meta("it-put-get").await?.expect("just written");
    assert_eq!(fetched.run_id, meta.run_id);
    assert_eq!(fetched.status, RunStatus::Running);
    Ok(())
}

async fn test_transition_status_respects_from_set(store: &dyn Store) -> Result<(), StoreError> {
    let meta = sample_meta("it-transition");
    store.put_run_meta(&meta).await?;

    let wrong_from = store
        .transition_status("it-transition", &[RunStatus::Ready], RunStatus::Passed)
        .await?;
    assert!(!wrong_from, "transition should refuse a non-matching from-set");

    let applied = store
        .transition_status("it-transition", &[RunStatus::Running], RunStatus::Ready)
        .await?;
    assert!(applied, "transition should apply when current status is in from-set");

    let fetched = store
        .get_run_meta("it-transition")
        .await?
        .expect("row exists");
    assert_eq!(fetched.status, RunStatus::Ready);

    let repeat = store
        .transition_status("it-transition", &[RunStatus::Running], RunStatus::Ready)
        .await?;
    assert!(!repeat, "transition should not re-apply once status has moved on");
    Ok(())
}

async fn test_increment_observed_count_accumulates(store: &dyn Store) -> Result<(), StoreError> {
    let meta = sample_meta("it-counter");
    store.put_run_meta(&meta).await?;

    let first = store.increment_observed_count("it-counter", 1).await?;
    assert_eq!(first, 1);
    let second = store.increment_observed_count("it-counter", 1).await?;
    assert_eq!(second, 2);
    Ok(())
}

async fn test_put_and_scan_observations_arrival_order(store: &dyn Store) -> Result<(), StoreError> {
    let run_id = "it-observations";
    store.put_run_meta(&sample_meta(run_id)).await?;

    let earlier = Observation::new("evt-1", "svc.a", "Created", Utc::now(), "hash1", None);
    let later = Observation::new(
        "evt-2",
        "svc.a",
        "Created",
        Utc::now() + chrono::Duration::seconds(1),
        "hash2",
        None,
    );
    store.put_observation(run_id, &later).await?;
    store.put_observation(run_id, &earlier).await?;

    let scanned = store.scan_observations(run_id).await?;
    assert_eq!(scanned.len(), 2);
    assert_eq!(scanned[0].event_id, "evt-1", "scan should return arrival order");
    assert_eq!(scanned[1].event_id, "evt-2");
    Ok(())
}

async fn test_redelivery_at_later_timestamp_is_a_distinct_row(
    store: &dyn Store,
) -> Result<(), StoreError> {
    let run_id = "it-redelivery";
    store.put_run_meta(&sample_meta(run_id)).await?;

    let first_arrival = Utc::now();
    let original = Observation::new("evt-dup", "svc.a", "Created", first_arrival, "hash", None);
    let redelivered = Observation::new(
        "evt-dup",
        "svc.a",
        "Created",
        first_arrival + chrono::Duration::seconds(1),
        "hash",
        None,
    );
    store.put_observation(run_id, &original).await?;
    store.put_observation(run_id, &redelivered).await?;

    let scanned = store.scan_observations(run_id).await?;
    assert_eq!(
        scanned.len(),
        2,
        "a redelivery of the same event_id at a later timestamp must land on a distinct row"
    );
    Ok(())
}

async fn test_update_observation_overwrites(store: &dyn Store) -> Result<(), StoreError> {
    let run_id = "it-update-observation";
    store.put_run_meta(&sample_meta(run_id)).await?;

    let mut observation = Observation::new("evt-1", "svc.a", "Created", Utc::now(), "hash1", None);
    store.put_observation(run_id, &observation).await?;

    observation.status = ObservationStatus::Matched;
    observation.matched_expectation_index = Some(0);
    store.update_observation(run_id, &observation).await?;

    let scanned = store.scan_observations(run_id).await?;
    assert_eq!(scanned.len(), 1, "update should not create a second row");
    assert_eq!(scanned[0].status, ObservationStatus::Matched);
    assert_eq!(scanned[0].matched_expectation_index, Some(0));
    Ok(())
}

async fn test_missing_records_round_trip(store: &dyn Store) -> Result<(), StoreError> {
    use evharness_core::{Expectation, MissingRecord};

    let run_id = "it-missing";
    store.put_run_meta(&sample_meta(run_id)).await?;

    let expectation = Expectation {
        source: "svc.b".to_string(),
        detail_type: "Shipped".to_string(),
        detail: serde_json::json!({}),
        match_fields: vec![],
    };
    let record = MissingRecord {
        index: 0,
        source: expectation.source.clone(),
        detail_type: expectation.detail_type.clone(),
        expected_event: expectation,
        status: MissingStatus::Missed,
        verified_at: Utc::now(),
    };
    store.put_missing_record(run_id, &record).await?;

    let scanned = store.scan_missing_records(run_id).await?;
    assert_eq!(scanned.len(), 1);
    assert_eq!(scanned[0].index, 0);
    Ok(())
}
