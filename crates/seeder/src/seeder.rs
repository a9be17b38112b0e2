use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use evharness_archive::keys::{scenario_events_key, scenario_expectations_key};
use evharness_archive::Archive;
use evharness_bus::{Bus, BusEventEntry};
use evharness_core::{HarnessError, RunMeta, ScenarioEvent};
use evharness_store::Store;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::SeederError;

/// How long a freshly-seeded run is given to observe its expected traffic
/// before the Verifier's status poll marks it `Timeout`.
const DEFAULT_RUN_TIMEOUT: chrono::Duration = chrono::Duration::minutes(15);

/// Pause between consecutive publishes, simulating realistic emission
/// pacing rather than bursting the whole scenario at once.
const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of a successful [`Seeder::seed`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResult {
    pub run_id: String,
    pub service_name: String,
    pub started_at: chrono::DateTime<Utc>,
    pub timeout_at: chrono::DateTime<Utc>,
}

/// Tunables for [`Seeder`], split out of the constructor so tests can shrink
/// the emit interval instead of waiting on real wall-clock sleeps.
#[derive(Debug, Clone, Copy)]
pub struct SeederConfig {
    pub run_timeout: chrono::Duration,
    pub emit_interval: Duration,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            run_timeout: DEFAULT_RUN_TIMEOUT,
            emit_interval: DEFAULT_EMIT_INTERVAL,
        }
    }
}

/// Starts test runs: resolves a scenario, publishes its events to the Bus in
/// order, and writes the run's `RunMeta` row once every event has gone out.
///
/// Generic over the three collaborating backends so the same code runs
/// against the in-memory triple in tests and the AWS-backed triple in
/// production — only the wiring differs, not this type.
pub struct Seeder {
    store: Arc<dyn Store>,
    archive: Arc<dyn Archive>,
    bus: Arc<dyn Bus>,
    config: SeederConfig,
}

impl Seeder {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, archive: Arc<dyn Archive>, bus: Arc<dyn Bus>) -> Self {
        Self::with_config(store, archive, bus, SeederConfig::default())
    }

    #[must_use]
    pub fn with_config(
        store: Arc<dyn Store>,
        archive: Arc<dyn Archive>,
        bus: Arc<dyn Bus>,
        config: SeederConfig,
    ) -> Self {
        Self {
            store,
            archive,
            bus,
            config,
        }
    }

    /// Start a run: resolve the scenario, publish its events, and write
    /// `RunMeta`. See the module docs for failure semantics — a scenario
    /// load failure or a mid-sequence publish failure aborts before
    /// `RunMeta` is written, so an absent `RunMeta` is never itself an error
    /// to a caller polling status on the returned `run_id`.
    #[instrument(skip(self), fields(run_id, service_name))]
    pub async fn seed(&self, service_name: Option<&str>) -> Result<SeedResult, SeederError> {
        let run_id = format!("it-{}", Uuid::new_v4());
        tracing::Span::current().record("run_id", run_id.as_str());

        let resolved_service = self.resolve_service_name(service_name).await?;
        tracing::Span::current().record("service_name", resolved_service.as_str());

        let events = self.load_events(&resolved_service).await?;
        info!(
            event_count = events.len(),
            service_name = %resolved_service,
            "publishing scenario events"
        );

        self.publish_all(&run_id, &resolved_service, &events).await?;

        let started_at = Utc::now();
        let meta = RunMeta::new_running(
            run_id.clone(),
            resolved_service.clone(),
            started_at,
            self.config.run_timeout,
        );
        self.store.put_run_meta(&meta).await?;

        info!(run_id = %run_id, timeout_at = %meta.timeout_at, "run seeded");
        Ok(SeedResult {
            run_id,
            service_name: resolved_service,
            started_at,
            timeout_at: meta.timeout_at,
        })
    }

    /// Lowercases the caller's requested service name (defaulting to
    /// `"all"` when none is given), falling back to `"all"` if the
    /// requested service has no scenario files, and failing if neither do.
    async fn resolve_service_name(&self, requested: Option<&str>) -> Result<String, SeederError> {
        let candidate = requested
            .map(str::to_lowercase)
            .unwrap_or_else(|| "all".to_string());

        if self.scenario_exists(&candidate).await? {
            return Ok(candidate);
        }

        if candidate != "all" && self.scenario_exists("all").await? {
            warn!(requested = %candidate, "no scenario for requested service, falling back to \"all\"");
            return Ok("all".to_string());
        }

        Err(SeederError::Harness(HarnessError::Input(format!(
            "no scenario found for service {candidate:?}, and no fallback \"all\" scenario exists"
        ))))
    }

    async fn scenario_exists(&self, service_name: &str) -> Result<bool, SeederError> {
        let events_present = self.archive.exists(&scenario_events_key(service_name)).await?;
        let expectations_present = self
            .archive
            .exists(&scenario_expectations_key(service_name))
            .await?;
        Ok(events_present && expectations_present)
    }

    async fn load_events(&self, service_name: &str) -> Result<Vec<ScenarioEvent>, SeederError> {
        let key = scenario_events_key(service_name);
        let body = self
            .archive
            .get(&key)
            .await?
            .ok_or_else(|| SeederError::Harness(HarnessError::Input(format!("missing scenario file {key}"))))?;
        serde_json::from_slice(&body).map_err(|e| SeederError::MalformedScenario {
            key,
            message: e.to_string(),
        })
    }

    /// Publishes every event in declared order, pausing
    /// `config.emit_interval` between consecutive publishes (not after the
    /// last one). Any publish failure aborts the remaining sequence; the
    /// caller is responsible for not writing `RunMeta` in that case.
    async fn publish_all(
        &self,
        run_id: &str,
        service_name: &str,
        events: &[ScenarioEvent],
    ) -> Result<(), SeederError> {
        for (index, event) in events.iter().enumerate() {
            let mut detail = event.detail.clone();
            if event.inject_test_id {
                inject_tracing_fields(&mut detail, run_id, service_name);
            }

            let entry = BusEventEntry {
                source: event.source.clone(),
                detail_type: event.detail_type.clone(),
                detail,
            };

            debug!(index, source = %entry.source, detail_type = %entry.detail_type, "publishing event");
            self.bus
                .publish(&entry)
                .await
                .map_err(|source| SeederError::Publish { index, source })?;

            if index + 1 < events.len() {
                tokio::time::sleep(self.config.emit_interval).await;
            }
        }
        Ok(())
    }
}

/// Stamps `testRunId`, `serviceName`, and `testMode = true` into an event's
/// detail body, creating the body as an object if it was not one already
/// (a scenario author who writes `"detail": {}` gets the common case; a
/// non-object detail is preserved untouched apart from the merge, which is
/// then a no-op since there is no object to insert keys into).
fn inject_tracing_fields(detail: &mut serde_json::Value, run_id: &str, service_name: &str) {
    if let serde_json::Value::Object(map) = detail {
        map.insert("testRunId".to_string(), serde_json::Value::String(run_id.to_string()));
        map.insert(
            "serviceName".to_string(),
            serde_json::Value::String(service_name.to_string()),
        );
        map.insert("testMode".to_string(), serde_json::Value::Bool(true));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use evharness_archive_memory::MemoryArchive;
    use evharness_bus::InMemoryBus;
    use evharness_core::RunStatus;
    use evharness_store_memory::MemoryStore;
    use serde_json::json;

    use super::*;

    fn fast_config() -> SeederConfig {
        SeederConfig {
            run_timeout: chrono::Duration::minutes(15),
            emit_interval: Duration::from_millis(1),
        }
    }

    async fn seed_scenario(
        archive: &MemoryArchive,
        service_name: &str,
        events: serde_json::Value,
        expectations: serde_json::Value,
    ) {
        archive
            .put(
                &scenario_events_key(service_name),
                Some("application/json"),
                Bytes::from(events.to_string()),
            )
            .await
            .unwrap();
        archive
            .put(
                &scenario_expectations_key(service_name),
                Some("application/json"),
                Bytes::from(expectations.to_string()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn seed_publishes_events_in_order_and_writes_run_meta() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        let bus = Arc::new(InMemoryBus::new());

        seed_scenario(
            &archive,
            "billing",
            json!([
                {"source": "svc.a", "detail-type": "Started", "detail": {"jobId": "J1"}},
                {"source": "svc.a", "detail-type": "Completed", "detail": {"jobId": "J1"}},
            ]),
            json!([]),
        )
        .await;

        let seeder = Seeder::with_config(
            store.clone(),
            archive.clone(),
            bus.clone() as Arc<dyn Bus>,
            fast_config(),
        );

        let result = seeder.seed(Some("Billing")).await.unwrap();
        assert_eq!(result.service_name, "billing");

        let published = bus.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].1.detail_type, "Started");
        assert_eq!(published[1].1.detail_type, "Completed");

        let meta = store.get_run_meta(&result.run_id).await.unwrap().unwrap();
        assert_eq!(meta.status, RunStatus::Running);
        assert_eq!(meta.observed_count, 0);
    }

    #[tokio::test]
    async fn seed_injects_tracing_fields_when_requested() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        let bus = Arc::new(InMemoryBus::new());

        seed_scenario(
            &archive,
            "all",
            json!([
                {"source": "svc.a", "detail-type": "Started", "detail": {}, "__injectTestId": true},
            ]),
            json!([]),
        )
        .await;

        let seeder = Seeder::with_config(store, archive, bus.clone() as Arc<dyn Bus>, fast_config());
        let result = seeder.seed(None).await.unwrap();

        let published = bus.published();
        let detail = &published[0].1.detail;
        assert_eq!(detail["testRunId"], json!(result.run_id));
        assert_eq!(detail["serviceName"], json!("all"));
        assert_eq!(detail["testMode"], json!(true));
    }

    #[tokio::test]
    async fn seed_falls_back_to_all_when_requested_service_missing() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        let bus = Arc::new(InMemoryBus::new());

        seed_scenario(&archive, "all", json!([]), json!([])).await;

        let seeder = Seeder::with_config(store, archive, bus as Arc<dyn Bus>, fast_config());
        let result = seeder.seed(Some("nonexistent")).await.unwrap();
        assert_eq!(result.service_name, "all");
    }

    #[tokio::test]
    async fn seed_fails_when_no_scenario_exists_at_all() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        let bus = Arc::new(InMemoryBus::new());

        let seeder = Seeder::with_config(store, archive, bus as Arc<dyn Bus>, fast_config());
        let result = seeder.seed(Some("nope")).await;
        assert!(matches!(
            result,
            Err(SeederError::Harness(HarnessError::Input(_)))
        ));
    }

    #[tokio::test]
    async fn seed_aborts_remaining_publishes_on_bus_failure() {
        use evharness_bus::{Bus, BusError};

        struct FailingBus;
        #[async_trait::async_trait]
        impl Bus for FailingBus {
            async fn publish(&self, _entry: &BusEventEntry) -> Result<String, BusError> {
                Err(BusError::PublishRejected("simulated".into()))
            }
        }

        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        seed_scenario(
            &archive,
            "all",
            json!([{"source": "svc.a", "detail-type": "Started", "detail": {}}]),
            json!([]),
        )
        .await;

        let seeder = Seeder::with_config(
            store.clone(),
            archive,
            Arc::new(FailingBus) as Arc<dyn Bus>,
            fast_config(),
        );
        let result = seeder.seed(None).await;
        assert!(matches!(result, Err(SeederError::Publish { index: 0, .. })));
    }
}
