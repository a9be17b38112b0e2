use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use evharness_archive::keys::{report_key, report_template_key};
use evharness_archive::Archive;
use evharness_core::{HarnessError, Observation, ObservationStatus};
use evharness_store::Store;
use evharness_verifier::VerifyResult;
use tracing::{info, instrument};

use crate::error::ReportError;
use crate::result::ReportLocation;
use crate::template::{render, BUILTIN_TEMPLATE};

/// Renders and archives a run's HTML report.
///
/// Reads `RunMeta`, matched Observations, `MissingRecord`s, and unexpected
/// Observations straight from the Store rather than trusting a caller-
/// supplied [`VerifyResult`] for the row data — the summary counts accept
/// one as a convenience so a CLI driver that just ran `verify` does not
/// have to re-derive totals it already has, but the underlying rows always
/// come from a fresh read so a report generated well after `verify` still
/// reflects what is actually recorded.
pub struct ReportProducer {
    store: Arc<dyn Store>,
    archive: Arc<dyn Archive>,
}

impl ReportProducer {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, archive: Arc<dyn Archive>) -> Self {
        Self { store, archive }
    }

    #[instrument(skip(self, verify_result), fields(run_id = %run_id))]
    pub async fn generate(
        &self,
        run_id: &str,
        verify_result: Option<&VerifyResult>,
    ) -> Result<ReportLocation, ReportError> {
        let meta = self.store.get_run_meta(run_id).await?.ok_or_else(|| {
            ReportError::Harness(HarnessError::Input(format!("no such run: {run_id}")))
        })?;

        let observations = self.store.scan_observations(run_id).await?;
        let mut missing = self.store.scan_missing_records(run_id).await?;
        missing.sort_by_key(|record| record.index);

        let mut matched: Vec<&Observation> = observations
            .iter()
            .filter(|o| o.status == ObservationStatus::Matched)
            .collect();
        matched.sort_by_key(|o| o.matched_expectation_index);

        let mut unexpected: Vec<&Observation> = observations
            .iter()
            .filter(|o| o.status == ObservationStatus::Unexpected)
            .collect();
        unexpected.sort_by_key(|o| o.received_at);

        let (matched_count, missing_count, unexpected_count, total_expected) = match verify_result {
            Some(result) => (
                result.matched_count,
                result.missing_count,
                result.unexpected_count,
                result.total_expected,
            ),
            None => (
                matched.len(),
                missing.len(),
                unexpected.len(),
                matched.len() + missing.len(),
            ),
        };

        let mut tokens: HashMap<&str, String> = HashMap::new();
        tokens.insert("run_id", escape(&meta.run_id));
        tokens.insert("service_name", escape(&meta.service_name));
        tokens.insert("run_status", meta.status.to_string());
        tokens.insert("started_at", meta.started_at.to_rfc3339());
        tokens.insert(
            "verified_at",
            meta.verified_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        );
        tokens.insert("matched_count", matched_count.to_string());
        tokens.insert("missing_count", missing_count.to_string());
        tokens.insert("unexpected_count", unexpected_count.to_string());
        tokens.insert("total_expected", total_expected.to_string());
        tokens.insert("matched_rows", matched_rows(&matched));
        tokens.insert("missing_rows", missing_rows(&missing));
        tokens.insert("unexpected_rows", unexpected_rows(&unexpected));

        let template = match self.archive.get(report_template_key()).await? {
            Some(body) => String::from_utf8(body.to_vec())
                .unwrap_or_else(|_| BUILTIN_TEMPLATE.to_string()),
            None => BUILTIN_TEMPLATE.to_string(),
        };
        let rendered = render(&template, &tokens);

        let rendered_at = Utc::now();
        let key = report_key(&meta.service_name, rendered_at, run_id);
        self.archive
            .put(&key, Some("text/html"), Bytes::from(rendered))
            .await?;

        self.store
            .finalize_run(
                run_id,
                meta.status,
                meta.verified_at.unwrap_or(rendered_at),
                Some(key.clone()),
            )
            .await?;

        info!(run_id = %run_id, archive_key = %key, "report generated");
        Ok(ReportLocation { archive_key: key })
    }
}

fn matched_rows(matched: &[&Observation]) -> String {
    matched
        .iter()
        .map(|o| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                o.matched_expectation_index.map_or_else(String::new, |i| i.to_string()),
                escape(&o.source),
                escape(&o.detail_type),
                escape(&o.event_id),
            )
        })
        .collect()
}

fn missing_rows(missing: &[evharness_core::MissingRecord]) -> String {
    missing
        .iter()
        .map(|m| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                m.index,
                escape(&m.source),
                escape(&m.detail_type),
            )
        })
        .collect()
}

fn unexpected_rows(unexpected: &[&Observation]) -> String {
    unexpected
        .iter()
        .map(|o| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&o.source),
                escape(&o.detail_type),
                escape(&o.event_id),
                o.received_at.to_rfc3339(),
            )
        })
        .collect()
}

/// Minimal HTML escaping for values interpolated into the report — event
/// bodies and run identifiers are not attacker-controlled in the harness's
/// trust model, but a scenario author's `source`/`detail-type` strings end
/// up here verbatim, so this guards against an accidental `<script>` in a
/// scenario file breaking the rendered page.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use evharness_archive_memory::MemoryArchive;
    use evharness_core::{Expectation, MissingRecord, MissingStatus, RunMeta, RunStatus};
    use evharness_store_memory::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn generate_renders_builtin_template_and_stamps_report_location() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());

        let mut meta = RunMeta::new_running("it-1", "svc", Utc::now(), chrono::Duration::minutes(15));
        meta.status = RunStatus::Passed;
        meta.verified_at = Some(Utc::now());
        store.put_run_meta(&meta).await.unwrap();

        let mut matched = Observation::new("evt-1", "svc.a", "Started", Utc::now(), "hash", None);
        matched.status = ObservationStatus::Matched;
        matched.matched_expectation_index = Some(0);
        store.put_observation("it-1", &matched).await.unwrap();

        let producer = ReportProducer::new(store.clone(), archive);
        let location = producer.generate("it-1", None).await.unwrap();
        assert!(location.archive_key.contains("it-1"));

        let updated = store.get_run_meta("it-1").await.unwrap().unwrap();
        assert_eq!(updated.report_location, Some(location.archive_key));
        assert_eq!(updated.status, RunStatus::Passed, "report generation must not change the verdict");
    }

    #[tokio::test]
    async fn generate_uses_custom_template_when_present() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        archive
            .put(
                report_template_key(),
                Some("text/html"),
                Bytes::from("Run {{ run_id }} is {{ run_status }}"),
            )
            .await
            .unwrap();

        let mut meta = RunMeta::new_running("it-2", "svc", Utc::now(), chrono::Duration::minutes(15));
        meta.status = RunStatus::Failed;
        store.put_run_meta(&meta).await.unwrap();

        let producer = ReportProducer::new(store, archive.clone());
        let location = producer.generate("it-2", None).await.unwrap();

        let body = archive.get(&location.archive_key).await.unwrap().unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text, "Run it-2 is failed");
    }

    #[tokio::test]
    async fn generate_includes_missing_and_unexpected_rows() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        let meta = RunMeta::new_running("it-3", "svc", Utc::now(), chrono::Duration::minutes(15));
        store.put_run_meta(&meta).await.unwrap();

        store
            .put_missing_record(
                "it-3",
                &MissingRecord {
                    index: 0,
                    source: "svc.a".to_string(),
                    detail_type: "Started".to_string(),
                    expected_event: Expectation {
                        source: "svc.a".to_string(),
                        detail_type: "Started".to_string(),
                        detail: serde_json::json!({}),
                        match_fields: vec![],
                    },
                    status: MissingStatus::Missed,
                    verified_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        let mut unexpected = Observation::new("evt-stray", "svc.z", "Stray", Utc::now(), "hash", None);
        unexpected.status = ObservationStatus::Unexpected;
        store.put_observation("it-3", &unexpected).await.unwrap();

        let producer = ReportProducer::new(store, archive.clone());
        let location = producer.generate("it-3", None).await.unwrap();
        let body = archive.get(&location.archive_key).await.unwrap().unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Started"));
        assert!(text.contains("evt-stray"));
    }

    #[tokio::test]
    async fn generate_fails_for_unknown_run() {
        let store = Arc::new(MemoryStore::new());
        let archive = Arc::new(MemoryArchive::new());
        let producer = ReportProducer::new(store, archive);
        let result = producer.generate("nope", None).await;
        assert!(matches!(result, Err(ReportError::Harness(HarnessError::Input(_)))));
    }
}
