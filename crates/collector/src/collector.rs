use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use evharness_archive::keys::raw_event_key;
use evharness_archive::Archive;
use evharness_core::{canonical_json_hash, extract_dot_path, Observation};
use evharness_store::Store;
use serde_json::Value;
use tracing::{error, instrument, warn};

use crate::envelope::BusEnvelope;
use crate::error::CollectorError;
use crate::result::{CollectResponse, IgnoreReason};

/// Receives every event routed through the bus, archives the full envelope,
/// and records an observation row.
///
/// Deliberately knows nothing about expectations — matching is deferred to
/// the Verifier's `verify` pass so this handler stays a pure, idempotent
/// archiver: fast, side-effect-light, and safe to invoke repeatedly for the
/// same delivery (see the crate docs for the duplicate-delivery discipline).
pub struct Collector {
    store: Arc<dyn Store>,
    archive: Arc<dyn Archive>,
}

impl Collector {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, archive: Arc<dyn Archive>) -> Self {
        Self { store, archive }
    }

    /// Handle one routed envelope.
    ///
    /// Archive write failures are logged and swallowed (the Observation is
    /// still written with `archive_key = None`); Store write failures
    /// propagate so the caller's host lets the bus redeliver.
    #[instrument(skip(self, envelope), fields(event_id = %envelope.id, source = %envelope.source))]
    pub async fn handle(&self, envelope: &BusEnvelope) -> Result<CollectResponse, CollectorError> {
        let test_run_id = extract_dot_path(&envelope.detail, "testRunId");
        let Value::String(run_id) = test_run_id else {
            return Ok(CollectResponse::Ignored {
                reason: IgnoreReason::NoTestRunId,
            });
        };

        if self.store.get_run_meta(&run_id).await?.is_none() {
            return Ok(CollectResponse::Ignored {
                reason: IgnoreReason::UnknownRun,
            });
        }

        let received_at = Utc::now();
        let archive_key = self.archive_envelope(&run_id, envelope, received_at).await;
        let payload_hash = canonical_json_hash(&envelope.detail);

        let observation = Observation::new(
            envelope.id.clone(),
            envelope.source.clone(),
            envelope.detail_type.clone(),
            received_at,
            payload_hash,
            archive_key.clone(),
        );
        self.store.put_observation(&run_id, &observation).await?;
        let observed_count = self.store.increment_observed_count(&run_id, 1).await?;

        Ok(CollectResponse::Collected {
            run_id,
            event_id: envelope.id.clone(),
            archived: archive_key.is_some(),
            observed_count,
        })
    }

    /// Archives the full envelope, returning `None` (and logging) on
    /// failure rather than propagating — archiving is a best-effort
    /// courtesy to the report producer, not load-bearing for the matching
    /// algorithm.
    async fn archive_envelope(
        &self,
        run_id: &str,
        envelope: &BusEnvelope,
        received_at: chrono::DateTime<Utc>,
    ) -> Option<String> {
        let key = raw_event_key(run_id, received_at, &envelope.id);
        let body = match serde_json::to_vec(envelope) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                error!(run_id = %run_id, key = %key, error = %e, "failed to serialize envelope for archiving");
                return None;
            }
        };
        match self.archive.put(&key, Some("application/json"), body).await {
            Ok(()) => Some(key),
            Err(e) => {
                warn!(run_id = %run_id, key = %key, error = %e, "archive write failed, continuing without archive_key");
                None
            }
        }
    }
}
