use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scenario::Expectation;

/// Disposition of an observed event once the Verifier has looked at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationStatus {
    /// Recorded by the Collector, not yet looked at by a verify pass.
    New,
    /// Matched to exactly one expectation.
    Matched,
    /// Verify pass completed and found no expectation this observation
    /// satisfies (source/detail-type combination not in the scenario, or
    /// already claimed by an earlier-declared expectation).
    Unexpected,
}

/// One row per observed event, `sort = "event#{receivedAtMillis}-{eventId}"`.
///
/// Written once by the Collector (append-only: the Collector never
/// overwrites a row it already wrote for the same event id) and mutated only
/// by the Verifier's `verify` pass, which stamps `status`/`verified_at`/
/// `matched_expectation_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub event_id: String,
    pub source: String,
    pub detail_type: String,
    pub received_at: DateTime<Utc>,
    pub payload_hash: String,
    /// Key into the Archive where the full event body is stored, or `None`
    /// if the Collector's archive write failed (a non-fatal outcome; see
    /// the Collector's design).
    pub archive_key: Option<String>,
    pub status: ObservationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    /// Index into the scenario's `expectations` array this observation was
    /// matched against, once `status == Matched`.
    pub matched_expectation_index: Option<usize>,
    /// A copy of the matched expectation, attached for report rendering so
    /// the report producer does not need a second Archive read to show what
    /// an observation was expected to look like.
    pub expected_event: Option<Expectation>,
}

impl Observation {
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        source: impl Into<String>,
        detail_type: impl Into<String>,
        received_at: DateTime<Utc>,
        payload_hash: impl Into<String>,
        archive_key: Option<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            source: source.into(),
            detail_type: detail_type.into(),
            received_at,
            payload_hash: payload_hash.into(),
            archive_key,
            status: ObservationStatus::New,
            verified_at: None,
            matched_expectation_index: None,
            expected_event: None,
        }
    }
}

/// Verdict attached to a scenario expectation that no observation satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStatus {
    Missed,
}

/// One row per unmatched expectation, `sort = "expectation#{index:03}-missing"`.
///
/// Written by the Verifier's `verify` pass for every expectation left
/// unclaimed after the greedy matching sweep completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingRecord {
    pub index: usize,
    pub source: String,
    pub detail_type: String,
    pub expected_event: Expectation,
    pub status: MissingStatus,
    pub verified_at: DateTime<Utc>,
}
