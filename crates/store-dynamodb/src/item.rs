use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use evharness_core::{
    Expectation, MissingRecord, MissingStatus, Observation, ObservationStatus, RunMeta, RunStatus,
};
use evharness_store::error::StoreError;

type Item = HashMap<String, AttributeValue>;

fn get_s(item: &Item, field: &str) -> Result<String, StoreError> {
    match item.get(field) {
        Some(AttributeValue::S(s)) => Ok(s.clone()),
        _ => Err(StoreError::Serialization(format!("missing or wrong-typed field: {field}"))),
    }
}

fn get_n_i64(item: &Item, field: &str) -> Result<i64, StoreError> {
    match item.get(field) {
        Some(AttributeValue::N(n)) => n
            .parse()
            .map_err(|_| StoreError::Serialization(format!("field {field} is not a valid integer"))),
        _ => Err(StoreError::Serialization(format!("missing or wrong-typed field: {field}"))),
    }
}

fn get_opt_s(item: &Item, field: &str) -> Option<String> {
    match item.get(field) {
        Some(AttributeValue::S(s)) => Some(s.clone()),
        _ => None,
    }
}

fn get_opt_n_usize(item: &Item, field: &str) -> Option<usize> {
    match item.get(field) {
        Some(AttributeValue::N(n)) => n.parse().ok(),
        _ => None,
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("invalid timestamp {value}: {e}")))
}

fn parse_opt_timestamp(item: &Item, field: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
    get_opt_s(item, field).map(|s| parse_timestamp(&s)).transpose()
}

fn parse_status(value: &str) -> Result<RunStatus, StoreError> {
    match value {
        "running" => Ok(RunStatus::Running),
        "ready" => Ok(RunStatus::Ready),
        "timeout" => Ok(RunStatus::Timeout),
        "passed" => Ok(RunStatus::Passed),
        "failed" => Ok(RunStatus::Failed),
        other => Err(StoreError::Serialization(format!("unknown run status: {other}"))),
    }
}

fn parse_observation_status(value: &str) -> Result<ObservationStatus, StoreError> {
    match value {
        "new" => Ok(ObservationStatus::New),
        "matched" => Ok(ObservationStatus::Matched),
        "unexpected" => Ok(ObservationStatus::Unexpected),
        other => Err(StoreError::Serialization(format!("unknown observation status: {other}"))),
    }
}

/// Encode a [`RunMeta`] as a `DynamoDB` item. `status` is its own top-level
/// attribute (not buried in a JSON blob) so `transition_status` can
/// condition on it natively.
pub fn run_meta_to_item(pk: &str, sk: &str, meta: &RunMeta) -> Item {
    let mut item = Item::new();
    item.insert("pk".to_string(), AttributeValue::S(pk.to_string()));
    item.insert("sk".to_string(), AttributeValue::S(sk.to_string()));
    item.insert("run_id".to_string(), AttributeValue::S(meta.run_id.clone()));
    item.insert("service_name".to_string(), AttributeValue::S(meta.service_name.clone()));
    item.insert("status".to_string(), AttributeValue::S(meta.status.to_string()));
    item.insert(
        "started_at".to_string(),
        AttributeValue::S(meta.started_at.to_rfc3339()),
    );
    item.insert(
        "timeout_at".to_string(),
        AttributeValue::S(meta.timeout_at.to_rfc3339()),
    );
    item.insert(
        "observed_count".to_string(),
        AttributeValue::N(meta.observed_count.to_string()),
    );
    if let Some(verified_at) = meta.verified_at {
        item.insert("verified_at".to_string(), AttributeValue::S(verified_at.to_rfc3339()));
    }
    if let Some(location) = &meta.report_location {
        item.insert("report_location".to_string(), AttributeValue::S(location.clone()));
    }
    item
}

pub fn item_to_run_meta(item: &Item) -> Result<RunMeta, StoreError> {
    Ok(RunMeta {
        run_id: get_s(item, "run_id")?,
        service_name: get_s(item, "service_name")?,
        status: parse_status(&get_s(item, "status")?)?,
        started_at: parse_timestamp(&get_s(item, "started_at")?)?,
        timeout_at: parse_timestamp(&get_s(item, "timeout_at")?)?,
        observed_count: get_n_i64(item, "observed_count")?,
        verified_at: parse_opt_timestamp(item, "verified_at")?,
        report_location: get_opt_s(item, "report_location"),
    })
}

/// Encode an [`Observation`]. Nested JSON (`expected_event`) is carried as
/// a serialized string attribute — a standard `DynamoDB` pattern for a
/// field whose shape the table itself does not need to query on.
pub fn observation_to_item(pk: &str, sk: &str, observation: &Observation) -> Result<Item, StoreError> {
    let mut item = Item::new();
    item.insert("pk".to_string(), AttributeValue::S(pk.to_string()));
    item.insert("sk".to_string(), AttributeValue::S(sk.to_string()));
    item.insert("event_id".to_string(), AttributeValue::S(observation.event_id.clone()));
    item.insert("source".to_string(), AttributeValue::S(observation.source.clone()));
    item.insert(
        "detail_type".to_string(),
        AttributeValue::S(observation.detail_type.clone()),
    );
    item.insert(
        "received_at".to_string(),
        AttributeValue::S(observation.received_at.to_rfc3339()),
    );
    item.insert(
        "payload_hash".to_string(),
        AttributeValue::S(observation.payload_hash.clone()),
    );
    if let Some(key) = &observation.archive_key {
        item.insert("archive_key".to_string(), AttributeValue::S(key.clone()));
    }
    let status_str = match observation.status {
        ObservationStatus::New => "new",
        ObservationStatus::Matched => "matched",
        ObservationStatus::Unexpected => "unexpected",
    };
    item.insert("status".to_string(), AttributeValue::S(status_str.to_string()));
    if let Some(verified_at) = observation.verified_at {
        item.insert("verified_at".to_string(), AttributeValue::S(verified_at.to_rfc3339()));
    }
    if let Some(index) = observation.matched_expectation_index {
        item.insert("matched_expectation_index".to_string(), AttributeValue::N(index.to_string()));
    }
    if let Some(expected) = &observation.expected_event {
        let json = serde_json::to_string(expected)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        item.insert("expected_event_json".to_string(), AttributeValue::S(json));
    }
    Ok(item)
}

pub fn item_to_observation(item: &Item) -> Result<Observation, StoreError> {
    let expected_event = get_opt_s(item, "expected_event_json")
        .map(|json| serde_json::from_str::<Expectation>(&json))
        .transpose()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(Observation {
        event_id: get_s(item, "event_id")?,
        source: get_s(item, "source")?,
        detail_type: get_s(item, "detail_type")?,
        received_at: parse_timestamp(&get_s(item, "received_at")?)?,
        payload_hash: get_s(item, "payload_hash")?,
        archive_key: get_opt_s(item, "archive_key"),
        status: parse_observation_status(&get_s(item, "status")?)?,
        verified_at: parse_opt_timestamp(item, "verified_at")?,
        matched_expectation_index: get_opt_n_usize(item, "matched_expectation_index"),
        expected_event,
    })
}

pub fn missing_record_to_item(pk: &str, sk: &str, record: &MissingRecord) -> Result<Item, StoreError> {
    let mut item = Item::new();
    item.insert("pk".to_string(), AttributeValue::S(pk.to_string()));
    item.insert("sk".to_string(), AttributeValue::S(sk.to_string()));
    item.insert("idx".to_string(), AttributeValue::N(record.index.to_string()));
    item.insert("source".to_string(), AttributeValue::S(record.source.clone()));
    item.insert("detail_type".to_string(), AttributeValue::S(record.detail_type.clone()));
    item.insert("status".to_string(), AttributeValue::S("missed".to_string()));
    item.insert(
        "verified_at".to_string(),
        AttributeValue::S(record.verified_at.to_rfc3339()),
    );
    let json = serde_json::to_string(&record.expected_event)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    item.insert("expected_event_json".to_string(), AttributeValue::S(json));
    Ok(item)
}

pub fn item_to_missing_record(item: &Item) -> Result<MissingRecord, StoreError> {
    let expected_event_json = get_s(item, "expected_event_json")?;
    let expected_event = serde_json::from_str::<Expectation>(&expected_event_json)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(MissingRecord {
        index: get_opt_n_usize(item, "idx")
            .ok_or_else(|| StoreError::Serialization("missing idx field".to_string()))?,
        source: get_s(item, "source")?,
        detail_type: get_s(item, "detail_type")?,
        expected_event,
        status: MissingStatus::Missed,
        verified_at: parse_timestamp(&get_s(item, "verified_at")?)?,
    })
}
