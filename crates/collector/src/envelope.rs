use serde::{Deserialize, Serialize};

/// The full bus envelope delivered to the Collector for one routed event.
///
/// Shaped after an `EventBridge` event: the four fields the harness reads
/// directly (`id`, `source`, `detail-type`, `detail`) plus whatever else the
/// bus attaches (`account`, `time`, `region`, `resources`, ...), preserved
/// via `extra` so the Collector can archive the envelope exactly as
/// delivered rather than a lossy reconstruction of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEnvelope {
    pub id: String,
    pub source: String,

    #[serde(rename = "detail-type")]
    pub detail_type: String,

    pub detail: serde_json::Value,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips_unknown_fields_through_extra() {
        let json = serde_json::json!({
            "id": "evt-1",
            "source": "svc.a",
            "detail-type": "Created",
            "detail": {"jobId": "J1"},
            "account": "123456789012",
            "region": "us-east-1",
        });
        let envelope: BusEnvelope = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(envelope.extra["account"], "123456789012");

        let serialized = serde_json::to_value(&envelope).unwrap();
        assert_eq!(serialized["region"], "us-east-1");
    }
}
