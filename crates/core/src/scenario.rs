use serde::{Deserialize, Serialize};

/// One event the Seeder publishes to the bus.
///
/// Field names mirror the EventBridge `PutEventsRequestEntry` shape the
/// original scenario files were authored against; `alias` keeps the older
/// PascalCase variants readable without a migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioEvent {
    pub source: String,

    #[serde(rename = "detail-type", alias = "DetailType")]
    pub detail_type: String,

    #[serde(alias = "Detail")]
    pub detail: serde_json::Value,

    /// Whether the Seeder should stamp a correlation id for this run into
    /// the detail body before publishing. Sourced from the scenario file's
    /// `__injectTestId` boolean; defaults to `false` when absent.
    #[serde(rename = "__injectTestId", default)]
    pub inject_test_id: bool,
}

/// One row of the expected-events table the Verifier checks observations
/// against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectation {
    pub source: String,

    #[serde(rename = "detail-type", alias = "DetailType")]
    pub detail_type: String,

    #[serde(alias = "Detail")]
    pub detail: serde_json::Value,

    /// Dot-paths rooted at the envelope (e.g. `"detail.jobId"`) that a
    /// candidate observation must equal to count as a match. Sourced from
    /// the scenario file's nested `__match.fields` array; an empty list
    /// means source + detail-type alone are sufficient to match.
    #[serde(default, rename = "__match", with = "match_fields")]
    pub match_fields: Vec<String>,
}

/// (De)serializes `match_fields` through the nested `{"fields": [...]}`
/// shape the scenario files use for the `__match` key, so callers see a
/// flat `Vec<String>` on the Rust side.
mod match_fields {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize, Default)]
    struct Wrapper {
        #[serde(default)]
        fields: Vec<String>,
    }

    pub fn serialize<S: Serializer>(fields: &[String], s: S) -> Result<S::Ok, S::Error> {
        Wrapper {
            fields: fields.to_vec(),
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(Option::<Wrapper>::deserialize(d)?.unwrap_or_default().fields)
    }
}
