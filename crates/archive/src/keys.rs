use chrono::{DateTime, Utc};

/// Archive key for a service's seed-event scenario file.
#[must_use]
pub fn scenario_events_key(service_name: &str) -> String {
    format!("seed/services/{service_name}/events.json")
}

/// Archive key for a service's expectation scenario file.
#[must_use]
pub fn scenario_expectations_key(service_name: &str) -> String {
    format!("seed/services/{service_name}/expectations.json")
}

/// Archive key for one raw event envelope captured by the Collector.
///
/// Time-partitioned by UTC calendar date so a bucket lifecycle policy can
/// expire old runs by prefix.
#[must_use]
pub fn raw_event_key(run_id: &str, received_at: DateTime<Utc>, event_id: &str) -> String {
    format!(
        "events/testruns/{run_id}/{:04}/{:02}/{:02}/{}-{event_id}.json",
        received_at.format("%Y"),
        received_at.format("%m"),
        received_at.format("%d"),
        received_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    )
}

/// Archive key for a rendered report artefact.
#[must_use]
pub fn report_key(service_name: &str, rendered_at: DateTime<Utc>, run_id: &str) -> String {
    format!(
        "reports/testruns/{service_name}/{:04}/{:02}/{:02}/{}-{run_id}.html",
        rendered_at.format("%Y"),
        rendered_at.format("%m"),
        rendered_at.format("%d"),
        rendered_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    )
}

/// Archive key for the optional custom report template.
#[must_use]
pub fn report_template_key() -> &'static str {
    "reports/templates/base.html"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 14, 30, 1).unwrap()
    }

    #[test]
    fn scenario_keys_are_namespaced_by_service() {
        assert_eq!(
            scenario_events_key("billing"),
            "seed/services/billing/events.json"
        );
        assert_eq!(
            scenario_expectations_key("billing"),
            "seed/services/billing/expectations.json"
        );
    }

    #[test]
    fn raw_event_key_is_date_partitioned() {
        let key = raw_event_key("it-1", sample_time(), "evt-42");
        assert!(key.starts_with("events/testruns/it-1/2026/03/05/"));
        assert!(key.ends_with("-evt-42.json"));
    }

    #[test]
    fn report_key_is_date_partitioned_by_service() {
        let key = report_key("billing", sample_time(), "it-1");
        assert!(key.starts_with("reports/testruns/billing/2026/03/05/"));
        assert!(key.ends_with("-it-1.html"));
    }

    #[test]
    fn report_template_key_is_fixed() {
        assert_eq!(report_template_key(), "reports/templates/base.html");
    }
}
