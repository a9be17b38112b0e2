use async_trait::async_trait;
use evharness_aws::build_sdk_config;
use evharness_bus::bus::Bus;
use evharness_bus::error::BusError;
use evharness_bus::types::BusEventEntry;
use tracing::{debug, info};

use crate::config::EventBridgeConfig;
use crate::error::map_sdk_error;

/// `EventBridge`-backed [`Bus`].
pub struct EventBridgeBus {
    config: EventBridgeConfig,
    client: aws_sdk_eventbridge::Client,
}

impl std::fmt::Debug for EventBridgeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridgeBus")
            .field("event_bus_name", &self.config.event_bus_name)
            .finish()
    }
}

impl EventBridgeBus {
    pub async fn new(config: EventBridgeConfig) -> Self {
        let sdk_config = build_sdk_config(&config.aws).await;
        let client = aws_sdk_eventbridge::Client::new(&sdk_config);
        Self { config, client }
    }

    #[must_use]
    pub fn with_client(config: EventBridgeConfig, client: aws_sdk_eventbridge::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Bus for EventBridgeBus {
    async fn publish(&self, entry: &BusEventEntry) -> Result<String, BusError> {
        let detail_json = serde_json::to_string(&entry.detail)
            .map_err(|e| BusError::PublishRejected(e.to_string()))?;

        debug!(
            event_bus = %self.config.event_bus_name,
            source = %entry.source,
            detail_type = %entry.detail_type,
            "putting event to EventBridge"
        );

        let put_entry = aws_sdk_eventbridge::types::PutEventsRequestEntry::builder()
            .event_bus_name(&self.config.event_bus_name)
            .source(&entry.source)
            .detail_type(&entry.detail_type)
            .detail(&detail_json)
            .build();

        let result = self
            .client
            .put_events()
            .entries(put_entry)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let failed_count = result.failed_entry_count();
        if failed_count > 0 {
            let error_msg = result
                .entries()
                .iter()
                .filter_map(|e| e.error_message())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(BusError::PublishRejected(format!(
                "{failed_count} entries failed: {error_msg}"
            )));
        }

        let event_id = result
            .entries()
            .first()
            .and_then(|e| e.event_id())
            .ok_or_else(|| BusError::Backend("EventBridge response had no event id".into()))?
            .to_owned();

        info!(event_id = %event_id, "event published to EventBridge");
        Ok(event_id)
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    fn test_config() -> EventBridgeConfig {
        EventBridgeConfig::new("us-east-1", "evharness-test-bus", "evharness-test-rule")
            .with_endpoint_url("http://localhost:4566")
    }

    #[tokio::test]
    async fn publish_returns_event_id() {
        let bus = EventBridgeBus::new(test_config()).await;
        let entry = BusEventEntry {
            source: "evharness.test".into(),
            detail_type: "Probe".into(),
            detail: serde_json::json!({}),
        };
        let event_id = bus.publish(&entry).await.expect("publish should succeed");
        assert!(!event_id.is_empty());
    }
}
