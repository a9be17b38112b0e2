use async_trait::async_trait;
use evharness_aws::build_sdk_config;
use evharness_bus::error::BusError;
use evharness_bus::rule::RuleController;
use evharness_bus::types::{RuleActionResult, RuleStatus};
use tracing::info;

use crate::config::EventBridgeConfig;
use crate::error::map_sdk_error;

/// `EventBridge`-backed [`RuleController`], wrapping `enable_rule`/
/// `disable_rule`. Both calls are no-ops if the rule is already in the
/// target state, so `set_enabled` is naturally idempotent.
pub struct EventBridgeRuleController {
    config: EventBridgeConfig,
    client: aws_sdk_eventbridge::Client,
}

impl std::fmt::Debug for EventBridgeRuleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridgeRuleController")
            .field("rule_name", &self.config.rule_name)
            .finish()
    }
}

impl EventBridgeRuleController {
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
impl RuleController for EventBridgeRuleController {
    async fn set_enabled(&self, enabled: bool) -> Result<RuleActionResult, BusError> {
        if enabled {
            self.client
                .enable_rule()
                .name(&self.config.rule_name)
                .event_bus_name(&self.config.event_bus_name)
                .send()
                .await
                .map_err(map_sdk_error)?;
        } else {
            self.client
                .disable_rule()
                .name(&self.config.rule_name)
                .event_bus_name(&self.config.event_bus_name)
                .send()
                .await
                .map_err(map_sdk_error)?;
        }

        let status = if enabled {
            RuleStatus::Enabled
        } else {
            RuleStatus::Disabled
        };
        info!(rule_name = %self.config.rule_name, status = %status, "EventBridge rule updated");
        Ok(RuleActionResult {
            rule_name: self.config.rule_name.clone(),
            status,
        })
    }
}
