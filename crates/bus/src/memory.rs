use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::bus::Bus;
use crate::error::BusError;
use crate::rule::RuleController;
use crate::types::{BusEventEntry, RuleActionResult, RuleStatus};

/// In-process [`Bus`] that records every published entry for assertions in
/// tests (`evharness-seeder`'s test suite publishes to one of these and
/// then inspects `published()`), rather than actually routing anywhere.
#[derive(Default)]
pub struct InMemoryBus {
    published: RwLock<Vec<(String, BusEventEntry)>>,
}

impl InMemoryBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry published so far, in publish order, alongside the
    /// event id this bus assigned it.
    #[must_use]
    pub fn published(&self) -> Vec<(String, BusEventEntry)> {
        self.published
            .read()
            .expect("published lock poisoned")
            .clone()
    }
}

#[async_trait]
impl Bus for InMemoryBus {
    async fn publish(&self, entry: &BusEventEntry) -> Result<String, BusError> {
        let event_id = Uuid::new_v4().to_string();
        self.published
            .write()
            .map_err(|_| BusError::Backend("published lock poisoned".into()))?
            .push((event_id.clone(), entry.clone()));
        Ok(event_id)
    }
}

/// In-process [`RuleController`] that tracks enabled/disabled state in
/// memory, for tests that exercise the CLI's `rule enable`/`rule disable`
/// verbs without an `EventBridge` rule to call.
pub struct InMemoryRuleController {
    rule_name: String,
    enabled: RwLock<bool>,
}

impl InMemoryRuleController {
    #[must_use]
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            enabled: RwLock::new(false),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        *self.enabled.read().expect("enabled lock poisoned")
    }
}

#[async_trait]
impl RuleController for InMemoryRuleController {
    async fn set_enabled(&self, enabled: bool) -> Result<RuleActionResult, BusError> {
        *self
            .enabled
            .write()
            .map_err(|_| BusError::Backend("enabled lock poisoned".into()))? = enabled;
        Ok(RuleActionResult {
            rule_name: self.rule_name.clone(),
            status: if enabled {
                RuleStatus::Enabled
            } else {
                RuleStatus::Disabled
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_assigns_distinct_event_ids() {
        let bus = InMemoryBus::new();
        let entry = BusEventEntry {
            source: "svc.a".into(),
            detail_type: "Created".into(),
            detail: serde_json::json!({}),
        };
        let first = bus.publish(&entry).await.unwrap();
        let second = bus.publish(&entry).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(bus.published().len(), 2);
    }

    #[tokio::test]
    async fn publish_preserves_order() {
        let bus = InMemoryBus::new();
        let first = BusEventEntry {
            source: "svc.a".into(),
            detail_type: "Started".into(),
            detail: serde_json::json!({}),
        };
        let second = BusEventEntry {
            source: "svc.a".into(),
            detail_type: "Completed".into(),
            detail: serde_json::json!({}),
        };
        bus.publish(&first).await.unwrap();
        bus.publish(&second).await.unwrap();
        let published = bus.published();
        assert_eq!(published[0].1.detail_type, "Started");
        assert_eq!(published[1].1.detail_type, "Completed");
    }

    #[tokio::test]
    async fn rule_controller_starts_disabled() {
        let controller = InMemoryRuleController::new("harness-rule");
        assert!(!controller.is_enabled());
    }

    #[tokio::test]
    async fn rule_controller_set_enabled_is_idempotent() {
        let controller = InMemoryRuleController::new("harness-rule");
        let first = controller.set_enabled(true).await.unwrap();
        let second = controller.set_enabled(true).await.unwrap();
        assert_eq!(first.status, RuleStatus::Enabled);
        assert_eq!(second.status, RuleStatus::Enabled);
        assert!(controller.is_enabled());
    }

    #[tokio::test]
    async fn rule_controller_disable_flips_state() {
        let controller = InMemoryRuleController::new("harness-rule");
        controller.set_enabled(true).await.unwrap();
        let result = controller.set_enabled(false).await.unwrap();
        assert_eq!(result.status, RuleStatus::Disabled);
        assert!(!controller.is_enabled());
    }
}
