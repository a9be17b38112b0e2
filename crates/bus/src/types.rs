use serde::{Deserialize, Serialize};

/// One entry submitted to [`crate::bus::Bus::publish`].
///
/// Shaped like `evharness_core::ScenarioEvent` minus the
/// `__injectTestId` flag: by the time the Seeder hands an entry to the
/// Bus, tracing-field injection has already happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEventEntry {
    pub source: String,
    pub detail_type: String,
    pub detail: serde_json::Value,
}

/// Outcome of a single [`crate::rule::RuleController::set_enabled`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleStatus {
    Enabled,
    Disabled,
}

impl std::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        })
    }
}

/// Result of enabling or disabling the Collector's routing rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleActionResult {
    pub rule_name: String,
    pub status: RuleStatus,
}
