use async_trait::async_trait;

use crate::error::BusError;
use crate::types::RuleActionResult;

/// Enables or disables the bus rule that routes traffic to the Collector.
///
/// Idempotent by nature of the underlying API: enabling an already-enabled
/// rule (or disabling an already-disabled one) is a no-op that still
/// returns a success result.
#[async_trait]
pub trait RuleController: Send + Sync {
    async fn set_enabled(&self, enabled: bool) -> Result<RuleActionResult, BusError>;
}
