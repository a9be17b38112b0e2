use async_trait::async_trait;

use crate::error::BusError;
use crate::types::BusEventEntry;

/// Publishes events onto the shared bus that routes traffic between the
/// harness and the system-under-test.
///
/// A failed publish is fatal to the Seeder's run — see
/// `evharness-seeder`'s failure semantics — so this trait intentionally has
/// no retry or batching built in; callers decide that policy.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Publish one entry, returning the bus-assigned event id.
    async fn publish(&self, entry: &BusEventEntry) -> Result<String, BusError>;
}
