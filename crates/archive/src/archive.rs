use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ArchiveError;

/// Key-addressed blob store for scenario files, raw event payloads, report
/// templates, and rendered reports.
///
/// Keys here are full paths chosen by the caller
/// (`seed/services/{name}/events.json`,
/// `events/testruns/{runId}/{YYYY}/{MM}/{DD}/{isoTs}-{eventId}.json`, ...)
/// rather than store-assigned ids under a namespace/tenant scheme — the
/// harness's Archive layout is part of its external interface (see the
/// layout table), so keys must be deterministic and caller-constructed.
#[async_trait]
pub trait Archive: Send + Sync {
    /// Write `body` at `key`, overwriting any existing object.
    async fn put(&self, key: &str, content_type: Option<&str>, body: Bytes) -> Result<(), ArchiveError>;

    /// Read the object at `key`. `Ok(None)` means the key does not exist —
    /// callers distinguish "absent" from "empty" only where their own
    /// semantics require it (e.g. a missing report template falls back to a
    /// built-in one; a missing scenario file is an input error).
    async fn get(&self, key: &str) -> Result<Option<Bytes>, ArchiveError>;

    /// Whether an object exists at `key`, without fetching its body.
    async fn exists(&self, key: &str) -> Result<bool, ArchiveError> {
        Ok(self.get(key).await?.is_some())
    }
}
