use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use evharness_archive::archive::Archive;
use evharness_archive::error::ArchiveError;

/// In-memory [`Archive`] backed by a [`DashMap`] keyed by the full object
/// key. Used for tests and the CLI's `--local` mode, where an actual S3
/// bucket would otherwise be required.
#[derive(Default)]
pub struct MemoryArchive {
    objects: DashMap<String, Bytes>,
}

impl MemoryArchive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryArchive")
            .field("objects", &self.objects.len())
            .finish()
    }
}

#[async_trait]
impl Archive for MemoryArchive {
    async fn put(&self, key: &str, _content_type: Option<&str>, body: Bytes) -> Result<(), ArchiveError> {
        self.objects.insert(key.to_string(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, ArchiveError> {
        Ok(self.objects.get(key).map(|entry| entry.clone()))
    }
}
