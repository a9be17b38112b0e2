use async_trait::async_trait;
use bytes::Bytes;
use evharness_archive::archive::Archive;
use evharness_archive::error::ArchiveError;
use evharness_aws::{build_sdk_config, classify_sdk_error, SdkErrorClass};
use tracing::{debug, error};

use crate::config::S3ArchiveConfig;

/// S3-backed [`Archive`].
///
/// Keys map directly onto S3 object keys within the configured bucket; the
/// Archive trait's layout (`seed/...`, `events/testruns/...`,
/// `reports/...`) is entirely a key-naming convention applied by callers,
/// not something this backend interprets.
pub struct S3Archive {
    config: S3ArchiveConfig,
    client: aws_sdk_s3::Client,
}

impl std::fmt::Debug for S3Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Archive")
            .field("bucket", &self.config.bucket)
            .finish()
    }
}

impl S3Archive {
    pub async fn new(config: S3ArchiveConfig) -> Self {
        let sdk_config = build_sdk_config(&config.aws).await;
        let client = aws_sdk_s3::Client::new(&sdk_config);
        Self { config, client }
    }

    /// Build an `S3Archive` from a pre-built client, for tests against
    /// `LocalStack` or a mocked client.
    #[must_use]
    pub fn with_client(config: S3ArchiveConfig, client: aws_sdk_s3::Client) -> Self {
        Self { config, client }
    }
}

fn map_sdk_error<E: std::fmt::Display>(err: E) -> ArchiveError {
    let err_str = err.to_string();
    error!(error = %err_str, "S3 operation failed");
    match classify_sdk_error(&err_str) {
        SdkErrorClass::Throttled | SdkErrorClass::Connection => ArchiveError::Connection(err_str),
        SdkErrorClass::Timeout => ArchiveError::Timeout(std::time::Duration::from_secs(30)),
        SdkErrorClass::Service => ArchiveError::Backend(err_str),
    }
}

#[async_trait]
impl Archive for S3Archive {
    async fn put(&self, key: &str, content_type: Option<&str>, body: Bytes) -> Result<(), ArchiveError> {
        debug!(bucket = %self.config.bucket, key = %key, size = body.len(), "putting object to S3");
        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(body));
        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }
        request.send().await.map_err(map_sdk_error)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, ArchiveError> {
        debug!(bucket = %self.config.bucket, key = %key, "getting object from S3");
        let result = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| ArchiveError::Backend(e.to_string()))?
                    .into_bytes();
                Ok(Some(bytes))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(map_sdk_error(service_err))
                }
            }
        }
    }
}
