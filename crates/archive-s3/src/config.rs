use evharness_aws::AwsBaseConfig;

/// Configuration for the S3-backed [`crate::archive::S3Archive`].
#[derive(Clone, Debug)]
pub struct S3ArchiveConfig {
    /// Shared AWS configuration (region, role ARN, endpoint URL).
    pub aws: AwsBaseConfig,
    /// Bucket the Archive reads and writes.
    pub bucket: String,
}

impl S3ArchiveConfig {
    #[must_use]
    pub fn new(region: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            aws: AwsBaseConfig::new(region),
            bucket: bucket.into(),
        }
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.aws.endpoint_url = Some(endpoint_url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_region_and_bucket() {
        let config = S3ArchiveConfig::new("us-east-1", "evharness-artifacts");
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.bucket, "evharness-artifacts");
    }
}
