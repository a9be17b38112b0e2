use evharness_aws::AwsBaseConfig;

/// Configuration for the `DynamoDB`-backed [`crate::store::DynamoStore`].
#[derive(Clone, Debug)]
pub struct DynamoConfig {
    pub aws: AwsBaseConfig,
    /// `DynamoDB` table name. Must have `pk` (String) as its partition key
    /// and `sk` (String) as its sort key — see [`crate::table::create_table`].
    pub table_name: String,
}

impl DynamoConfig {
    #[must_use]
    pub fn new(region: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            aws: AwsBaseConfig::new(region),
            table_name: table_name.into(),
        }
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.aws.endpoint_url = Some(endpoint_url.into());
        self
    }
}
