use evharness_core::HarnessError;

/// Process-wide configuration, loaded once at startup from the environment,
/// mirroring the Lambda-style `os.environ[...]` lookup style generalized
/// into a typed struct here.
///
/// Missing required variables are a fatal `HarnessError::Config` raised
/// before any subcommand runs.
#[derive(Clone)]
pub struct HarnessConfig {
    pub table_name: String,
    pub event_bus_name: String,
    pub s3_bucket: String,
    pub rule_name: String,
    pub aws_region: String,
    pub aws_endpoint_url: Option<String>,
}

impl std::fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("table_name", &self.table_name)
            .field("event_bus_name", &self.event_bus_name)
            .field("s3_bucket", &self.s3_bucket)
            .field("rule_name", &self.rule_name)
            .field("aws_region", &self.aws_region)
            .field("aws_endpoint_url", &self.aws_endpoint_url)
            .finish()
    }
}

impl HarnessConfig {
    /// Read the five `EVHARNESS_*` variables from the environment. `--local`
    /// mode (in-memory backends) skips this entirely — see `main.rs`.
    pub fn from_env() -> Result<Self, HarnessError> {
        Ok(Self {
            table_name: required_env("EVHARNESS_TABLE_NAME")?,
            event_bus_name: required_env("EVHARNESS_EVENT_BUS_NAME")?,
            s3_bucket: required_env("EVHARNESS_S3_BUCKET")?,
            rule_name: required_env("EVHARNESS_RULE_NAME")?,
            aws_region: std::env::var("EVHARNESS_AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            aws_endpoint_url: std::env::var("EVHARNESS_AWS_ENDPOINT_URL").ok(),
        })
    }
}

fn required_env(name: &str) -> Result<String, HarnessError> {
    std::env::var(name).map_err(|_| HarnessError::Config(format!("missing required environment variable {name}")))
}
