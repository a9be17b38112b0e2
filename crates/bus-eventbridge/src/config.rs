use evharness_aws::AwsBaseConfig;

/// Configuration shared by [`crate::bus::EventBridgeBus`] and
/// [`crate::rule::EventBridgeRuleController`].
#[derive(Clone, Debug)]
pub struct EventBridgeConfig {
    pub aws: AwsBaseConfig,
    /// Event bus name events are published to.
    pub event_bus_name: String,
    /// Name of the rule the rule controller enables/disables.
    pub rule_name: String,
}

impl EventBridgeConfig {
    #[must_use]
    pub fn new(
        region: impl Into<String>,
        event_bus_name: impl Into<String>,
        rule_name: impl Into<String>,
    ) -> Self {
        Self {
            aws: AwsBaseConfig::new(region),
            event_bus_name: event_bus_name.into(),
            rule_name: rule_name.into(),
        }
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.aws.endpoint_url = Some(endpoint_url.into());
        self
    }
}
