use tracing::{debug, error, info, warn};

use crate::config::AwsBaseConfig;

/// Build an AWS SDK configuration from the given [`AwsBaseConfig`].
///
/// Uses the standard AWS SDK environment credential chain and optionally:
/// - overrides the endpoint URL for local development (`LocalStack`,
///   `DynamoDB` Local),
/// - assumes an IAM role via STS if `role_arn` is configured.
pub async fn build_sdk_config(config: &AwsBaseConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::from_env().region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        debug!(endpoint = %endpoint, "using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    let Some(role_arn) = &config.role_arn else {
        return loader.load().await;
    };

    info!(role_arn = %role_arn, "assuming IAM role via STS");
    let base_config = loader.load().await;
    let sts_client = aws_sdk_sts::Client::new(&base_config);
    let session_name = config.session_name.as_deref().unwrap_or("evharness");

    match sts_client
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name)
        .send()
        .await
    {
        Ok(response) => {
            let Some(creds) = response.credentials() else {
                warn!("STS response had no credentials, falling back to base config");
                return base_config;
            };
            let static_creds = aws_credential_types::Credentials::from_keys(
                creds.access_key_id(),
                creds.secret_access_key(),
                Some(creds.session_token().to_owned()),
            );
            let mut assumed_loader = aws_config::from_env()
                .region(aws_config::Region::new(config.region.clone()))
                .credentials_provider(static_creds);
            if let Some(endpoint) = &config.endpoint_url {
                assumed_loader = assumed_loader.endpoint_url(endpoint);
            }
            info!("STS assume-role succeeded");
            assumed_loader.load().await
        }
        Err(e) => {
            error!(error = %e, "STS assume-role failed, falling back to base config");
            base_config
        }
    }
}
