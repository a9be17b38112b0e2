use std::sync::Arc;

use evharness_archive::Archive;
use evharness_archive_memory::MemoryArchive;
use evharness_archive_s3::{S3Archive, S3ArchiveConfig};
use evharness_bus::{Bus, InMemoryBus, InMemoryRuleController, RuleController};
use evharness_bus_eventbridge::{EventBridgeBus, EventBridgeConfig, EventBridgeRuleController};
use evharness_store::Store;
use evharness_store_dynamodb::{create_table, DynamoConfig, DynamoStore};
use evharness_store_memory::MemoryStore;
use tracing::info;

use crate::config::HarnessConfig;

/// The four collaborating backends a worker needs, wired consistently for
/// either `--local` (in-process, no AWS credentials required) or production
/// (`DynamoDB` + S3 + `EventBridge`) operation.
pub struct Backends {
    pub store: Arc<dyn Store>,
    pub archive: Arc<dyn Archive>,
    pub bus: Arc<dyn Bus>,
    pub rule_controller: Arc<dyn RuleController>,
}

/// Construct the in-process triple used for `--local` mode: no network
/// calls, state lives only for the process's lifetime.
#[must_use]
pub fn local_backends() -> Backends {
    Backends {
        store: Arc::new(MemoryStore::new()),
        archive: Arc::new(MemoryArchive::new()),
        bus: Arc::new(InMemoryBus::new()),
        rule_controller: Arc::new(InMemoryRuleController::new("local-rule")),
    }
}

/// Construct the AWS-backed triple from [`HarnessConfig`]. When an endpoint
/// override is configured (`LocalStack` / `DynamoDB` Local), the table is
/// created on the fly so a `docker compose up` environment works without a
/// separate provisioning step.
pub async fn aws_backends(config: &HarnessConfig) -> anyhow::Result<Backends> {
    let mut store_config = DynamoConfig::new(config.aws_region.clone(), config.table_name.clone());
    let mut archive_config = S3ArchiveConfig::new(config.aws_region.clone(), config.s3_bucket.clone());
    let mut bus_config = EventBridgeConfig::new(
        config.aws_region.clone(),
        config.event_bus_name.clone(),
        config.rule_name.clone(),
    );
    if let Some(endpoint) = &config.aws_endpoint_url {
        store_config = store_config.with_endpoint_url(endpoint.clone());
        archive_config = archive_config.with_endpoint_url(endpoint.clone());
        bus_config = bus_config.with_endpoint_url(endpoint.clone());
    }

    if let Some(endpoint) = &config.aws_endpoint_url {
        info!(endpoint = %endpoint, "custom AWS endpoint configured, auto-creating table");
        let sdk_config = evharness_aws::build_sdk_config(&store_config.aws).await;
        let client = aws_sdk_dynamodb::Client::new(&sdk_config);
        create_table(&client, &store_config.table_name).await?;
    }

    let store = Arc::new(DynamoStore::new(&store_config).await);
    let archive = Arc::new(S3Archive::new(archive_config).await);
    let bus = Arc::new(EventBridgeBus::new(bus_config.clone()).await);
    let rule_controller = Arc::new(EventBridgeRuleController::new(bus_config).await);

    Ok(Backends {
        store,
        archive,
        bus,
        rule_controller,
    })
}
