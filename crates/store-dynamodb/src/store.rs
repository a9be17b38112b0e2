use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use evharness_aws::{build_sdk_config, classify_sdk_error, SdkErrorClass};
use evharness_core::{MissingRecord, Observation, RunMeta, RunStatus};
use evharness_store::error::StoreError;
use evharness_store::key::{event_sort, expectation_sort, meta_sort, run_partition};
use evharness_store::store::Store;
use tracing::{debug, error};

use crate::config::DynamoConfig;
use crate::item::{
    item_to_missing_record, item_to_observation, item_to_run_meta, missing_record_to_item,
    observation_to_item, run_meta_to_item,
};

/// `DynamoDB`-backed [`Store`].
///
/// Uses a single table with composite primary key (`pk`, `sk`) per
/// [`crate::table::create_table`]. All three row kinds (`RunMeta`,
/// `Observation`, `MissingRecord`) share the table, distinguished by their
/// sort-key prefix.
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    pub async fn new(config: &DynamoConfig) -> Self {
        let sdk_config = build_sdk_config(&config.aws).await;
        let client = Client::new(&sdk_config);
        Self {
            client,
            table_name: config.table_name.clone(),
        }
    }

    #[must_use]
    pub fn with_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    async fn get_item_by_keys(
        &self,
        pk: &str,
        sk: &str,
    ) -> Result<Option<std::collections::HashMap<String, AttributeValue>>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("pk", AttributeValue::S(pk.to_string()))
            .key("sk", AttributeValue::S(sk.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(result.item().cloned())
    }

    async fn query_prefix(
        &self,
        pk: &str,
        sk_prefix: &str,
    ) -> Result<Vec<std::collections::HashMap<String, AttributeValue>>, StoreError> {
        let mut results = Vec::new();
        let mut exclusive_start_key = None;
        loop {
            let mut query = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("pk = :pk AND begins_with(sk, :prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
                .expression_attribute_values(":prefix", AttributeValue::S(sk_prefix.to_string()));
            if let Some(key) = exclusive_start_key {
                query = query.set_exclusive_start_key(Some(key));
            }
            let response = query.send().await.map_err(map_sdk_error)?;
            results.extend(response.items().iter().cloned());
            exclusive_start_key = response.last_evaluated_key().cloned();
            if exclusive_start_key.is_none() {
                break;
            }
        }
        Ok(results)
    }
}

fn map_sdk_error<E: std::fmt::Display>(err: E) -> StoreError {
    let err_str = err.to_string();
    error!(error = %err_str, "DynamoDB operation failed");
    match classify_sdk_error(&err_str) {
        SdkErrorClass::Throttled | SdkErrorClass::Connection => StoreError::Connection(err_str),
        SdkErrorClass::Timeout => StoreError::Timeout(std::time::Duration::from_secs(30)),
        SdkErrorClass::Service => StoreError::Backend(err_str),
    }
}

#[async_trait]
impl Store for DynamoStore {
    async fn put_run_meta(&self, meta: &RunMeta) -> Result<(), StoreError> {
        let pk = run_partition(&meta.run_id);
        let sk = meta_sort();
        debug!(run_id = %meta.run_id, "writing RunMeta to DynamoDB");
        let item = run_meta_to_item(&pk, &sk, meta);
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn get_run_meta(&self, run_id: &str) -> Result<Option<RunMeta>, StoreError> {
        let pk = run_partition(run_id);
        let sk = meta_sort();
        match self.get_item_by_keys(&pk, &sk).await? {
            Some(item) => Ok(Some(item_to_run_meta(&item)?)),
            None => Ok(None),
        }
    }

    async fn transition_status(
        &self,
        run_id: &str,
        from: &[RunStatus],
        to: RunStatus,
    ) -> Result<bool, StoreError> {
        let pk = run_partition(run_id);
        let sk = meta_sort();

        let mut condition = "attribute_exists(pk) AND #status IN (".to_string();
        let placeholders: Vec<String> = (0..from.len()).map(|i| format!(":s{i}")).collect();
        condition.push_str(&placeholders.join(", "));
        condition.push(')');

        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("pk", AttributeValue::S(pk.clone()))
            .key("sk", AttributeValue::S(sk.clone()))
            .update_expression("SET #status = :to")
            .condition_expression(condition)
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":to", AttributeValue::S(to.to_string()));
        for (i, status) in from.iter().enumerate() {
            request = request
                .expression_attribute_values(format!(":s{i}"), AttributeValue::S(status.to_string()));
        }

        match request.send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_conditional_check_failed_exception() {
                    if self.get_item_by_keys(&pk, &sk).await?.is_none() {
                        Err(StoreError::NotFound(run_id.to_string()))
                    } else {
                        Ok(false)
                    }
                } else {
                    Err(map_sdk_error(service_err))
                }
            }
        }
    }

    async fn finalize_run(
        &self,
        run_id: &str,
        status: RunStatus,
        verified_at: DateTime<Utc>,
        report_location: Option<String>,
    ) -> Result<(), StoreError> {
        let pk = run_partition(run_id);
        let sk = meta_sort();

        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("pk", AttributeValue::S(pk))
            .key("sk", AttributeValue::S(sk))
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":status", AttributeValue::S(status.to_string()))
            .expression_attribute_values(":verified_at", AttributeValue::S(verified_at.to_rfc3339()));

        if let Some(location) = report_location {
            request = request
                .update_expression("SET #status = :status, verified_at = :verified_at, report_location = :loc")
                .expression_attribute_values(":loc", AttributeValue::S(location));
        } else {
            request = request
                .update_expression("SET #status = :status, verified_at = :verified_at");
        }

        request.send().await.map_err(map_sdk_error)?;
        Ok(())
    }

    async fn increment_observed_count(&self, run_id: &str, delta: i64) -> Result<i64, StoreError> {
        let pk = run_partition(run_id);
        let sk = meta_sort();

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("pk", AttributeValue::S(pk))
            .key("sk", AttributeValue::S(sk))
            .update_expression("ADD observed_count :delta")
            .expression_attribute_values(":delta", AttributeValue::N(delta.to_string()))
            .return_values(aws_sdk_dynamodb::types::ReturnValue::AllNew)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let attrs = result
            .attributes()
            .ok_or_else(|| StoreError::Backend("UpdateItem did not return attributes".into()))?;
        match attrs.get("observed_count") {
            Some(AttributeValue::N(n)) => n
                .parse()
                .map_err(|_| StoreError::Serialization("observed_count was not a valid integer".into())),
            _ => Err(StoreError::Backend("observed_count attribute missing or wrong type".into())),
        }
    }

    async fn put_observation(&self, run_id: &str, observation: &Observation) -> Result<(), StoreError> {
        let pk = run_partition(run_id);
        let sk = event_sort(observation.received_at.timestamp_millis(), &observation.event_id);
        let item = observation_to_item(&pk, &sk, observation)?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn update_observation(
        &self,
        run_id: &str,
        observation: &Observation,
    ) -> Result<(), StoreError> {
        self.put_observation(run_id, observation).await
    }

    async fn scan_observations(&self, run_id: &str) -> Result<Vec<Observation>, StoreError> {
        let pk = run_partition(run_id);
        let items = self.query_prefix(&pk, "event#").await?;
        items.iter().map(item_to_observation).collect()
    }

    async fn put_missing_record(&self, run_id: &str, record: &MissingRecord) -> Result<(), StoreError> {
        let pk = run_partition(run_id);
        let sk = expectation_sort(record.index);
        let item = missing_record_to_item(&pk, &sk, record)?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn scan_missing_records(&self, run_id: &str) -> Result<Vec<MissingRecord>, StoreError> {
        let pk = run_partition(run_id);
        let items = self.query_prefix(&pk, "expectation#").await?;
        items.iter().map(item_to_missing_record).collect()
    }
}
