//! DynamoDB implementation of the lock store
//!
//! Each lock is one item keyed by the `Name` string attribute, with a
//! `Created` number attribute holding Unix milliseconds. Acquisition is a
//! single conditional `UpdateItem`:
//!
//! ```text
//! ConditionExpression: attribute_not_exists(#N) OR #C < :cutoff
//! UpdateExpression:    SET #C = :now
//! ```
//!
//! where `:cutoff = now - ttl`. DynamoDB evaluates the condition and the
//! write atomically, which is what makes the lock safe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType,
};
use tracing::{debug, info, warn};

use condlock_core::{Clock, LockRecord, Store, StoreError, TokioClock};

use crate::config::DynamoStoreConfig;
use crate::error::DynamoError;

/// Key attribute
pub const NAME_ATTRIBUTE: &str = "Name";
/// Timestamp attribute (Unix milliseconds)
pub const CREATED_ATTRIBUTE: &str = "Created";

pub const ACQUIRE_CONDITION: &str = "attribute_not_exists(#N) OR #C < :cutoff";
pub const ACQUIRE_UPDATE: &str = "SET #C = :now";

/// Store backed by a DynamoDB table
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
    table_name: String,
    clock: Arc<dyn Clock>,
}

impl DynamoStore {
    /// Build an SDK client from `config` and the ambient AWS environment
    pub async fn connect(config: &DynamoStoreConfig) -> Result<Self, DynamoError> {
        config.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = config.region.as_deref().filter(|r| !r.trim().is_empty()) {
            loader = loader.region(Region::new(region.trim().to_string()));
        }
        match config.endpoint_url()? {
            Some(url) => {
                info!(endpoint = %url, "Using DynamoDB endpoint override");
                loader = loader.endpoint_url(url);
            }
            None if config.disable_ssl => {
                warn!("disable_ssl has no effect without an endpoint override");
            }
            None => {}
        }

        let sdk_config = loader.load().await;
        Ok(Self::from_client(Client::new(&sdk_config), &config.table_name))
    }

    pub fn from_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            clock: Arc::new(TokioClock),
        }
    }

    /// Use `clock` for the `:now` and `:cutoff` timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Create the lock table with on-demand billing.
    ///
    /// Intended for DynamoDB Local and test setups; production tables are
    /// usually provisioned separately.
    pub async fn create_table(&self) -> Result<(), DynamoError> {
        let key_attribute = AttributeDefinition::builder()
            .attribute_name(NAME_ATTRIBUTE)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(anyhow::Error::from)?;
        let key_schema = KeySchemaElement::builder()
            .attribute_name(NAME_ATTRIBUTE)
            .key_type(KeyType::Hash)
            .build()
            .map_err(anyhow::Error::from)?;

        self.client
            .create_table()
            .table_name(&self.table_name)
            .attribute_definitions(key_attribute)
            .key_schema(key_schema)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("CreateTable failed: {}", DisplayErrorContext(&e)))?;

        info!(table = %self.table_name, "Lock table created");
        Ok(())
    }
}

/// `:now` and `:cutoff` values for an acquire at `now_millis`
pub fn acquire_window(now_millis: i64, ttl: Duration) -> (i64, i64) {
    (now_millis, LockRecord::stale_before(now_millis, ttl))
}

fn number(value: i64) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

/// Map an `UpdateItem` failure onto the store contract.
///
/// Only a failed condition check means the lock is held.
fn classify_update_error(err: SdkError<UpdateItemError>) -> StoreError {
    let locked = err
        .as_service_error()
        .is_some_and(UpdateItemError::is_conditional_check_failed_exception);
    if locked {
        StoreError::Locked
    } else {
        StoreError::fault(anyhow::anyhow!(
            "UpdateItem failed: {}",
            DisplayErrorContext(&err)
        ))
    }
}

#[async_trait]
impl Store for DynamoStore {
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<(), StoreError> {
        let (now, cutoff) = acquire_window(self.clock.unix_millis(), ttl);

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key(NAME_ATTRIBUTE, AttributeValue::S(name.to_string()))
            .expression_attribute_names("#N", NAME_ATTRIBUTE)
            .expression_attribute_names("#C", CREATED_ATTRIBUTE)
            .expression_attribute_values(":now", number(now))
            .expression_attribute_values(":cutoff", number(cutoff))
            .condition_expression(ACQUIRE_CONDITION)
            .update_expression(ACQUIRE_UPDATE)
            .send()
            .await
            .map_err(classify_update_error)?;

        debug!(name = %name, created = now, "Lock item written");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(NAME_ATTRIBUTE, AttributeValue::S(name.to_string()))
            .send()
            .await
            .map_err(|e| {
                StoreError::fault(anyhow::anyhow!(
                    "DeleteItem failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(name = %name, "Lock item deleted");
        Ok(())
    }
}
