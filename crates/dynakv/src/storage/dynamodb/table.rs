//! Key/value table provisioning.

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client;
use dynakv_core::kv::keys::KEY_ATTRIBUTE;
use dynakv_core::kv::{KvError, Result};

use super::error::{map_create_table_error, map_describe_table_error};

const ACTIVATION_ATTEMPTS: usize = 60;
const ACTIVATION_DELAY: Duration = Duration::from_secs(2);

/// Current state of a key/value table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TableSummary {
    pub name: String,
    pub status: String,
    pub item_count: Option<i64>,
    /// True when the table's hash key is the `key` string attribute.
    pub key_schema_matches: bool,
}

/// Creates the key/value table (hash key `key` of type `S`, on-demand
/// billing) and waits for it to become active.
pub async fn create_table(client: &Client, table_name: &str) -> Result<()> {
    let key_schema = KeySchemaElement::builder()
        .attribute_name(KEY_ATTRIBUTE)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| KvError::Configuration(e.to_string()))?;

    let attribute_definition = AttributeDefinition::builder()
        .attribute_name(KEY_ATTRIBUTE)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| KvError::Configuration(e.to_string()))?;

    client
        .create_table()
        .table_name(table_name)
        .key_schema(key_schema)
        .attribute_definitions(attribute_definition)
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .map_err(|e| map_create_table_error(e, table_name))?;

    tracing::info!(table = %table_name, "Created table, waiting for it to become active");
    wait_for_table_active(client, table_name).await
}

/// Describes the table, returning `None` if it does not exist.
pub async fn describe_table(client: &Client, table_name: &str) -> Result<Option<TableSummary>> {
    let output = match client.describe_table().table_name(table_name).send().await {
        Ok(output) => output,
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|e| e.is_resource_not_found_exception()) =>
        {
            return Ok(None);
        }
        Err(err) => return Err(map_describe_table_error(err)),
    };

    let Some(table) = output.table() else {
        return Ok(None);
    };

    let key_schema_matches = table.key_schema().iter().any(|element| {
        element.attribute_name() == KEY_ATTRIBUTE && *element.key_type() == KeyType::Hash
    });

    Ok(Some(TableSummary {
        name: table.table_name().unwrap_or(table_name).to_string(),
        status: table
            .table_status()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string()),
        item_count: table.item_count(),
        key_schema_matches,
    }))
}

async fn wait_for_table_active(client: &Client, table_name: &str) -> Result<()> {
    for _ in 0..ACTIVATION_ATTEMPTS {
        if let Some(summary) = describe_table(client, table_name).await? {
            if summary.status == TableStatus::Active.as_str() {
                return Ok(());
            }
        }
        tokio::time::sleep(ACTIVATION_DELAY).await;
    }

    Err(KvError::StoreFault(format!(
        "Timeout waiting for table {table_name} to become active"
    )))
}
