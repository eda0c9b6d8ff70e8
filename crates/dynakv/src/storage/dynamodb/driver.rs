//! DynamoDB key/value driver.
//!
//! Implements `KvDriver` from `dynakv_core::kv` over a single table keyed by
//! the string attribute `key`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use futures_util::{Stream, TryStreamExt};

use dynakv_core::kv::keys::{self, KEY_ATTRIBUTE, VALUE_ATTRIBUTE};
use dynakv_core::kv::{
    BinaryCodec, HashFields, KvDriver, KvError, KvValue, Lookup, Result, ScanFilter, WriteOutcome,
};

use super::conversions::{self, Item};
use super::error::{
    map_delete_item_error, map_get_item_error, map_scan_error, map_update_item_error,
};

/// Number of items evaluated per scan request.
pub const SCAN_PAGE_SIZE: i32 = 1_000;

/// One page of a key scan.
#[derive(Debug, Clone, Default)]
pub struct KeyPage {
    pub keys: Vec<String>,
    /// Cursor for the next page, `None` once the table is exhausted.
    pub next: Option<Item>,
}

/// DynamoDB-backed key/value driver.
#[derive(Debug, Clone)]
pub struct DynamoDbDriver {
    client: Client,
    table_name: String,
    codec: BinaryCodec,
}

impl DynamoDbDriver {
    /// Creates a driver for `table_name`. The codec is fixed for the driver's
    /// lifetime.
    pub fn new(client: Client, table_name: impl Into<String>, codec: BinaryCodec) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            codec,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn codec(&self) -> BinaryCodec {
        self.codec
    }

    /// Fetches one page of keys matching `pattern`.
    ///
    /// `limit` bounds the number of items the store evaluates for this page,
    /// before filtering, so a page can be empty while `next` is still set.
    pub async fn keys_page(
        &self,
        pattern: &str,
        cursor: Option<Item>,
        limit: Option<i32>,
    ) -> Result<KeyPage> {
        let filter = ScanFilter::from_pattern(pattern);
        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .projection_expression("#K")
            .filter_expression(filter.filter_expression())
            .expression_attribute_names("#K", KEY_ATTRIBUTE)
            .expression_attribute_values(":v", AttributeValue::S(filter.operand().to_string()))
            .set_exclusive_start_key(cursor)
            .set_limit(limit)
            .send()
            .await
            .map_err(|e| map_scan_error(e, &self.table_name))?;

        let keys = conversions::scanned_keys(output.items());
        let next = output
            .last_evaluated_key()
            .filter(|key| !key.is_empty())
            .cloned();

        tracing::trace!(
            table = %self.table_name,
            matched = keys.len(),
            more = next.is_some(),
            "Scanned key page"
        );

        Ok(KeyPage { keys, next })
    }

    /// Streams every key matching `pattern`, fetching pages as the stream is
    /// polled.
    pub fn keys_stream<'a>(
        &'a self,
        pattern: &'a str,
    ) -> impl Stream<Item = Result<String>> + 'a {
        paginate_keys(move |cursor| self.keys_page(pattern, cursor, Some(SCAN_PAGE_SIZE)))
    }

    async fn get_item(&self, key: &str, projection: Option<&str>) -> Result<Option<Item>> {
        let mut request = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, conversions::key_value(key))
            .consistent_read(true);

        if let Some(attribute) = projection {
            request = request
                .projection_expression("#F")
                .expression_attribute_names("#F", attribute);
        }

        let output = request
            .send()
            .await
            .map_err(|e| map_get_item_error(e, &self.table_name, key))?;

        Ok(output.item)
    }

    async fn try_set(&self, key: &str, value: &KvValue) -> Result<()> {
        let encoded = conversions::encode_value(value, &self.codec);

        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, conversions::key_value(key))
            .update_expression("SET #VALUE = :val1")
            .expression_attribute_names("#VALUE", VALUE_ATTRIBUTE)
            .expression_attribute_values(":val1", encoded.clone())
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| map_update_item_error(e, &self.table_name, key))?;

        if conversions::echo_matches(&encoded, output.attributes()) {
            Ok(())
        } else {
            Err(KvError::InvalidData(
                "stored value does not match the value sent".to_string(),
            ))
        }
    }

    async fn try_del(&self, key: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, conversions::key_value(key))
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, &self.table_name, key))?;

        Ok(())
    }

    async fn try_hm_set(&self, key: &str, fields: &HashFields) -> Result<()> {
        let parts = conversions::hash_fields_update(fields, &self.codec)
            .ok_or_else(|| KvError::InvalidInput("no hash fields to set".to_string()))?;

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, conversions::key_value(key))
            .update_expression(parts.expression)
            .set_expression_attribute_names(Some(parts.names))
            .set_expression_attribute_values(Some(parts.values))
            .send()
            .await
            .map_err(|e| map_update_item_error(e, &self.table_name, key))?;

        Ok(())
    }

    async fn try_h_set(&self, key: &str, field: &str, value: &[u8]) -> Result<()> {
        if key.is_empty() || field.is_empty() {
            return Err(KvError::InvalidInput(
                "hash key and field must not be empty".to_string(),
            ));
        }

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, conversions::key_value(key))
            .update_expression("SET #F = :v")
            .expression_attribute_names("#F", keys::hash_field_attribute(field))
            .expression_attribute_values(":v", conversions::encode_hash_field(value, &self.codec))
            .send()
            .await
            .map_err(|e| map_update_item_error(e, &self.table_name, key))?;

        Ok(())
    }
}

/// Yields the keys of every page returned by `fetch`, passing each page's
/// cursor to the next call until a page comes back without one.
pub fn paginate_keys<'a, F, Fut>(mut fetch: F) -> impl Stream<Item = Result<String>> + 'a
where
    F: FnMut(Option<Item>) -> Fut + 'a,
    Fut: Future<Output = Result<KeyPage>> + 'a,
{
    async_stream::try_stream! {
        let mut cursor = None;
        loop {
            let page = fetch(cursor.take()).await?;
            for key in page.keys {
                yield key;
            }
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
    }
}

/// Logs a failed write and passes the outcome through.
fn report(operation: &'static str, key: &str, outcome: WriteOutcome) -> WriteOutcome {
    match outcome.error() {
        Some(err) if err.is_store_fault() => {
            tracing::warn!(operation, key, error = %err, "DynamoDB write failed");
        }
        Some(err) => {
            tracing::debug!(operation, key, error = %err, "DynamoDB write rejected");
        }
        None => {
            tracing::trace!(operation, key, "DynamoDB write");
        }
    }
    outcome
}

#[async_trait]
impl KvDriver for DynamoDbDriver {
    async fn set(&self, key: &str, value: &KvValue, ttl: Option<Duration>) -> WriteOutcome {
        if let Some(ttl) = ttl {
            tracing::trace!(key, ttl_secs = ttl.as_secs(), "TTL ignored, items do not expire");
        }
        report("SET", key, self.try_set(key, value).await.into())
    }

    async fn get(&self, key: &str) -> Result<Lookup> {
        let item = self.get_item(key, None).await?;
        tracing::trace!(key, found = item.is_some(), "GET");
        conversions::item_to_lookup(item.as_ref(), &self.codec)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let item = self.get_item(key, None).await?;
        tracing::trace!(key, found = item.is_some(), "EXISTS");
        Ok(item.is_some())
    }

    async fn del(&self, key: &str) -> WriteOutcome {
        report("DEL", key, self.try_del(key).await.into())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, conversions::key_value(key))
            .update_expression("ADD #VALUE :one")
            .expression_attribute_names("#VALUE", VALUE_ATTRIBUTE)
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| map_update_item_error(e, &self.table_name, key))?;

        let value = conversions::counter_from_attributes(output.attributes())?;
        tracing::trace!(key, value, "INCR");
        Ok(value)
    }

    async fn hm_set(&self, key: &str, fields: &HashFields) -> WriteOutcome {
        report("HMSET", key, self.try_hm_set(key, fields).await.into())
    }

    async fn h_exists(&self, key: &str, field: &str) -> Result<bool> {
        let attribute = keys::hash_field_attribute(field);
        let item = self.get_item(key, Some(&attribute)).await?;
        Ok(item.is_some_and(|i| i.contains_key(&attribute)))
    }

    async fn h_get_all(&self, key: &str) -> Result<HashFields> {
        let item = self.get_item(key, None).await?;
        conversions::item_to_hash_fields(item.as_ref(), &self.codec)
    }

    async fn h_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let attribute = keys::hash_field_attribute(field);
        let item = self.get_item(key, Some(&attribute)).await?;
        conversions::item_hash_field(item.as_ref(), field, &self.codec)
    }

    async fn h_set(&self, key: &str, field: &str, value: &[u8]) -> WriteOutcome {
        report("HSET", key, self.try_h_set(key, field, value).await.into())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let keys: Vec<String> = self.keys_stream(pattern).try_collect().await?;
        tracing::trace!(pattern, count = keys.len(), "KEYS");
        Ok(keys)
    }
}
