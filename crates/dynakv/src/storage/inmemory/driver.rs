//! In-memory key/value driver.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::RwLock;

use dynakv_core::kv::keys::{self, VALUE_ATTRIBUTE};
use dynakv_core::kv::{
    BinaryCodec, HashFields, KvDriver, KvError, KvValue, Lookup, Result, ScanFilter, WriteOutcome,
};

use crate::storage::dynamodb::conversions::{self, Item};

/// In-memory storage backend for testing.
///
/// Items are kept in the same attribute shape the DynamoDB driver writes, so
/// encoding behaves identically. Data is not persisted and will be lost when
/// the last clone is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryDriver {
    items: Arc<RwLock<BTreeMap<String, Item>>>,
    codec: BinaryCodec,
    unavailable: Arc<AtomicBool>,
}

impl Default for InMemoryDriver {
    fn default() -> Self {
        Self::new(BinaryCodec::default())
    }
}

impl InMemoryDriver {
    /// Creates a new empty in-memory driver.
    pub fn new(codec: BinaryCodec) -> Self {
        Self {
            items: Arc::new(RwLock::new(BTreeMap::new())),
            codec,
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes every following operation fail with a store fault until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns a copy of the raw item stored under `key`.
    pub async fn raw_item(&self, key: &str) -> Option<Item> {
        self.items.read().await.get(key).cloned()
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(KvError::StoreFault("in-memory store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    async fn try_set(&self, key: &str, value: &KvValue) -> Result<()> {
        self.check_available()?;
        let encoded = conversions::encode_value(value, &self.codec);

        let mut items = self.items.write().await;
        let item = items
            .entry(key.to_string())
            .or_insert_with(|| conversions::new_item(key));
        item.insert(VALUE_ATTRIBUTE.to_string(), encoded.clone());

        if conversions::echo_matches(&encoded, Some(&*item)) {
            Ok(())
        } else {
            Err(KvError::InvalidData(
                "stored value does not match the value sent".to_string(),
            ))
        }
    }

    async fn try_del(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn try_hm_set(&self, key: &str, fields: &HashFields) -> Result<()> {
        if fields.is_empty() {
            return Err(KvError::InvalidInput("no hash fields to set".to_string()));
        }
        self.check_available()?;

        let mut items = self.items.write().await;
        let item = items
            .entry(key.to_string())
            .or_insert_with(|| conversions::new_item(key));
        for (field, value) in fields {
            item.insert(
                keys::hash_field_attribute(field),
                conversions::encode_hash_field(value, &self.codec),
            );
        }
        Ok(())
    }

    async fn try_h_set(&self, key: &str, field: &str, value: &[u8]) -> Result<()> {
        if key.is_empty() || field.is_empty() {
            return Err(KvError::InvalidInput(
                "hash key and field must not be empty".to_string(),
            ));
        }
        self.check_available()?;

        let mut items = self.items.write().await;
        items
            .entry(key.to_string())
            .or_insert_with(|| conversions::new_item(key))
            .insert(
                keys::hash_field_attribute(field),
                conversions::encode_hash_field(value, &self.codec),
            );
        Ok(())
    }
}

#[async_trait]
impl KvDriver for InMemoryDriver {
    async fn set(&self, key: &str, value: &KvValue, _ttl: Option<Duration>) -> WriteOutcome {
        self.try_set(key, value).await.into()
    }

    async fn get(&self, key: &str) -> Result<Lookup> {
        self.check_available()?;
        let items = self.items.read().await;
        conversions::item_to_lookup(items.get(key), &self.codec)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self.items.read().await.contains_key(key))
    }

    async fn del(&self, key: &str) -> WriteOutcome {
        self.try_del(key).await.into()
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.check_available()?;

        let mut items = self.items.write().await;
        let item = items
            .entry(key.to_string())
            .or_insert_with(|| conversions::new_item(key));

        let current = match item.get(VALUE_ATTRIBUTE) {
            None => 0,
            Some(AttributeValue::N(n)) => n.parse::<i64>().map_err(|_| {
                KvError::StoreFault(format!("stored number is not an integer: {n}"))
            })?,
            Some(_) => {
                return Err(KvError::StoreFault(
                    "An operand in the update expression has an incorrect data type".to_string(),
                ))
            }
        };

        let next = current.checked_add(1).ok_or_else(|| {
            KvError::StoreFault(format!("Number overflow incrementing {key}"))
        })?;
        item.insert(VALUE_ATTRIBUTE.to_string(), AttributeValue::N(next.to_string()));
        Ok(next)
    }

    async fn hm_set(&self, key: &str, fields: &HashFields) -> WriteOutcome {
        self.try_hm_set(key, fields).await.into()
    }

    async fn h_exists(&self, key: &str, field: &str) -> Result<bool> {
        self.check_available()?;
        let items = self.items.read().await;
        Ok(items
            .get(key)
            .is_some_and(|item| item.contains_key(&keys::hash_field_attribute(field))))
    }

    async fn h_get_all(&self, key: &str) -> Result<HashFields> {
        self.check_available()?;
        let items = self.items.read().await;
        conversions::item_to_hash_fields(items.get(key), &self.codec)
    }

    async fn h_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.check_available()?;
        let items = self.items.read().await;
        conversions::item_hash_field(items.get(key), field, &self.codec)
    }

    async fn h_set(&self, key: &str, field: &str, value: &[u8]) -> WriteOutcome {
        self.try_h_set(key, field, value).await.into()
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.check_available()?;
        let filter = ScanFilter::from_pattern(pattern);
        let items = self.items.read().await;
        Ok(items
            .keys()
            .filter(|key| filter.matches(key))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::primitives::Blob;
    use dynakv_core::kv::keys::KEY_ATTRIBUTE;

    fn fields(pairs: &[(&str, &str)]) -> HashFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_set_and_get_int() {
        let driver = InMemoryDriver::default();

        assert!(driver.set("counter", &KvValue::Int(41), None).await.succeeded());

        assert_eq!(
            driver.get("counter").await.unwrap(),
            Lookup::Found(KvValue::Int(41))
        );
    }

    #[tokio::test]
    async fn test_set_and_get_bytes() {
        let driver = InMemoryDriver::default();
        let value: Vec<u8> = (0u8..=255).collect();

        assert!(driver
            .set("blob", &KvValue::Bytes(value.clone()), None)
            .await
            .succeeded());

        assert_eq!(
            driver.get("blob").await.unwrap(),
            Lookup::Found(KvValue::Bytes(value))
        );
    }

    #[tokio::test]
    async fn test_stored_shape() {
        let driver = InMemoryDriver::default();
        driver.set("k", &KvValue::from("hello"), None).await.into_result().unwrap();
        driver.set("n", &KvValue::Int(5), None).await.into_result().unwrap();

        let item = driver.raw_item("k").await.unwrap();
        assert_eq!(
            item.get(KEY_ATTRIBUTE),
            Some(&AttributeValue::S("k".to_string()))
        );
        assert_eq!(
            item.get(VALUE_ATTRIBUTE),
            Some(&AttributeValue::B(Blob::new("aGVsbG8=")))
        );

        let item = driver.raw_item("n").await.unwrap();
        assert_eq!(
            item.get(VALUE_ATTRIBUTE),
            Some(&AttributeValue::N("5".to_string()))
        );
    }

    #[tokio::test]
    async fn test_raw_codec_stores_bytes_unchanged() {
        let driver = InMemoryDriver::new(BinaryCodec::new(false));
        driver.set("k", &KvValue::from("hello"), None).await.into_result().unwrap();

        let item = driver.raw_item("k").await.unwrap();
        assert_eq!(
            item.get(VALUE_ATTRIBUTE),
            Some(&AttributeValue::B(Blob::new("hello")))
        );
        assert_eq!(
            driver.get("k").await.unwrap(),
            Lookup::Found(KvValue::from("hello"))
        );
    }

    #[tokio::test]
    async fn test_ttl_is_accepted_and_ignored() {
        let driver = InMemoryDriver::default();
        let outcome = driver
            .set("k", &KvValue::from("v"), Some(Duration::from_millis(1)))
            .await;
        assert!(outcome.succeeded());

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(driver.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_absent() {
        let driver = InMemoryDriver::default();
        assert_eq!(driver.get("missing").await.unwrap(), Lookup::Absent);
    }

    #[tokio::test]
    async fn test_get_hash_only_item_is_unrecognized() {
        let driver = InMemoryDriver::default();
        driver.h_set("h", "f", b"x").await.into_result().unwrap();

        assert_eq!(driver.get("h").await.unwrap(), Lookup::Unrecognized);
        assert!(driver.exists("h").await.unwrap());
    }

    #[tokio::test]
    async fn test_del_then_exists() {
        let driver = InMemoryDriver::default();
        driver.set("k", &KvValue::from("v"), None).await.into_result().unwrap();

        assert!(driver.del("k").await.succeeded());

        assert!(!driver.exists("k").await.unwrap());
        assert!(driver.get("k").await.unwrap().is_absent());
    }

    #[tokio::test]
    async fn test_del_is_idempotent() {
        let driver = InMemoryDriver::default();
        assert!(driver.del("missing").await.succeeded());
        assert!(driver.del("missing").await.succeeded());
    }

    #[tokio::test]
    async fn test_incr() {
        let driver = InMemoryDriver::default();
        driver.set("c", &KvValue::Int(9), None).await.into_result().unwrap();

        assert_eq!(driver.incr("c").await.unwrap(), 10);
        assert_eq!(driver.get("c").await.unwrap(), Lookup::Found(KvValue::Int(10)));
    }

    #[tokio::test]
    async fn test_incr_absent_starts_at_zero() {
        let driver = InMemoryDriver::default();
        assert_eq!(driver.incr("fresh").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_incr_binary_value_is_store_fault() {
        let driver = InMemoryDriver::default();
        driver.set("b", &KvValue::from("text"), None).await.into_result().unwrap();

        assert!(driver.incr("b").await.unwrap_err().is_store_fault());
    }

    #[tokio::test]
    async fn test_incr_overflow_is_store_fault() {
        let driver = InMemoryDriver::default();
        driver.set("c", &KvValue::Int(i64::MAX), None).await.into_result().unwrap();

        assert!(driver.incr("c").await.unwrap_err().is_store_fault());
        assert_eq!(
            driver.get("c").await.unwrap(),
            Lookup::Found(KvValue::Int(i64::MAX))
        );
    }

    #[tokio::test]
    async fn test_concurrent_incr_loses_no_updates() {
        let driver = Arc::new(InMemoryDriver::default());
        driver.set("c", &KvValue::Int(100), None).await.into_result().unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let driver = Arc::clone(&driver);
                tokio::spawn(async move { driver.incr("c").await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(
            driver.get("c").await.unwrap(),
            Lookup::Found(KvValue::Int(100 + successes))
        );
    }

    #[tokio::test]
    async fn test_hm_set_and_h_get_all() {
        let driver = InMemoryDriver::default();

        assert!(driver
            .hm_set("h", &fields(&[("a", "1"), ("b", "2")]))
            .await
            .succeeded());

        assert_eq!(
            driver.h_get_all("h").await.unwrap(),
            fields(&[("a", "1"), ("b", "2")])
        );
    }

    #[tokio::test]
    async fn test_h_get_all_ignores_scalar_value() {
        let driver = InMemoryDriver::default();
        driver.set("h", &KvValue::Int(1), None).await.into_result().unwrap();
        driver.h_set("h", "a", b"1").await.into_result().unwrap();

        assert_eq!(driver.h_get_all("h").await.unwrap(), fields(&[("a", "1")]));
    }

    #[tokio::test]
    async fn test_h_get_all_absent() {
        let driver = InMemoryDriver::default();
        assert!(driver.h_get_all("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hm_set_empty_fields_fails() {
        let driver = InMemoryDriver::default();

        let outcome = driver.hm_set("h", &HashFields::new()).await;

        assert!(!outcome.succeeded());
        assert!(matches!(outcome.error(), Some(KvError::InvalidInput(_))));
        assert!(driver.is_empty().await);
    }

    #[tokio::test]
    async fn test_h_set_h_get_h_exists() {
        let driver = InMemoryDriver::default();

        assert!(driver.h_set("h", "f", b"value").await.succeeded());

        assert_eq!(driver.h_get("h", "f").await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(driver.h_get("h", "other").await.unwrap(), None);
        assert!(driver.h_exists("h", "f").await.unwrap());
        assert!(!driver.h_exists("h", "other").await.unwrap());
        assert!(!driver.h_exists("missing", "f").await.unwrap());
    }

    #[tokio::test]
    async fn test_h_set_empty_key_or_field_fails_without_mutation() {
        let driver = InMemoryDriver::default();

        assert!(!driver.h_set("k", "", b"x").await.succeeded());
        assert!(!driver.h_set("", "f", b"x").await.succeeded());

        assert!(driver.is_empty().await);
    }

    #[tokio::test]
    async fn test_keys_prefix_and_substring() {
        let driver = InMemoryDriver::default();
        for key in ["foo", "foobar", "barfoo", "bar"] {
            driver.set(key, &KvValue::Int(1), None).await.into_result().unwrap();
        }

        assert_eq!(driver.keys("foo*").await.unwrap(), vec!["foo", "foobar"]);
        assert_eq!(
            driver.keys("foo").await.unwrap(),
            vec!["barfoo", "foo", "foobar"]
        );
        assert!(driver.keys("*foo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_writes_return_failure() {
        let driver = InMemoryDriver::default();
        driver.set_unavailable(true);

        let outcome = driver.set("k", &KvValue::from("v"), None).await;
        assert!(!outcome.succeeded());
        assert!(outcome.error().is_some_and(KvError::is_store_fault));

        assert!(!driver.del("k").await.succeeded());
        assert!(!driver.h_set("k", "f", b"v").await.succeeded());
        assert!(!driver.hm_set("k", &fields(&[("a", "1")])).await.succeeded());
    }

    #[tokio::test]
    async fn test_unavailable_reads_propagate_fault() {
        let driver = InMemoryDriver::default();
        driver.set_unavailable(true);

        assert!(driver.get("k").await.unwrap_err().is_store_fault());
        assert!(driver.exists("k").await.unwrap_err().is_store_fault());
        assert!(driver.incr("k").await.unwrap_err().is_store_fault());
        assert!(driver.h_get("k", "f").await.unwrap_err().is_store_fault());
        assert!(driver.h_get_all("k").await.unwrap_err().is_store_fault());
        assert!(driver.h_exists("k", "f").await.unwrap_err().is_store_fault());
        assert!(driver.keys("*").await.unwrap_err().is_store_fault());
    }
}
