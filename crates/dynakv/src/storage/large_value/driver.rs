//! Driver decorator that splits oversized values across several keys.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use dynakv_core::kv::{HashFields, KvDriver, KvError, KvValue, Lookup, Result, WriteOutcome};

use super::map;

/// Default chunk width in bytes.
pub const DEFAULT_MAX_VALUE_WIDTH: usize = 300_000;

/// Large-value decorator for any [`KvDriver`].
///
/// Values wider than `max_value_width` bytes are written as numbered chunks
/// plus a map under the original key. Reads reassemble them transparently.
pub struct LargeValueDriver<D: KvDriver> {
    inner: Arc<D>,
    max_value_width: NonZeroUsize,
}

impl<D: KvDriver> LargeValueDriver<D> {
    pub fn new(inner: Arc<D>, max_value_width: NonZeroUsize) -> Self {
        Self {
            inner,
            max_value_width,
        }
    }

    pub fn inner(&self) -> &Arc<D> {
        &self.inner
    }

    pub fn max_value_width(&self) -> NonZeroUsize {
        self.max_value_width
    }

    /// Chunk indices referenced by the value currently stored under `key`.
    async fn stored_map(&self, key: &str) -> Result<Option<Vec<usize>>> {
        match self.inner.get(key).await? {
            Lookup::Found(KvValue::Bytes(bytes)) => map::decode_map(&bytes),
            _ => Ok(None),
        }
    }

    /// Deletes chunks of `key` listed in `indices`, logging failures.
    async fn remove_chunks(&self, key: &str, indices: impl IntoIterator<Item = usize>) {
        for index in indices {
            let outcome = self.inner.del(&map::chunk_key(key, index)).await;
            if let Some(err) = outcome.error() {
                tracing::warn!(key, index, error = %err, "Failed to remove chunk");
            }
        }
    }

    /// Reads the map of the value being replaced.
    ///
    /// A store fault aborts the write, since the new chunks could otherwise
    /// land on indices a live map still references.
    async fn previous_map(&self, key: &str) -> Result<Vec<usize>> {
        match self.stored_map(key).await {
            Ok(previous) => Ok(previous.unwrap_or_default()),
            Err(err) if err.is_store_fault() => Err(err),
            Err(err) => {
                tracing::debug!(key, error = %err, "Ignoring unreadable chunk map");
                Ok(Vec::new())
            }
        }
    }

    async fn try_set(&self, key: &str, value: &KvValue, ttl: Option<Duration>) -> Result<()> {
        let previous = self.previous_map(key).await?;

        let bytes = match value {
            KvValue::Bytes(bytes) if bytes.len() > self.max_value_width.get() => bytes,
            _ => {
                self.inner.set(key, value, ttl).await.into_result()?;
                self.remove_chunks(key, previous).await;
                return Ok(());
            }
        };

        let chunks = map::split(bytes, self.max_value_width.get());
        let indices = map::fresh_indices(&previous, chunks.len());

        for (written, (index, chunk)) in indices.iter().zip(&chunks).enumerate() {
            let outcome = self
                .inner
                .set(&map::chunk_key(key, *index), &KvValue::from(*chunk), ttl)
                .await;
            if let Err(err) = outcome.into_result() {
                self.remove_chunks(key, indices[..written].iter().copied()).await;
                return Err(err);
            }
        }

        let map_value = KvValue::Bytes(map::encode_map(&indices)?);
        if let Err(err) = self.inner.set(key, &map_value, ttl).await.into_result() {
            self.remove_chunks(key, indices.iter().copied()).await;
            return Err(err);
        }

        tracing::debug!(key, chunks = chunks.len(), size = bytes.len(), "Stored large value");
        self.remove_chunks(key, previous.into_iter().filter(|i| !indices.contains(i)))
            .await;
        Ok(())
    }

    async fn try_del(&self, key: &str) -> Result<()> {
        if let Some(indices) = self.stored_map(key).await? {
            for index in indices {
                self.inner
                    .del(&map::chunk_key(key, index))
                    .await
                    .into_result()?;
            }
        }
        self.inner.del(key).await.into_result()
    }
}

#[async_trait]
impl<D: KvDriver> KvDriver for LargeValueDriver<D> {
    async fn set(&self, key: &str, value: &KvValue, ttl: Option<Duration>) -> WriteOutcome {
        self.try_set(key, value, ttl).await.into()
    }

    async fn get(&self, key: &str) -> Result<Lookup> {
        let bytes = match self.inner.get(key).await? {
            Lookup::Found(KvValue::Bytes(bytes)) => bytes,
            other => return Ok(other),
        };

        let Some(indices) = map::decode_map(&bytes)? else {
            return Ok(Lookup::Found(KvValue::Bytes(bytes)));
        };

        let mut value = Vec::new();
        for index in indices {
            match self.inner.get(&map::chunk_key(key, index)).await? {
                Lookup::Found(KvValue::Bytes(chunk)) => value.extend_from_slice(&chunk),
                _ => {
                    return Err(KvError::InvalidData(format!(
                        "chunk {index} of {key} is missing"
                    )))
                }
            }
        }

        Ok(Lookup::Found(KvValue::Bytes(value)))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn del(&self, key: &str) -> WriteOutcome {
        self.try_del(key).await.into()
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.inner.incr(key).await
    }

    async fn hm_set(&self, key: &str, fields: &HashFields) -> WriteOutcome {
        self.inner.hm_set(key, fields).await
    }

    async fn h_exists(&self, key: &str, field: &str) -> Result<bool> {
        self.inner.h_exists(key, field).await
    }

    async fn h_get_all(&self, key: &str) -> Result<HashFields> {
        self.inner.h_get_all(key).await
    }

    async fn h_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.inner.h_get(key, field).await
    }

    async fn h_set(&self, key: &str, field: &str, value: &[u8]) -> WriteOutcome {
        self.inner.h_set(key, field, value).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut keys = self.inner.keys(pattern).await?;
        keys.retain(|key| !map::is_chunk_key(key));
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::inmemory::InMemoryDriver;

    fn decorated(width: usize) -> (Arc<InMemoryDriver>, LargeValueDriver<InMemoryDriver>) {
        let inner = Arc::new(InMemoryDriver::default());
        let driver = LargeValueDriver::new(Arc::clone(&inner), NonZeroUsize::new(width).unwrap());
        (inner, driver)
    }

    fn bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[tokio::test]
    async fn test_small_value_passes_through() {
        let (inner, driver) = decorated(8);

        assert!(driver.set("k", &KvValue::from("short"), None).await.succeeded());

        assert_eq!(inner.len().await, 1);
        assert_eq!(
            inner.get("k").await.unwrap(),
            Lookup::Found(KvValue::from("short"))
        );
        assert_eq!(
            driver.get("k").await.unwrap(),
            Lookup::Found(KvValue::from("short"))
        );
    }

    #[tokio::test]
    async fn test_value_at_width_is_not_split() {
        let (inner, driver) = decorated(8);

        driver.set("k", &KvValue::Bytes(bytes(8)), None).await.into_result().unwrap();

        assert_eq!(inner.len().await, 1);
    }

    #[tokio::test]
    async fn test_large_value_is_chunked_and_reassembled() {
        let (inner, driver) = decorated(8);
        let value = bytes(20);

        assert!(driver
            .set("doc", &KvValue::Bytes(value.clone()), None)
            .await
            .succeeded());

        assert_eq!(inner.len().await, 4);
        assert_eq!(
            inner.get("doc").await.unwrap(),
            Lookup::Found(KvValue::Bytes(map::encode_map(&[0, 1, 2]).unwrap()))
        );
        assert_eq!(
            inner.get(&map::chunk_key("doc", 2)).await.unwrap(),
            Lookup::Found(KvValue::Bytes(value[16..].to_vec()))
        );
        assert_eq!(
            driver.get("doc").await.unwrap(),
            Lookup::Found(KvValue::Bytes(value))
        );
    }

    #[tokio::test]
    async fn test_integers_are_never_split() {
        let (inner, driver) = decorated(1);

        driver.set("n", &KvValue::Int(123_456), None).await.into_result().unwrap();

        assert_eq!(inner.len().await, 1);
        assert_eq!(driver.incr("n").await.unwrap(), 123_457);
    }

    #[tokio::test]
    async fn test_overwrite_with_smaller_value_removes_stale_chunks() {
        let (inner, driver) = decorated(4);

        driver.set("k", &KvValue::Bytes(bytes(16)), None).await.into_result().unwrap();
        assert_eq!(inner.len().await, 5);

        driver.set("k", &KvValue::Bytes(bytes(6)), None).await.into_result().unwrap();
        assert_eq!(inner.len().await, 3);

        driver.set("k", &KvValue::from("ab"), None).await.into_result().unwrap();
        assert_eq!(inner.len().await, 1);
        assert_eq!(
            driver.get("k").await.unwrap(),
            Lookup::Found(KvValue::from("ab"))
        );
    }

    #[tokio::test]
    async fn test_missing_chunk_is_invalid_data() {
        let (inner, driver) = decorated(4);
        driver.set("k", &KvValue::Bytes(bytes(10)), None).await.into_result().unwrap();

        inner.del(&map::chunk_key("k", 1)).await.into_result().unwrap();

        assert!(matches!(
            driver.get("k").await,
            Err(KvError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_del_removes_chunks() {
        let (inner, driver) = decorated(4);
        driver.set("k", &KvValue::Bytes(bytes(10)), None).await.into_result().unwrap();

        assert!(driver.del("k").await.succeeded());

        assert!(inner.is_empty().await);
        assert!(!driver.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_hides_chunks() {
        let (_inner, driver) = decorated(4);
        driver.set("big", &KvValue::Bytes(bytes(10)), None).await.into_result().unwrap();
        driver.set("bit", &KvValue::from("x"), None).await.into_result().unwrap();

        assert_eq!(driver.keys("bi*").await.unwrap(), vec!["big", "bit"]);
    }

    #[tokio::test]
    async fn test_hash_operations_delegate() {
        let (inner, driver) = decorated(1);

        assert!(driver.h_set("h", "field", b"a long hash value").await.succeeded());

        assert_eq!(
            inner.h_get("h", "field").await.unwrap(),
            Some(b"a long hash value".to_vec())
        );
        assert!(driver.h_exists("h", "field").await.unwrap());
        assert_eq!(driver.h_get_all("h").await.unwrap().len(), 1);
    }

    /// Delegates to an in-memory driver, failing one chosen `set` call.
    #[derive(Default)]
    struct FlakyDriver {
        inner: InMemoryDriver,
        sets_before_failure: std::sync::Mutex<Option<usize>>,
    }

    impl FlakyDriver {
        fn fail_set_after(&self, successful_sets: usize) {
            *self.sets_before_failure.lock().unwrap() = Some(successful_sets);
        }

        fn should_fail(&self) -> bool {
            let mut countdown = self.sets_before_failure.lock().unwrap();
            match countdown.as_mut() {
                Some(0) => {
                    *countdown = None;
                    true
                }
                Some(left) => {
                    *left -= 1;
                    false
                }
                None => false,
            }
        }
    }

    #[async_trait]
    impl KvDriver for FlakyDriver {
        async fn set(&self, key: &str, value: &KvValue, ttl: Option<Duration>) -> WriteOutcome {
            if self.should_fail() {
                return WriteOutcome::failure(KvError::StoreFault("write rejected".to_string()));
            }
            self.inner.set(key, value, ttl).await
        }

        async fn get(&self, key: &str) -> Result<Lookup> {
            self.inner.get(key).await
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            self.inner.exists(key).await
        }

        async fn del(&self, key: &str) -> WriteOutcome {
            self.inner.del(key).await
        }

        async fn incr(&self, key: &str) -> Result<i64> {
            self.inner.incr(key).await
        }

        async fn hm_set(&self, key: &str, fields: &HashFields) -> WriteOutcome {
            self.inner.hm_set(key, fields).await
        }

        async fn h_exists(&self, key: &str, field: &str) -> Result<bool> {
            self.inner.h_exists(key, field).await
        }

        async fn h_get_all(&self, key: &str) -> Result<HashFields> {
            self.inner.h_get_all(key).await
        }

        async fn h_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
            self.inner.h_get(key, field).await
        }

        async fn h_set(&self, key: &str, field: &str, value: &[u8]) -> WriteOutcome {
            self.inner.h_set(key, field, value).await
        }

        async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
            self.inner.keys(pattern).await
        }
    }

    fn flaky(width: usize) -> (Arc<FlakyDriver>, LargeValueDriver<FlakyDriver>) {
        let inner = Arc::new(FlakyDriver::default());
        let driver = LargeValueDriver::new(Arc::clone(&inner), NonZeroUsize::new(width).unwrap());
        (inner, driver)
    }

    #[tokio::test]
    async fn test_failed_chunk_during_overwrite_keeps_previous_value() {
        let (inner, driver) = flaky(4);
        driver
            .set("doc", &KvValue::from("AAAABBBBCCCCDDDD"), None)
            .await
            .into_result()
            .unwrap();

        inner.fail_set_after(2);
        let outcome = driver.set("doc", &KvValue::from("xxxxyyyyzzzzwwww"), None).await;

        assert!(!outcome.succeeded());
        assert_eq!(
            driver.get("doc").await.unwrap(),
            Lookup::Found(KvValue::from("AAAABBBBCCCCDDDD"))
        );
        assert_eq!(inner.inner.len().await, 5);
    }

    #[tokio::test]
    async fn test_failed_map_write_keeps_previous_value() {
        let (inner, driver) = flaky(4);
        driver
            .set("doc", &KvValue::from("AAAABBBBCCCC"), None)
            .await
            .into_result()
            .unwrap();

        inner.fail_set_after(3);
        let outcome = driver.set("doc", &KvValue::from("xxxxyyyyzzzz"), None).await;

        assert!(!outcome.succeeded());
        assert_eq!(
            driver.get("doc").await.unwrap(),
            Lookup::Found(KvValue::from("AAAABBBBCCCC"))
        );
        assert_eq!(inner.inner.len().await, 4);
    }

    #[tokio::test]
    async fn test_overwrite_after_failure_succeeds() {
        let (inner, driver) = flaky(4);
        driver
            .set("doc", &KvValue::from("AAAABBBBCCCC"), None)
            .await
            .into_result()
            .unwrap();
        inner.fail_set_after(1);
        assert!(!driver.set("doc", &KvValue::from("xxxxyyyyzzzz"), None).await.succeeded());

        assert!(driver
            .set("doc", &KvValue::from("xxxxyyyyzzzz"), None)
            .await
            .succeeded());

        assert_eq!(
            driver.get("doc").await.unwrap(),
            Lookup::Found(KvValue::from("xxxxyyyyzzzz"))
        );
        assert_eq!(inner.inner.len().await, 4);
    }

    #[tokio::test]
    async fn test_failed_chunk_write_fails_set() {
        let (inner, driver) = decorated(4);
        inner.set_unavailable(true);

        let outcome = driver.set("k", &KvValue::Bytes(bytes(10)), None).await;

        assert!(!outcome.succeeded());
        inner.set_unavailable(false);
        assert!(inner.is_empty().await);
    }
}
