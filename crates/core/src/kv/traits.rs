use std::time::Duration;

use async_trait::async_trait;

use super::{HashFields, KvValue, Lookup, Result, WriteOutcome};

/// Key/value persistence with hash fields and key scans.
///
/// Writes report through [`WriteOutcome`] and never return an error; reads
/// propagate store faults.
#[async_trait]
pub trait KvDriver: Send + Sync {
    /// Stores a scalar value under `key`.
    ///
    /// `ttl` is accepted for interface compatibility and is not applied:
    /// stored items never expire.
    async fn set(&self, key: &str, value: &KvValue, ttl: Option<Duration>) -> WriteOutcome;

    /// Reads the scalar value stored under `key` with a consistent read.
    async fn get(&self, key: &str) -> Result<Lookup>;

    /// Returns true if an item is stored under `key`, whatever its shape.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Deletes the item stored under `key`. Deleting an absent key succeeds.
    async fn del(&self, key: &str) -> WriteOutcome;

    /// Atomically adds one to the numeric value under `key` and returns the
    /// new value. An absent key starts from zero.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Sets several hash fields of `key` in one request.
    async fn hm_set(&self, key: &str, fields: &HashFields) -> WriteOutcome;

    /// Returns true if the hash field `field` of `key` is set.
    async fn h_exists(&self, key: &str, field: &str) -> Result<bool>;

    /// Returns every hash field of `key`. An absent key has no fields.
    async fn h_get_all(&self, key: &str) -> Result<HashFields>;

    /// Returns the hash field `field` of `key`.
    async fn h_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    /// Sets the hash field `field` of `key`.
    async fn h_set(&self, key: &str, field: &str, value: &[u8]) -> WriteOutcome;

    /// Returns every key matching `pattern` (see [`super::ScanFilter`]).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
}
