use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::{Result, StoreError};

/// Uniform interface over the shared key-value store.
///
/// Every cross-request coordination point lives behind this trait. Counter and
/// score mutations (`incr`, `zincrby`, `set_if_absent`) must be atomic in the
/// backend; everything else is plain get/set and callers accept last-writer-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a plain value. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrites a plain value, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;

    /// Writes the value only if no live entry exists. Returns `true` when written.
    async fn set_if_absent(&self, key: &str, value: Value, ttl: Option<Duration>)
        -> Result<bool>;

    /// Deletes a plain value. Returns `true` if something was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Atomically increments an integer value; an absent key counts as zero.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Sorted-set insert: sets a member's score, creating it when absent.
    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<()>;

    /// Atomically adds `delta` to a member's score and returns the new score.
    async fn zincrby(&self, key: &str, member: &str, delta: i64) -> Result<i64>;

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>>;

    /// Removes a member only while its score equals `expected`. Returns `true`
    /// if it was removed.
    async fn zrem_if_score(&self, key: &str, member: &str, expected: i64) -> Result<bool>;

    /// Highest scores first; equal scores keep member creation order.
    async fn zrange_rev(&self, key: &str, limit: usize) -> Result<Vec<(String, i64)>>;

    /// Live plain keys beginning with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Reads and deserializes a plain value.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
            StoreError::CorruptValue {
                key: key.to_string(),
                message: e.to_string(),
            }
            .into()
        }),
    }
}

/// Serializes and writes a plain value.
pub async fn set_typed<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<()> {
    let value = serde_json::to_value(value)?;
    store.set(key, value, ttl).await
}

/// Interprets a stored value as an integer, accepting numeric strings.
pub fn value_as_i64(key: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| {
            StoreError::CorruptValue {
                key: key.to_string(),
                message: format!("{} is not an integer", n),
            }
            .into()
        }),
        Value::String(s) => s.trim().parse::<i64>().map_err(|e| {
            StoreError::CorruptValue {
                key: key.to_string(),
                message: e.to_string(),
            }
            .into()
        }),
        other => Err(StoreError::CorruptValue {
            key: key.to_string(),
            message: format!("expected integer, found {}", other),
        }
        .into()),
    }
}
