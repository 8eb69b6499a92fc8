//! In-process store adapter.
//!
//! Backs tests and single-node development runs. Each method takes the lock
//! once, so the atomic primitives are atomic with respect to each other.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use super::store_traits::{value_as_i64, KeyValueStore};
use crate::errors::{Result, StoreError};

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

struct Member {
    score: i64,
    seq: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    sorted_sets: HashMap<String, HashMap<String, Member>>,
    next_seq: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".to_string()).into())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".to_string()).into())
    }
}

fn overflow(key: &str) -> crate::errors::Error {
    StoreError::CommandFailed {
        key: key.to_string(),
        message: "integer overflow".to_string(),
    }
    .into()
}

fn expiry(ttl: Option<Duration>) -> Option<Instant> {
    ttl.map(|ttl| Instant::now() + ttl)
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let now = Instant::now();
        let inner = self.read()?;
        Ok(inner
            .entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let mut inner = self.write()?;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: expiry(ttl),
            },
        );
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let now = Instant::now();
        let mut inner = self.write()?;
        if inner.entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: expiry(ttl),
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let mut inner = self.write()?;
        Ok(inner
            .entries
            .remove(key)
            .is_some_and(|e| e.is_live(now)))
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let now = Instant::now();
        let mut inner = self.write()?;
        let (current, expires_at) = match inner.entries.get(key).filter(|e| e.is_live(now)) {
            Some(entry) => (value_as_i64(key, &entry.value)?, entry.expires_at),
            None => (0, None),
        };
        let next = current.checked_add(1).ok_or_else(|| overflow(key))?;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: Value::from(next),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<()> {
        let mut guard = self.write()?;
        let inner = &mut *guard;
        let seq = inner.next_seq;
        let set = inner.sorted_sets.entry(key.to_string()).or_default();
        match set.get_mut(member) {
            Some(existing) => existing.score = score,
            None => {
                set.insert(member.to_string(), Member { score, seq });
                inner.next_seq += 1;
            }
        }
        Ok(())
    }

    async fn zincrby(&self, key: &str, member: &str, delta: i64) -> Result<i64> {
        let mut guard = self.write()?;
        let inner = &mut *guard;
        let seq = inner.next_seq;
        let set = inner.sorted_sets.entry(key.to_string()).or_default();
        let score = match set.get_mut(member) {
            Some(existing) => {
                existing.score = existing
                    .score
                    .checked_add(delta)
                    .ok_or_else(|| overflow(key))?;
                existing.score
            }
            None => {
                set.insert(member.to_string(), Member { score: delta, seq });
                inner.next_seq += 1;
                delta
            }
        };
        Ok(score)
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>> {
        let inner = self.read()?;
        Ok(inner
            .sorted_sets
            .get(key)
            .and_then(|set| set.get(member))
            .map(|m| m.score))
    }

    async fn zrem_if_score(&self, key: &str, member: &str, expected: i64) -> Result<bool> {
        let mut inner = self.write()?;
        let Some(set) = inner.sorted_sets.get_mut(key) else {
            return Ok(false);
        };
        if set.get(member).is_some_and(|m| m.score == expected) {
            set.remove(member);
            return Ok(true);
        }
        Ok(false)
    }

    async fn zrange_rev(&self, key: &str, limit: usize) -> Result<Vec<(String, i64)>> {
        let inner = self.read()?;
        let Some(set) = inner.sorted_sets.get(key) else {
            return Ok(Vec::new());
        };
        let mut members: Vec<(&String, &Member)> = set.iter().collect();
        members.sort_by(|(_, a), (_, b)| b.score.cmp(&a.score).then(a.seq.cmp(&b.seq)));
        Ok(members
            .into_iter()
            .take(limit)
            .map(|(name, m)| (name.clone(), m.score))
            .collect())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        let inner = self.read()?;
        let mut keys: Vec<String> = inner
            .entries
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_if_absent_only_writes_once() {
        let store = MemoryStore::new();
        assert!(store.set_if_absent("k", json!(1), None).await.unwrap());
        assert!(!store.set_if_absent("k", json!(2), None).await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_expired_entries_read_as_absent() {
        let store = MemoryStore::new();
        store
            .set("k", json!("v"), Some(Duration::from_millis(0)))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.set_if_absent("k", json!("w"), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_incr_starts_from_zero_and_accepts_numeric_strings() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("c").await.unwrap(), 1);
        assert_eq!(store.incr("c").await.unwrap(), 2);

        store.set("s", json!("41"), None).await.unwrap();
        assert_eq!(store.incr("s").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_overflowing_increments_fail_without_breaking_the_store() {
        let store = MemoryStore::new();
        store.zincrby("lb", "x", i64::MAX).await.unwrap();
        assert!(matches!(
            store.zincrby("lb", "x", 10).await.unwrap_err(),
            crate::errors::Error::Store(StoreError::CommandFailed { .. })
        ));
        assert_eq!(store.zscore("lb", "x").await.unwrap(), Some(i64::MAX));

        store.set("c", json!(i64::MAX), None).await.unwrap();
        assert!(store.incr("c").await.is_err());
        assert_eq!(store.incr("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zrange_rev_breaks_ties_by_creation_order() {
        let store = MemoryStore::new();
        store.zincrby("lb", "carol", 10).await.unwrap();
        store.zincrby("lb", "alice", 50).await.unwrap();
        store.zincrby("lb", "bob", 10).await.unwrap();
        store.zincrby("lb", "carol", 0).await.unwrap();

        let ranked = store.zrange_rev("lb", 10).await.unwrap();
        assert_eq!(
            ranked,
            vec![
                ("alice".to_string(), 50),
                ("carol".to_string(), 10),
                ("bob".to_string(), 10),
            ]
        );
        assert_eq!(store.zrange_rev("lb", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zrem_if_score_keeps_members_that_changed() {
        let store = MemoryStore::new();
        store.zincrby("lb", "a", 5).await.unwrap();
        assert!(!store.zrem_if_score("lb", "a", 0).await.unwrap());
        assert_eq!(store.zscore("lb", "a").await.unwrap(), Some(5));

        store.zincrby("lb", "a", -5).await.unwrap();
        assert!(store.zrem_if_score("lb", "a", 0).await.unwrap());
        assert_eq!(store.zscore("lb", "a").await.unwrap(), None);
        assert!(!store.zrem_if_score("missing", "a", 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_prefix_lists_matching_keys() {
        let store = MemoryStore::new();
        store.set("leaderboard:a", json!(1), None).await.unwrap();
        store.set("leaderboard:b", json!(2), None).await.unwrap();
        store.set("other", json!(3), None).await.unwrap();
        assert_eq!(
            store.scan_prefix("leaderboard:").await.unwrap(),
            vec!["leaderboard:a".to_string(), "leaderboard:b".to_string()]
        );
    }
}
