use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info};
use serde_json::Value;

use super::model::{KvEntryDB, NewSortedSetMemberDB};
use crate::db::{self, get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::kv_entries::dsl as kv;
use crate::schema::sorted_set_members::dsl as zs;
use tipstream_core::errors::{Result, StoreError};
use tipstream_core::store::{value_as_i64, KeyValueStore};

/// Durable [`KeyValueStore`] backed by SQLite.
///
/// Reads go through the connection pool. Every mutation runs as a job on the
/// single writer actor, so read-modify-write commands (`incr`, `zincrby`,
/// `set_if_absent`) are atomic without row locks.
pub struct SqliteStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SqliteStore { pool, writer }
    }

    /// Opens (creating if needed) the database at `db_path`, applies pending
    /// migrations and starts the writer actor.
    pub async fn open(db_path: &str) -> Result<Self> {
        let db_path = db::init(db_path)?;
        let pool = db::create_pool(&db_path)?;
        db::run_migrations(&pool)?;
        let writer = db::spawn_writer(&pool)?;
        info!("SQLite store ready at {}", db_path);

        let store = SqliteStore::new(pool, writer);
        store.purge_expired().await?;
        Ok(store)
    }

    /// Deletes every expired plain value. Returns the number of rows removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        let removed = self
            .writer
            .exec(|conn| {
                diesel::delete(kv::kv_entries.filter(kv::expires_at.le(now_ms())))
                    .execute(conn)
                    .into_core("kv_entries")
            })
            .await?;
        if removed > 0 {
            debug!("Purged {} expired entries", removed);
        }
        Ok(removed)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn load_live(conn: &mut SqliteConnection, key: &str, now: i64) -> Result<Option<KvEntryDB>> {
    let row = kv::kv_entries
        .filter(kv::entry_key.eq(key))
        .select(KvEntryDB::as_select())
        .first::<KvEntryDB>(conn)
        .optional()
        .into_core(key)?;
    Ok(row.filter(|r| r.is_live(now)))
}

fn drop_if_expired(conn: &mut SqliteConnection, key: &str, now: i64) -> Result<()> {
    diesel::delete(
        kv::kv_entries
            .filter(kv::entry_key.eq(key))
            .filter(kv::expires_at.le(now)),
    )
    .execute(conn)
    .into_core(key)?;
    Ok(())
}

fn upsert(conn: &mut SqliteConnection, row: &KvEntryDB) -> Result<()> {
    diesel::insert_into(kv::kv_entries)
        .values(row)
        .on_conflict(kv::entry_key)
        .do_update()
        .set((kv::value.eq(&row.value), kv::expires_at.eq(row.expires_at)))
        .execute(conn)
        .into_core(&row.entry_key)?;
    Ok(())
}

fn overflow(key: &str) -> tipstream_core::Error {
    StoreError::CommandFailed {
        key: key.to_string(),
        message: "integer overflow".to_string(),
    }
    .into()
}

fn escape_like(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = get_connection(&self.pool)?;
        match load_live(&mut conn, key, now_ms())? {
            Some(row) => row.decode().map(Some),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let row = KvEntryDB::new(key, &value, ttl, now_ms());
        self.writer.exec(move |conn| upsert(conn, &row)).await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let now = now_ms();
        let row = KvEntryDB::new(key, &value, ttl, now);
        self.writer
            .exec(move |conn| {
                drop_if_expired(conn, &row.entry_key, now)?;
                let inserted = diesel::insert_or_ignore_into(kv::kv_entries)
                    .values(&row)
                    .execute(conn)
                    .into_core(&row.entry_key)?;
                Ok(inserted == 1)
            })
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.writer
            .exec(move |conn| {
                drop_if_expired(conn, &key, now_ms())?;
                let removed = diesel::delete(kv::kv_entries.filter(kv::entry_key.eq(&key)))
                    .execute(conn)
                    .into_core(&key)?;
                Ok(removed > 0)
            })
            .await
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let key = key.to_string();
        self.writer
            .exec(move |conn| {
                let now = now_ms();
                let (next, expires_at) = match load_live(conn, &key, now)? {
                    Some(row) => {
                        let current = value_as_i64(&key, &row.decode()?)?;
                        let next = current.checked_add(1).ok_or_else(|| overflow(&key))?;
                        (next, row.expires_at)
                    }
                    None => (1, None),
                };
                upsert(
                    conn,
                    &KvEntryDB {
                        entry_key: key.clone(),
                        value: Value::from(next).to_string(),
                        expires_at,
                    },
                )?;
                Ok(next)
            })
            .await
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<()> {
        let key = key.to_string();
        let member = member.to_string();
        self.writer
            .exec(move |conn| {
                diesel::insert_into(zs::sorted_set_members)
                    .values(&NewSortedSetMemberDB {
                        set_key: &key,
                        member: &member,
                        score,
                    })
                    .on_conflict((zs::set_key, zs::member))
                    .do_update()
                    .set(zs::score.eq(score))
                    .execute(conn)
                    .into_core(&key)?;
                Ok(())
            })
            .await
    }

    async fn zincrby(&self, key: &str, member: &str, delta: i64) -> Result<i64> {
        let key = key.to_string();
        let member = member.to_string();
        self.writer
            .exec(move |conn| {
                let existing = zs::sorted_set_members
                    .filter(zs::set_key.eq(&key))
                    .filter(zs::member.eq(&member))
                    .select(zs::score)
                    .first::<i64>(conn)
                    .optional()
                    .into_core(&key)?;

                match existing {
                    Some(score) => {
                        let next = score.checked_add(delta).ok_or_else(|| overflow(&key))?;
                        diesel::update(
                            zs::sorted_set_members
                                .filter(zs::set_key.eq(&key))
                                .filter(zs::member.eq(&member)),
                        )
                        .set(zs::score.eq(next))
                        .execute(conn)
                        .into_core(&key)?;
                        Ok(next)
                    }
                    None => {
                        diesel::insert_into(zs::sorted_set_members)
                            .values(&NewSortedSetMemberDB {
                                set_key: &key,
                                member: &member,
                                score: delta,
                            })
                            .execute(conn)
                            .into_core(&key)?;
                        Ok(delta)
                    }
                }
            })
            .await
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>> {
        let mut conn = get_connection(&self.pool)?;
        zs::sorted_set_members
            .filter(zs::set_key.eq(key))
            .filter(zs::member.eq(member))
            .select(zs::score)
            .first::<i64>(&mut conn)
            .optional()
            .into_core(key)
    }

    async fn zrem_if_score(&self, key: &str, member: &str, expected: i64) -> Result<bool> {
        let key = key.to_string();
        let member = member.to_string();
        self.writer
            .exec(move |conn| {
                let removed = diesel::delete(
                    zs::sorted_set_members
                        .filter(zs::set_key.eq(&key))
                        .filter(zs::member.eq(&member))
                        .filter(zs::score.eq(expected)),
                )
                .execute(conn)
                .into_core(&key)?;
                Ok(removed > 0)
            })
            .await
    }

    async fn zrange_rev(&self, key: &str, limit: usize) -> Result<Vec<(String, i64)>> {
        let mut conn = get_connection(&self.pool)?;
        zs::sorted_set_members
            .filter(zs::set_key.eq(key))
            .order((zs::score.desc(), zs::id.asc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select((zs::member, zs::score))
            .load::<(String, i64)>(&mut conn)
            .into_core(key)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let keys = kv::kv_entries
            .filter(kv::entry_key.like(escape_like(prefix)).escape('\\'))
            .filter(kv::expires_at.is_null().or(kv::expires_at.gt(now_ms())))
            .order(kv::entry_key.asc())
            .select(kv::entry_key)
            .load::<String>(&mut conn)
            .into_core(prefix)?;
        // LIKE is case-insensitive for ASCII in SQLite.
        Ok(keys.into_iter().filter(|k| k.starts_with(prefix)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn open_store() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("store.db");
        let store = SqliteStore::open(path.to_str().unwrap()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let (_dir, store) = open_store().await;
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", json!({"a": [1, 2]}), None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": [1, 2]})));

        store.set("k", json!("replaced"), None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!("replaced")));

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_if_absent_writes_once() {
        let (_dir, store) = open_store().await;
        assert!(store.set_if_absent("m", json!(1), None).await.unwrap());
        assert!(!store.set_if_absent("m", json!(2), None).await.unwrap());
        assert_eq!(store.get("m").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_expired_entries_read_as_absent() {
        let (_dir, store) = open_store().await;
        store
            .set("short", json!(true), Some(Duration::from_millis(5)))
            .await
            .unwrap();
        store.set("long", json!(true), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert!(store
            .set_if_absent("short", json!(false), None)
            .await
            .unwrap());
        assert_eq!(store.get("short").await.unwrap(), Some(json!(false)));

        store
            .set("gone", json!(1), Some(Duration::from_millis(5)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.get("long").await.unwrap(), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_incr_counts_from_zero_and_accepts_numeric_strings() {
        let (_dir, store) = open_store().await;
        assert_eq!(store.incr("c").await.unwrap(), 1);
        assert_eq!(store.incr("c").await.unwrap(), 2);

        store.set("legacy", json!("41"), None).await.unwrap();
        assert_eq!(store.incr("legacy").await.unwrap(), 42);

        store.set("bad", json!({"n": 1}), None).await.unwrap();
        assert!(matches!(
            store.incr("bad").await.unwrap_err(),
            tipstream_core::Error::Store(StoreError::CorruptValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_incr_loses_no_updates() {
        let (_dir, store) = open_store().await;
        let store = Arc::new(store);
        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.incr("c").await.unwrap() })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(store.get("c").await.unwrap(), Some(json!(20)));
    }

    #[tokio::test]
    async fn test_sorted_set_ordering_and_ties() {
        let (_dir, store) = open_store().await;
        store.zincrby("lb", "Bob", 300).await.unwrap();
        store.zincrby("lb", "Alice", 500).await.unwrap();
        store.zincrby("lb", "Carol", 300).await.unwrap();
        assert_eq!(store.zincrby("lb", "Alice", 25).await.unwrap(), 525);

        assert_eq!(
            store.zrange_rev("lb", 10).await.unwrap(),
            vec![
                ("Alice".to_string(), 525),
                ("Bob".to_string(), 300),
                ("Carol".to_string(), 300),
            ]
        );
        assert_eq!(store.zrange_rev("lb", 1).await.unwrap().len(), 1);

        store.zadd("lb", "Bob", 10).await.unwrap();
        assert_eq!(store.zscore("lb", "Bob").await.unwrap(), Some(10));
        assert!(!store.zrem_if_score("lb", "Bob", 0).await.unwrap());
        assert!(store.zrem_if_score("lb", "Bob", 10).await.unwrap());
        assert!(!store.zrem_if_score("lb", "Bob", 10).await.unwrap());
        assert_eq!(store.zscore("lb", "Bob").await.unwrap(), None);
        assert_eq!(store.zscore("other", "Alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_prefix_is_literal_and_case_sensitive() {
        let (_dir, store) = open_store().await;
        store.set("leaderboard:Alice", json!(5), None).await.unwrap();
        store.set("leaderboard:Bob", json!(7), None).await.unwrap();
        store.set("LEADERBOARD:Eve", json!(1), None).await.unwrap();
        store.set("leaderboardXBob", json!(1), None).await.unwrap();
        store.set("leaderboard", json!(1), None).await.unwrap();
        store.set("a_b", json!(1), None).await.unwrap();
        store.set("axb", json!(1), None).await.unwrap();

        assert_eq!(
            store.scan_prefix("leaderboard:").await.unwrap(),
            vec!["leaderboard:Alice".to_string(), "leaderboard:Bob".to_string()]
        );
        assert_eq!(
            store.scan_prefix("a_").await.unwrap(),
            vec!["a_b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let path = path.to_str().unwrap();
        {
            let store = SqliteStore::open(path).await.unwrap();
            store.incr("notification_counter").await.unwrap();
            store.zincrby("leaderboard", "Alice", 5000).await.unwrap();
        }
        let store = SqliteStore::open(path).await.unwrap();
        assert_eq!(
            store.get("notification_counter").await.unwrap(),
            Some(json!(1))
        );
        assert_eq!(
            store.zscore("leaderboard", "Alice").await.unwrap(),
            Some(5000)
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("leaderboard:"), "leaderboard:%");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\%");
    }
}
