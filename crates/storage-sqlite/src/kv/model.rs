//! Database models for the key-value store.

use diesel::prelude::*;
use serde_json::Value;
use std::time::Duration;

use tipstream_core::errors::{Result, StoreError};

/// A plain value row. `value` holds the JSON encoding.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::kv_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct KvEntryDB {
    pub entry_key: String,
    pub value: String,
    /// Unix milliseconds after which the row reads as absent.
    pub expires_at: Option<i64>,
}

impl KvEntryDB {
    pub fn new(key: &str, value: &Value, ttl: Option<Duration>, now_ms: i64) -> Self {
        KvEntryDB {
            entry_key: key.to_string(),
            value: value.to_string(),
            expires_at: ttl.map(|ttl| now_ms.saturating_add(ttl_millis(ttl))),
        }
    }

    pub fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at.map_or(true, |at| at > now_ms)
    }

    pub fn decode(&self) -> Result<Value> {
        serde_json::from_str(&self.value).map_err(|e| {
            StoreError::CorruptValue {
                key: self.entry_key.clone(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// A sorted-set member row. `id` preserves creation order for tie-breaking.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::sorted_set_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SortedSetMemberDB {
    pub id: i32,
    pub set_key: String,
    pub member: String,
    pub score: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::sorted_set_members)]
pub struct NewSortedSetMemberDB<'a> {
    pub set_key: &'a str,
    pub member: &'a str,
    pub score: i64,
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}
