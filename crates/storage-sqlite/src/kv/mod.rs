//! SQLite storage implementation for the key-value store.

mod model;
mod repository;

pub use model::{KvEntryDB, NewSortedSetMemberDB, SortedSetMemberDB};
pub use repository::SqliteStore;
