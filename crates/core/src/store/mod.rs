//! Store adapter module - the key-value interface every service is written against.

mod memory_store;
mod store_traits;

pub use memory_store::MemoryStore;
pub use store_traits::{get_typed, set_typed, value_as_i64, KeyValueStore};
