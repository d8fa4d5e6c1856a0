//! Device-local key-value storage
//!
//! String values under string keys, the shape the mobile client's storage
//! exposes. The task persistence adapter sits on top of this trait.

mod file;
mod memory;

use async_trait::async_trait;

use crate::Result;

pub use file::{validate_key, FileKeyValueStore};
pub use memory::MemoryKeyValueStore;

/// Async key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`, returning whether it was present
    async fn remove_item(&self, key: &str) -> Result<bool>;
}
