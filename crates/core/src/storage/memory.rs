//! In-memory key-value storage

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::{Error, Result};

/// Non-durable key-value store with switchable failures
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: RwLock<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read fail with a storage error
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with a storage error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("Read of {} refused", key)));
        }
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("Write of {} refused", key)));
        }
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("Remove of {} refused", key)));
        }
        Ok(self.items.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryKeyValueStore::new();

        assert!(store.get_item("tasks").await.unwrap().is_none());
        store.set_item("tasks", "[]").await.unwrap();
        assert_eq!(store.get_item("tasks").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(store.write_count(), 1);
        assert!(store.remove_item("tasks").await.unwrap());
        assert!(store.get_item("tasks").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryKeyValueStore::new();
        store.set_item("tasks", "[]").await.unwrap();

        store.set_fail_reads(true);
        assert!(matches!(store.get_item("tasks").await, Err(Error::Storage(_))));

        store.set_fail_writes(true);
        assert!(store.set_item("tasks", "[1]").await.is_err());
        assert_eq!(store.write_count(), 1);

        store.set_fail_reads(false);
        assert_eq!(store.get_item("tasks").await.unwrap().as_deref(), Some("[]"));
    }
}
