//! Task persistence adapter
//!
//! The whole task collection is stored as one JSON array under a single
//! key. Every save rewrites the full array.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::storage::KeyValueStore;
use crate::task::Task;
use crate::Result;

/// Storage key used when none is configured
pub const DEFAULT_TASKS_KEY: &str = "tasks";

/// Loads and saves the task collection through a [`KeyValueStore`]
#[derive(Clone)]
pub struct TaskPersistence {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl TaskPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn with_default_key(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, DEFAULT_TASKS_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored collection
    ///
    /// A missing value is an empty collection. Storage and parse failures
    /// are returned to the caller.
    pub async fn try_load(&self) -> Result<Vec<Task>> {
        let Some(content) = self.store.get_item(&self.key).await? else {
            debug!("No stored tasks under {}", self.key);
            return Ok(Vec::new());
        };

        let tasks: Vec<Task> = serde_json::from_str(&content)?;
        debug!("Loaded {} tasks from {}", tasks.len(), self.key);
        Ok(tasks)
    }

    /// Read the stored collection, falling back to empty on any failure
    pub async fn load(&self) -> Vec<Task> {
        match self.try_load().await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!("Failed to load tasks from {}: {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Overwrite the stored collection with `tasks`
    pub async fn save(&self, tasks: &[Task]) -> Result<()> {
        let content = serde_json::to_string(tasks)?;
        self.store.set_item(&self.key, &content).await?;
        debug!("Saved {} tasks to {}", tasks.len(), self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileKeyValueStore, MemoryKeyValueStore};
    use crate::task::{NewTask, TaskId, TaskPriority, TaskStatus};
    use crate::Error;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_tasks() -> Vec<Task> {
        vec![
            NewTask::new("Visit Ramesh", "Checkup", "2024-01-10")
                .with_priority(TaskPriority::High)
                .with_assignment("System", "Self")
                .with_location("Sector 9")
                .with_category("Maternal Care")
                .into_task(TaskId::generate(), Utc::now()),
            NewTask::new("Polio round", "Door to door", "2024-01-12")
                .with_status(TaskStatus::InProgress)
                .with_notes("Bring cold box")
                .into_task(TaskId::generate(), Utc::now()),
        ]
    }

    #[tokio::test]
    async fn test_load_without_data_is_empty() {
        let persistence = TaskPersistence::with_default_key(Arc::new(MemoryKeyValueStore::new()));

        assert!(persistence.try_load().await.unwrap().is_empty());
        assert_eq!(persistence.key(), "tasks");
    }

    #[tokio::test]
    async fn test_save_then_load_on_disk() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(FileKeyValueStore::new(temp.path()));
        let persistence = TaskPersistence::with_default_key(store);

        let tasks = sample_tasks();
        persistence.save(&tasks).await.unwrap();

        let loaded = persistence.try_load().await.unwrap();
        assert_eq!(loaded, tasks);
        assert!(temp.path().join("tasks.json").exists());
    }

    #[tokio::test]
    async fn test_save_replaces_whole_collection() {
        let persistence = TaskPersistence::with_default_key(Arc::new(MemoryKeyValueStore::new()));

        persistence.save(&sample_tasks()).await.unwrap();
        persistence.save(&[]).await.unwrap();

        assert!(persistence.try_load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_data() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store.set_item("tasks", "{not json").await.unwrap();
        let persistence = TaskPersistence::with_default_key(store);

        assert!(matches!(
            persistence.try_load().await,
            Err(Error::Serialization(_))
        ));
        assert!(persistence.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_recovers_to_empty() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let persistence = TaskPersistence::new(store.clone(), "asha-tasks");
        persistence.save(&sample_tasks()).await.unwrap();

        store.set_fail_reads(true);
        assert!(matches!(persistence.try_load().await, Err(Error::Storage(_))));
        assert!(persistence.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store.set_fail_writes(true);
        let persistence = TaskPersistence::with_default_key(store);

        assert!(persistence.save(&sample_tasks()).await.is_err());
    }
}
