//! Task store provider
//!
//! The single source of truth for tasks during a session. It loads the
//! stored collection once, applies every mutation in memory, publishes a
//! snapshot to subscribers and queues a full-collection save. Storage
//! failures are logged and never reach the caller; the in-memory
//! collection stays authoritative.

mod writer;

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::persistence::TaskPersistence;
use crate::task::{NewTask, Task, TaskId, TaskRepository, TaskStatus};
use crate::{Error, Result};

use writer::SaveQueue;

/// What consumers render: the task list and whether it is still loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub tasks: Vec<Task>,
    pub loading: bool,
}

struct StoreState {
    tasks: Vec<Task>,
    loading: bool,
    /// A mutation happened before the stored collection was loaded
    changed_while_loading: bool,
}

impl StoreState {
    fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            tasks: self.tasks.clone(),
            loading: self.loading,
        }
    }

    fn contains(&self, id: &TaskId) -> bool {
        self.tasks.iter().any(|t| &t.id == id)
    }

    fn unused_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if !self.contains(&id) {
                return id;
            }
        }
    }
}

/// Owns the task collection and its load/save lifecycle
pub struct TaskStoreProvider {
    state: RwLock<StoreState>,
    initialized: AtomicBool,
    snapshots: watch::Sender<TaskSnapshot>,
    persistence: TaskPersistence,
    writer: SaveQueue,
}

impl TaskStoreProvider {
    /// Create an empty provider in the loading state
    pub fn new(persistence: TaskPersistence) -> Self {
        let state = StoreState {
            tasks: Vec::new(),
            loading: true,
            changed_while_loading: false,
        };
        let (snapshots, _) = watch::channel(state.snapshot());

        Self {
            state: RwLock::new(state),
            initialized: AtomicBool::new(false),
            snapshots,
            persistence,
            writer: SaveQueue::new(),
        }
    }

    /// Create and initialize a provider
    pub async fn open(persistence: TaskPersistence) -> Self {
        let provider = Self::new(persistence);
        provider.initialize().await;
        provider
    }

    /// Load the stored collection and start the writer
    ///
    /// A failed load leaves the collection empty. `loading` is cleared
    /// either way. Tasks added before this call are kept after the loaded
    /// ones; nothing is written until the merged collection is known.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!("Task store already initialized");
            return;
        }

        let loaded = match self.persistence.try_load().await {
            Ok(tasks) => {
                info!(
                    "Loaded {} tasks from {}",
                    tasks.len(),
                    self.persistence.key()
                );
                tasks
            }
            Err(e) => {
                warn!(
                    "Failed to load tasks from {}, starting empty: {}",
                    self.persistence.key(),
                    e
                );
                Vec::new()
            }
        };

        let mut state = self.state.write().await;
        let early = std::mem::replace(&mut state.tasks, loaded);
        for mut task in early {
            if state.contains(&task.id) {
                task.id = state.unused_id();
            }
            state.tasks.push(task);
        }
        state.loading = false;

        if std::mem::take(&mut state.changed_while_loading) {
            self.writer.enqueue(state.tasks.clone());
        }
        self.writer.start(self.persistence.clone()).await;
        self.publish(&state);
    }

    /// Whether the initial load is still pending
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Current tasks and loading flag
    pub async fn snapshot(&self) -> TaskSnapshot {
        self.state.read().await.snapshot()
    }

    /// Receive a snapshot after initialization and after every mutation
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot> {
        self.snapshots.subscribe()
    }

    /// All tasks in insertion order
    pub async fn list(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.state
            .read()
            .await
            .tasks
            .iter()
            .find(|t| &t.id == id)
            .cloned()
    }

    /// Create a task with a fresh id and the current time
    pub async fn add_task(&self, input: NewTask) -> Result<Task> {
        input.validate()?;

        let mut state = self.state.write().await;
        let task = input.into_task(state.unused_id(), Utc::now());
        state.tasks.push(task.clone());
        debug!("Added task {} ({})", task.id, task.title);

        self.commit(&mut state);
        Ok(task)
    }

    /// Replace the task with the same id
    ///
    /// The stored `created_at` is kept whatever the input carries.
    pub async fn update_task(&self, mut task: Task) -> Result<Task> {
        task.validate()?;

        let mut state = self.state.write().await;
        let Some(slot) = state.tasks.iter_mut().find(|t| t.id == task.id) else {
            return Err(Error::TaskNotFound(task.id.to_string()));
        };
        task.created_at = slot.created_at;
        *slot = task.clone();
        debug!("Updated task {}", task.id);

        self.commit(&mut state);
        Ok(task)
    }

    /// Set a task's status and notes
    pub async fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        notes: Option<String>,
    ) -> Result<Task> {
        let mut state = self.state.write().await;
        let Some(slot) = state.tasks.iter_mut().find(|t| &t.id == id) else {
            return Err(Error::TaskNotFound(id.to_string()));
        };
        *slot = slot.clone().with_status_update(status, notes);
        let task = slot.clone();
        debug!("Task {} is now {}", task.id, task.status);

        self.commit(&mut state);
        Ok(task)
    }

    /// Remove a task, returning it if it existed
    pub async fn delete_task(&self, id: &TaskId) -> Option<Task> {
        let mut state = self.state.write().await;
        let index = state.tasks.iter().position(|t| &t.id == id)?;
        let task = state.tasks.remove(index);
        debug!("Deleted task {}", task.id);

        self.commit(&mut state);
        Some(task)
    }

    /// Wait until every change made so far has been written
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Flush and stop the writer
    pub async fn shutdown(&self) {
        self.writer.shutdown().await;
        info!("Task store shut down");
    }

    /// Queue the save while the write lock is held so saves follow mutation order
    ///
    /// Before the initial load the collection lacks the stored records, so
    /// it is never queued; `initialize` saves the merged collection instead.
    fn commit(&self, state: &mut StoreState) {
        if state.loading {
            state.changed_while_loading = true;
        } else {
            self.writer.enqueue(state.tasks.clone());
        }
        self.publish(state);
    }

    fn publish(&self, state: &StoreState) {
        self.snapshots.send_replace(state.snapshot());
    }
}

#[async_trait]
impl TaskRepository for TaskStoreProvider {
    async fn create(&self, input: NewTask) -> Result<Task> {
        self.add_task(input).await
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(TaskStoreProvider::get(self, id).await)
    }

    async fn list(&self) -> Result<Vec<Task>> {
        Ok(TaskStoreProvider::list(self).await)
    }

    async fn update(&self, task: Task) -> Result<Task> {
        self.update_task(task).await
    }

    async fn delete(&self, id: &TaskId) -> Result<bool> {
        Ok(self.delete_task(id).await.is_some())
    }

    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect())
    }
}
