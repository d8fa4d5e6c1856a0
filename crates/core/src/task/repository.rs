//! Task repository trait
//!
//! Defines the interface the screens use to read and mutate tasks.

use async_trait::async_trait;

use super::model::{NewTask, Task, TaskId, TaskStatus};
use crate::Result;

/// Repository interface for task CRUD operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a new task, assigning its id and creation time
    async fn create(&self, input: NewTask) -> Result<Task>;

    /// Get a task by ID
    async fn get(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Get all tasks in insertion order
    async fn list(&self) -> Result<Vec<Task>>;

    /// Replace an existing task
    async fn update(&self, task: Task) -> Result<Task>;

    /// Delete a task by ID, returning whether it existed
    async fn delete(&self, id: &TaskId) -> Result<bool>;

    /// Find tasks by status
    async fn find_by_status(&self, status: TaskStatus) -> Result<Vec<Task>>;
}
