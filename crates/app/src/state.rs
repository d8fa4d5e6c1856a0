//! Application state

use std::sync::Arc;

use chrono::NaiveDate;
use vitawave_core::task::{
    dashboard_preview, is_past_due, Task, TaskSummary, DASHBOARD_PREVIEW_LIMIT,
};
use vitawave_core::{StoreConfig, TaskStoreProvider};

/// Shared application state
///
/// Created once at start-up; `shutdown` must run before the process exits
/// so queued saves reach storage.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    task_store: TaskStoreProvider,
}

/// What the worker dashboard shows about tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub summary: TaskSummary,
    pub past_due: usize,
    pub preview: Vec<Task>,
}

impl AppState {
    /// Open the task store described by `config`
    pub async fn new(config: &StoreConfig) -> vitawave_core::Result<Self> {
        let task_store = config.open_provider().await?;

        Ok(Self {
            inner: Arc::new(AppStateInner { task_store }),
        })
    }

    /// Get reference to the task store
    pub fn task_store(&self) -> &TaskStoreProvider {
        &self.inner.task_store
    }

    pub async fn dashboard(&self, today: NaiveDate) -> DashboardView {
        let tasks = self.task_store().list().await;
        DashboardView {
            summary: TaskSummary::from_tasks(&tasks),
            past_due: tasks.iter().filter(|t| is_past_due(t, today)).count(),
            preview: dashboard_preview(&tasks, DASHBOARD_PREVIEW_LIMIT),
        }
    }

    /// Flush pending saves and stop the writer
    pub async fn shutdown(&self) {
        self.task_store().shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vitawave_core::task::{NewTask, TaskPriority, TaskStatus};

    #[tokio::test]
    async fn test_dashboard_view() {
        let temp = TempDir::new().unwrap();
        let state = AppState::new(&StoreConfig::new(temp.path())).await.unwrap();
        let store = state.task_store();

        for (title, status, priority) in [
            ("Stock check", TaskStatus::Pending, TaskPriority::Low),
            ("Visit Ramesh", TaskStatus::Pending, TaskPriority::High),
            ("Polio round", TaskStatus::Overdue, TaskPriority::Medium),
            ("ANC camp", TaskStatus::Completed, TaskPriority::High),
            ("Register births", TaskStatus::InProgress, TaskPriority::Medium),
        ] {
            store
                .add_task(
                    NewTask::new(title, "Field work", "2024-01-10")
                        .with_status(status)
                        .with_priority(priority),
                )
                .await
                .unwrap();
        }

        let today = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
        let view = state.dashboard(today).await;

        assert_eq!(view.summary.total, 5);
        assert_eq!(view.summary.completed, 1);
        assert_eq!(view.past_due, 4);
        let titles: Vec<&str> = view.preview.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Polio round", "Visit Ramesh", "ANC camp", "Register births"]
        );

        state.shutdown().await;
        assert!(temp.path().join("tasks.json").exists());
    }
}
