//! Read-side task queries
//!
//! Filtering, summary counts and the dashboard preview shown to field
//! workers. Everything here works on borrowed slices and never touches the
//! store.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use super::model::{Task, TaskStatus};

/// Number of tasks shown on the worker dashboard
pub const DASHBOARD_PREVIEW_LIMIT: usize = 4;

/// Status and free-text filter for the task list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// `None` matches every status
    pub status: Option<TaskStatus>,
    pub search: String,
}

impl TaskFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Search is a case-insensitive substring match on title, category or location
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }

        let needle = self.search.to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [&task.title, &task.category, &task.location]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Matching tasks, in collection order
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        tasks.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

/// Per-status task counts for the dashboards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut summary, task| {
            summary.total += 1;
            match task.status {
                TaskStatus::Pending => summary.pending += 1,
                TaskStatus::InProgress => summary.in_progress += 1,
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::Overdue => summary.overdue += 1,
            }
            summary
        })
    }
}

/// Most urgent tasks first: overdue, then by priority
///
/// The sort is stable, so ties keep collection order.
pub fn dashboard_preview(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut ordered: Vec<Task> = tasks.to_vec();
    ordered.sort_by_key(|t| (t.status != TaskStatus::Overdue, t.priority.rank()));
    ordered.truncate(limit);
    ordered
}

/// Human-friendly due date relative to a given day
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueLabel {
    Yesterday,
    Today,
    Tomorrow,
    Date(String),
}

impl DueLabel {
    pub fn for_task(task: &Task, today: NaiveDate) -> Self {
        Self::for_due_date(&task.due_date, today)
    }

    pub fn for_due_date(due_date: &str, today: NaiveDate) -> Self {
        let Some(due) = parse_due_date(due_date) else {
            return Self::Date(due_date.to_string());
        };

        match (due - today).num_days() {
            -1 => Self::Yesterday,
            0 => Self::Today,
            1 => Self::Tomorrow,
            _ => Self::Date(due_date.to_string()),
        }
    }
}

impl std::fmt::Display for DueLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yesterday => f.write_str("Yesterday"),
            Self::Today => f.write_str("Today"),
            Self::Tomorrow => f.write_str("Tomorrow"),
            Self::Date(raw) => f.write_str(raw),
        }
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Whether a task's due date is before `today` and it is not finished
pub fn is_past_due(task: &Task, today: NaiveDate) -> bool {
    !task.is_completed()
        && parse_due_date(&task.due_date)
            .map(|due| due < today)
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, TaskId, TaskPriority};
    use chrono::Utc;

    fn task(id: &str, title: &str, status: TaskStatus, priority: TaskPriority) -> Task {
        NewTask::new(title, "desc", "2024-01-10")
            .with_status(status)
            .with_priority(priority)
            .with_location("Sector 9")
            .with_category("Maternal Care")
            .into_task(TaskId::from(id), Utc::now())
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_filter_by_status() {
        let tasks = vec![
            task("1", "A", TaskStatus::Pending, TaskPriority::Low),
            task("2", "B", TaskStatus::Completed, TaskPriority::Low),
            task("3", "C", TaskStatus::Pending, TaskPriority::Low),
        ];

        let pending = TaskFilter::all().with_status(TaskStatus::Pending).apply(&tasks);
        let ids: Vec<&str> = pending.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        assert_eq!(TaskFilter::all().apply(&tasks).len(), 3);
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let mut other = task("2", "Vaccination drive", TaskStatus::Pending, TaskPriority::Low);
        other.location = "Block B".to_string();
        other.category = "Immunization".to_string();
        let tasks = vec![
            task("1", "Visit Ramesh", TaskStatus::Pending, TaskPriority::High),
            other,
        ];

        assert_eq!(TaskFilter::all().with_search("ramesh").apply(&tasks).len(), 1);
        assert_eq!(TaskFilter::all().with_search("SECTOR").apply(&tasks).len(), 1);
        assert_eq!(TaskFilter::all().with_search("immun").apply(&tasks)[0].id.as_str(), "2");
        assert!(TaskFilter::all().with_search("nowhere").apply(&tasks).is_empty());
    }

    #[test]
    fn test_filter_combines_status_and_search() {
        let tasks = vec![
            task("1", "Visit Ramesh", TaskStatus::Completed, TaskPriority::High),
            task("2", "Visit Sita", TaskStatus::Pending, TaskPriority::High),
        ];

        let found = TaskFilter::all()
            .with_status(TaskStatus::Pending)
            .with_search("visit")
            .apply(&tasks);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "2");
    }

    #[test]
    fn test_summary_counts() {
        let tasks = vec![
            task("1", "A", TaskStatus::Pending, TaskPriority::Low),
            task("2", "B", TaskStatus::Completed, TaskPriority::Low),
            task("3", "C", TaskStatus::Completed, TaskPriority::Low),
            task("4", "D", TaskStatus::Overdue, TaskPriority::Low),
        ];

        let summary = TaskSummary::from_tasks(&tasks);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.in_progress, 0);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.overdue, 1);
    }

    #[test]
    fn test_dashboard_preview_order() {
        let tasks = vec![
            task("low", "A", TaskStatus::Pending, TaskPriority::Low),
            task("high-1", "B", TaskStatus::Pending, TaskPriority::High),
            task("overdue-low", "C", TaskStatus::Overdue, TaskPriority::Low),
            task("medium", "D", TaskStatus::InProgress, TaskPriority::Medium),
            task("high-2", "E", TaskStatus::Pending, TaskPriority::High),
            task("overdue-high", "F", TaskStatus::Overdue, TaskPriority::High),
        ];

        let preview = dashboard_preview(&tasks, DASHBOARD_PREVIEW_LIMIT);
        let ids: Vec<&str> = preview.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["overdue-high", "overdue-low", "high-1", "high-2"]);
    }

    #[test]
    fn test_due_labels() {
        let today = day("2024-01-10");
        assert_eq!(DueLabel::for_due_date("2024-01-09", today), DueLabel::Yesterday);
        assert_eq!(DueLabel::for_due_date("2024-01-10", today), DueLabel::Today);
        assert_eq!(
            DueLabel::for_due_date("2024-01-11T08:00:00Z", today),
            DueLabel::Tomorrow
        );
        assert_eq!(
            DueLabel::for_due_date("2024-01-20", today),
            DueLabel::Date("2024-01-20".to_string())
        );
        assert_eq!(DueLabel::for_due_date("next week", today).to_string(), "next week");
    }

    #[test]
    fn test_past_due() {
        let today = day("2024-01-11");
        let open = task("1", "A", TaskStatus::Pending, TaskPriority::Low);
        let done = task("2", "B", TaskStatus::Completed, TaskPriority::Low);
        assert!(is_past_due(&open, today));
        assert!(!is_past_due(&done, today));
        assert!(!is_past_due(&open, day("2024-01-10")));
    }
}
