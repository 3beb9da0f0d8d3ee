//! Task list views and statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::DateRange;
use crate::task::{Priority, Task, TaskStatus};

/// Task list filter. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub overdue_only: bool,
}

impl TaskFilter {
    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        self.status.is_none_or(|status| task.status == status)
            && self.priority.is_none_or(|priority| task.priority == priority)
            && (!self.overdue_only || task.is_overdue(now))
    }
}

pub fn filter_tasks<'a>(items: &'a [Task], filter: &TaskFilter, now: DateTime<Utc>) -> Vec<&'a Task> {
    items.iter().filter(|task| filter.matches(task, now)).collect()
}

/// Tasks whose due date falls inside `range`.
pub fn tasks_due_between<'a>(items: &'a [Task], range: &DateRange) -> Vec<&'a Task> {
    super::filter_by_date_range(items, range, |task| task.due_date.as_deref())
}

/// Counts by status plus overdue count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl TaskStats {
    pub fn compute(items: &[Task], now: DateTime<Utc>) -> Self {
        items.iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Open => stats.open += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
            }
            if task.is_overdue(now) {
                stats.overdue += 1;
            }
            stats
        })
    }

    /// Share of completed tasks in percent; 0 for an empty list.
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}
