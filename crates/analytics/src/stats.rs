//! Dashboard counters.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use taskdeck_core::{Priority, Task, TaskStatus};

/// Headline numbers for a set of tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    /// Number of tasks
    pub total: usize,

    /// Count per status; every status is present
    pub by_status: BTreeMap<TaskStatus, usize>,

    /// Count per priority; every priority is present
    pub by_priority: BTreeMap<Priority, usize>,

    /// Open tasks due before today
    pub overdue: usize,

    /// Open tasks due today
    pub due_today: usize,

    /// Open tasks due within the next seven days, today excluded
    pub due_this_week: usize,

    /// Completed / total, 0.0 when there are no tasks
    pub completion_rate: f64,

    /// Tracked seconds summed over all tasks
    pub tracked_secs: u64,
}

impl DashboardStats {
    /// Compute stats as of `today`.
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        let mut by_status: BTreeMap<TaskStatus, usize> =
            TaskStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_priority: BTreeMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();
        let week_end = today + chrono::Days::new(7);

        let mut stats = Self {
            total: tasks.len(),
            by_status: BTreeMap::new(),
            by_priority: BTreeMap::new(),
            overdue: 0,
            due_today: 0,
            due_this_week: 0,
            completion_rate: 0.0,
            tracked_secs: 0,
        };

        for task in tasks {
            *by_status.entry(task.status).or_default() += 1;
            *by_priority.entry(task.priority).or_default() += 1;
            stats.tracked_secs += task.total_tracked_secs;

            if task.is_completed() {
                continue;
            }
            match task.due_date {
                Some(d) if d < today => stats.overdue += 1,
                Some(d) if d == today => stats.due_today += 1,
                Some(d) if d <= week_end => stats.due_this_week += 1,
                _ => {}
            }
        }

        let completed = by_status.get(&TaskStatus::Completed).copied().unwrap_or(0);
        if stats.total > 0 {
            stats.completion_rate = completed as f64 / stats.total as f64;
        }
        stats.by_status = by_status;
        stats.by_priority = by_priority;
        stats
    }

    /// Count for one status.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::UserId;

    fn task(status: TaskStatus, due: Option<NaiveDate>) -> Task {
        let mut t = Task::new("t", UserId::new("alice")).unwrap();
        t.status = status;
        t.due_date = due;
        t
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_empty() {
        let stats = DashboardStats::compute(&[], date(10));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.by_status.len(), 4);
        assert_eq!(stats.count(TaskStatus::Review), 0);
    }

    #[test]
    fn test_due_buckets() {
        let mut tracked = task(TaskStatus::InProgress, Some(date(10)));
        tracked.total_tracked_secs = 90;
        let tasks = vec![
            task(TaskStatus::NotStarted, Some(date(9))),
            tracked,
            task(TaskStatus::Review, Some(date(15))),
            task(TaskStatus::Completed, Some(date(1))),
            task(TaskStatus::NotStarted, None),
        ];
        let stats = DashboardStats::compute(&tasks, date(10));
        assert_eq!(stats.total, 5);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.due_this_week, 1);
        assert_eq!(stats.count(TaskStatus::NotStarted), 2);
        assert_eq!(stats.tracked_secs, 90);
        assert!((stats.completion_rate - 0.2).abs() < f64::EPSILON);
    }
}
