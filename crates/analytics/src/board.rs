//! Kanban board view.

use std::cmp::{Ordering, Reverse};

use serde::Serialize;
use taskdeck_core::{Task, TaskStatus};

/// One board column.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    /// Status shown in this column
    pub status: TaskStatus,
    /// Tasks, most urgent first
    pub tasks: Vec<Task>,
}

/// Tasks laid out by status.
#[derive(Debug, Clone, Serialize)]
pub struct KanbanBoard {
    /// One column per status, in lifecycle order
    pub columns: Vec<Column>,
}

impl KanbanBoard {
    /// Build a board. Columns are ordered by priority (high first), then by
    /// due date with undated tasks last, then by creation time.
    pub fn build(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut columns: Vec<Column> = TaskStatus::ALL
            .iter()
            .map(|s| Column {
                status: *s,
                tasks: Vec::new(),
            })
            .collect();

        for task in tasks {
            if let Some(col) = columns.iter_mut().find(|c| c.status == task.status) {
                col.tasks.push(task);
            }
        }
        for col in &mut columns {
            col.tasks.sort_by(urgency);
        }
        Self { columns }
    }

    /// Column for `status`.
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        self.columns
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.tasks.as_slice())
            .unwrap_or_default()
    }
}

fn urgency(a: &Task, b: &Task) -> Ordering {
    Reverse(a.priority)
        .cmp(&Reverse(b.priority))
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
}
