//! Recurring tasks: spawning the next instance when one is completed.

use chrono::NaiveDate;
use taskdeck_core::{RecurrenceRule, Task, TaskId, TaskStatus};
use taskdeck_storage::Storage;
use tracing::{debug, info};

use crate::{Result, SharedStorage, WorkflowError};

/// Spawn the successor of a completed recurring task and back-reference it
/// from `source` (which is saved).
///
/// Returns `None` when the task is not completed, not recurring, already has
/// a successor, or its series has ended. Undated tasks recur from `today`.
pub(crate) async fn spawn_successor(
    storage: &mut dyn Storage,
    source: &mut Task,
    today: NaiveDate,
) -> Result<Option<Task>> {
    if source.status != TaskStatus::Completed || source.recurrence_successor.is_some() {
        return Ok(None);
    }
    let Some(rule) = source.recurrence.clone() else {
        return Ok(None);
    };

    let base = source.due_date.unwrap_or(today);
    let Some(next_due) = rule.next_due_date(base, source.occurrence) else {
        debug!(task = %source.id, occurrence = source.occurrence, "recurrence series ended");
        return Ok(None);
    };

    let now = chrono::Utc::now();
    let successor = Task {
        id: TaskId::new(),
        status: TaskStatus::NotStarted,
        due_date: Some(next_due),
        reminded_for: None,
        dependencies: Vec::new(),
        dependencies_met: true,
        occurrence: source.occurrence.saturating_add(1),
        recurrence_parent: Some(source.id),
        recurrence_successor: None,
        attachments: Vec::new(),
        total_tracked_secs: 0,
        created_at: now,
        updated_at: now,
        completed_at: None,
        ..source.clone()
    };
    storage.save_task(&successor).await?;

    source.recurrence_successor = Some(successor.id);
    source.touch();
    storage.save_task(source).await?;

    info!(
        source = %source.id,
        successor = %successor.id,
        due = %next_due,
        occurrence = successor.occurrence,
        "recurring task spawned"
    );
    Ok(Some(successor))
}

/// Creates successor instances of recurring tasks.
pub struct RecurrenceService<S: Storage> {
    storage: SharedStorage<S>,
}

impl<S: Storage> RecurrenceService<S> {
    /// Create a service over shared storage.
    pub fn new(storage: SharedStorage<S>) -> Self {
        Self { storage }
    }

    /// Spawn the next instance of `task_id` if it is due one.
    pub async fn spawn_successor(&self, task_id: TaskId, today: NaiveDate) -> Result<Option<Task>> {
        let mut storage = self.storage.lock().await;
        let mut task = storage
            .load_task(task_id)
            .await?
            .ok_or(WorkflowError::TaskNotFound(task_id))?;
        let successor = spawn_successor(&mut *storage, &mut task, today).await?;
        if let Some(next) = &successor {
            storage.commit(&format!("Spawn task {} from {}", next.id, task_id)).await?;
        }
        Ok(successor)
    }

    /// Walk the series back from `task_id` to its first instance and return
    /// it in occurrence order.
    pub async fn series(&self, task_id: TaskId) -> Result<Vec<Task>> {
        let storage = self.storage.lock().await;
        let mut chain = Vec::new();
        let mut cursor = Some(task_id);
        while let Some(id) = cursor {
            let Some(task) = storage.load_task(id).await? else {
                break;
            };
            cursor = task.recurrence_parent;
            chain.push(task);
        }
        chain.reverse();
        Ok(chain)
    }
}

/// The next `limit` due dates a rule would produce after `due`, starting
/// from occurrence `occurrence`.
pub fn upcoming(rule: &RecurrenceRule, due: NaiveDate, occurrence: u32, limit: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(limit);
    let mut current = due;
    let mut n = occurrence;
    while dates.len() < limit {
        let Some(next) = rule.next_due_date(current, n) else {
            break;
        };
        dates.push(next);
        current = next;
        n = n.saturating_add(1);
    }
    dates
}
