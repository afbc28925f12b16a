//! Time tracking: start/stop entries and per-task totals.

use taskdeck_core::{TaskId, Time, TimeEntry, TimeEntryId, UserId};
use taskdeck_storage::Storage;
use tracing::{debug, info};

use crate::teams::{require, Access};
use crate::{Result, SharedStorage, WorkflowError};

/// Sum of all stored entry durations for `task_id`, written back to the task.
pub(crate) async fn recompute_total(storage: &mut dyn Storage, task_id: TaskId) -> Result<u64> {
    let total: u64 = storage
        .list_time_entries_for_task(task_id)
        .await?
        .iter()
        .map(|e| e.duration_secs)
        .sum();
    if let Some(mut task) = storage.load_task(task_id).await? {
        if task.total_tracked_secs != total {
            task.total_tracked_secs = total;
            task.touch();
            storage.save_task(&task).await?;
        }
    }
    Ok(total)
}

/// Stop every active entry of `user` at `now`. Returns the stopped entries.
async fn stop_active(storage: &mut dyn Storage, user: &UserId, now: Time) -> Result<Vec<TimeEntry>> {
    let active: Vec<TimeEntry> = storage
        .list_time_entries_for_user(user)
        .await?
        .into_iter()
        .filter(|e| e.active)
        .collect();

    let mut stopped = Vec::with_capacity(active.len());
    for mut entry in active {
        entry.stop(now);
        storage.save_time_entry(&entry).await?;
        recompute_total(storage, entry.task_id).await?;
        debug!(entry = %entry.id, secs = entry.duration_secs, "time entry stopped");
        stopped.push(entry);
    }
    Ok(stopped)
}

/// Starts and stops time entries.
///
/// Every operation holds the storage lock from its first read to its last
/// write, so a user never ends up with two active entries from this process.
pub struct TimeTracker<S: Storage> {
    storage: SharedStorage<S>,
}

impl<S: Storage> TimeTracker<S> {
    /// Create a tracker over shared storage.
    pub fn new(storage: SharedStorage<S>) -> Self {
        Self { storage }
    }

    /// Start tracking `task` for `user`, stopping whatever was running first.
    pub async fn start(&self, user: &UserId, task: TaskId) -> Result<TimeEntry> {
        self.start_at(user, task, chrono::Utc::now()).await
    }

    /// [`start`](Self::start) with an explicit clock.
    pub async fn start_at(&self, user: &UserId, task_id: TaskId, now: Time) -> Result<TimeEntry> {
        let mut storage = self.storage.lock().await;
        let task = storage
            .load_task(task_id)
            .await?
            .ok_or(WorkflowError::TaskNotFound(task_id))?;
        require(&*storage, &task, user, Access::Edit, "track time on").await?;

        stop_active(&mut *storage, user, now).await?;
        let entry = TimeEntry::start(task_id, user.clone(), now);
        storage.save_time_entry(&entry).await?;
        storage.commit(&format!("Start tracking task {}", task_id)).await?;
        info!(user = %user, task = %task_id, "time tracking started");
        Ok(entry)
    }

    /// Stop the running entry of `user`.
    pub async fn stop(&self, user: &UserId) -> Result<TimeEntry> {
        self.stop_at(user, chrono::Utc::now()).await
    }

    /// [`stop`](Self::stop) with an explicit clock.
    pub async fn stop_at(&self, user: &UserId, now: Time) -> Result<TimeEntry> {
        let mut storage = self.storage.lock().await;
        let mut stopped = stop_active(&mut *storage, user, now).await?;
        let entry = stopped.pop().ok_or_else(|| WorkflowError::NoActiveEntry(user.clone()))?;
        storage.commit(&format!("Stop tracking task {}", entry.task_id)).await?;
        info!(user = %user, task = %entry.task_id, secs = entry.duration_secs, "time tracking stopped");
        Ok(entry)
    }

    /// The running entry of `user`, if any.
    pub async fn active_entry(&self, user: &UserId) -> Result<Option<TimeEntry>> {
        let storage = self.storage.lock().await;
        Ok(storage
            .list_time_entries_for_user(user)
            .await?
            .into_iter()
            .find(|e| e.active))
    }

    /// Entries recorded against a task.
    pub async fn entries_for_task(&self, task: TaskId) -> Result<Vec<TimeEntry>> {
        Ok(self.storage.lock().await.list_time_entries_for_task(task).await?)
    }

    /// Entries recorded by a user.
    pub async fn entries_for_user(&self, user: &UserId) -> Result<Vec<TimeEntry>> {
        Ok(self.storage.lock().await.list_time_entries_for_user(user).await?)
    }

    /// Delete an entry and recompute its task's total. Only the user who
    /// recorded it may delete it.
    pub async fn delete_entry(&self, user: &UserId, id: TimeEntryId) -> Result<()> {
        let mut storage = self.storage.lock().await;
        let Some(entry) = storage.load_time_entry(id).await? else {
            return Ok(());
        };
        if &entry.user_id != user {
            return Err(WorkflowError::denied(user, format!("delete time entry {}", id)));
        }
        storage.delete_time_entry(id).await?;
        recompute_total(&mut *storage, entry.task_id).await?;
        storage.commit(&format!("Delete time entry {}", id)).await?;
        Ok(())
    }

    /// Total tracked seconds for `task`, recomputed from its entries.
    pub async fn task_total(&self, task: TaskId) -> Result<u64> {
        let mut storage = self.storage.lock().await;
        recompute_total(&mut *storage, task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared;
    use chrono::{Duration, TimeZone, Utc};
    use taskdeck_core::Task;
    use taskdeck_storage::MemoryStorage;

    async fn setup() -> (TimeTracker<MemoryStorage>, SharedStorage<MemoryStorage>, Task, Task) {
        let storage = shared(MemoryStorage::new());
        let a = Task::new("A", UserId::new("alice")).unwrap();
        let b = Task::new("B", UserId::new("alice")).unwrap();
        {
            let mut s = storage.lock().await;
            s.save_task(&a).await.unwrap();
            s.save_task(&b).await.unwrap();
        }
        (TimeTracker::new(storage.clone()), storage, a, b)
    }

    fn t0() -> Time {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_start_stops_previous_entry() {
        let (tracker, _, a, b) = setup().await;
        let alice = UserId::new("alice");

        let first = tracker.start_at(&alice, a.id, t0()).await.unwrap();
        tracker.start_at(&alice, b.id, t0() + Duration::seconds(600)).await.unwrap();

        let entries = tracker.entries_for_user(&alice).await.unwrap();
        assert_eq!(entries.iter().filter(|e| e.active).count(), 1);
        let first = entries.iter().find(|e| e.id == first.id).unwrap();
        assert!(!first.active);
        assert_eq!(first.duration_secs, 600);
        assert_eq!(tracker.active_entry(&alice).await.unwrap().unwrap().task_id, b.id);
    }

    #[tokio::test]
    async fn test_stop_updates_task_total() {
        let (tracker, storage, a, _) = setup().await;
        let alice = UserId::new("alice");

        tracker.start_at(&alice, a.id, t0()).await.unwrap();
        tracker.stop_at(&alice, t0() + Duration::seconds(3661)).await.unwrap();
        tracker.start_at(&alice, a.id, t0() + Duration::hours(2)).await.unwrap();
        tracker.stop_at(&alice, t0() + Duration::hours(2) + Duration::seconds(39)).await.unwrap();

        let task = storage.lock().await.load_task(a.id).await.unwrap().unwrap();
        assert_eq!(task.total_tracked_secs, 3700);
        assert_eq!(tracker.task_total(a.id).await.unwrap(), 3700);
    }

    #[tokio::test]
    async fn test_stop_without_active_entry() {
        let (tracker, _, _, _) = setup().await;
        let err = tracker.stop(&UserId::new("alice")).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NoActiveEntry(_)));
    }

    #[tokio::test]
    async fn test_delete_entry_recomputes_total() {
        let (tracker, storage, a, _) = setup().await;
        let alice = UserId::new("alice");
        tracker.start_at(&alice, a.id, t0()).await.unwrap();
        let kept = tracker.stop_at(&alice, t0() + Duration::seconds(100)).await.unwrap();
        tracker.start_at(&alice, a.id, t0() + Duration::seconds(200)).await.unwrap();
        let dropped = tracker.stop_at(&alice, t0() + Duration::seconds(250)).await.unwrap();

        tracker.delete_entry(&alice, dropped.id).await.unwrap();
        let task = storage.lock().await.load_task(a.id).await.unwrap().unwrap();
        assert_eq!(task.total_tracked_secs, kept.duration_secs);
    }

    #[tokio::test]
    async fn test_outsider_cannot_track() {
        let (tracker, _, a, _) = setup().await;
        let err = tracker.start(&UserId::new("mallory"), a.id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_users_track_independently() {
        let (tracker, storage, a, _) = setup().await;
        {
            let mut s = storage.lock().await;
            let mut task = s.load_task(a.id).await.unwrap().unwrap();
            task.assigned_to.insert(UserId::new("bob"));
            s.save_task(&task).await.unwrap();
        }
        tracker.start_at(&UserId::new("alice"), a.id, t0()).await.unwrap();
        tracker.start_at(&UserId::new("bob"), a.id, t0()).await.unwrap();
        assert!(tracker.active_entry(&UserId::new("alice")).await.unwrap().is_some());
        assert!(tracker.active_entry(&UserId::new("bob")).await.unwrap().is_some());
    }
}
