//! Notification fan-out and read tracking.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use taskdeck_core::{Notification, NotificationId, NotificationKind, TaskFilter, TaskId, TaskStatus, UserId};
use taskdeck_storage::{Storage, StorageError};
use tracing::{debug, info};

use crate::{Result, SharedStorage, WorkflowConfig};

/// Store a notification unless it has no recipients.
pub(crate) async fn deliver(
    storage: &mut dyn Storage,
    kind: NotificationKind,
    message: String,
    recipients: BTreeSet<UserId>,
    task_id: Option<TaskId>,
) -> Result<Option<Notification>> {
    if recipients.is_empty() {
        return Ok(None);
    }
    let mut notification = Notification::new(kind, message, recipients);
    if let Some(task_id) = task_id {
        notification = notification.for_task(task_id);
    }
    storage.save_notification(&notification).await?;
    debug!(kind = %kind, recipients = notification.recipients.len(), "notification delivered");
    Ok(Some(notification))
}

/// Reads and updates notifications for users.
pub struct NotificationService<S: Storage> {
    storage: SharedStorage<S>,
    config: WorkflowConfig,
}

impl<S: Storage> NotificationService<S> {
    /// Create a service over shared storage.
    pub fn new(storage: SharedStorage<S>, config: WorkflowConfig) -> Self {
        Self { storage, config }
    }

    /// Send a notification. Returns `None` when there is nobody to notify.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
        recipients: BTreeSet<UserId>,
        task_id: Option<TaskId>,
    ) -> Result<Option<Notification>> {
        let mut storage = self.storage.lock().await;
        let sent = deliver(&mut *storage, kind, message.into(), recipients, task_id).await?;
        if let Some(n) = &sent {
            storage.commit(&format!("Notify {}", n.id)).await?;
        }
        Ok(sent)
    }

    /// Everything addressed to `user`, newest first.
    pub async fn list(&self, user: &UserId) -> Result<Vec<Notification>> {
        Ok(self.storage.lock().await.list_notifications(user).await?)
    }

    /// Unread notifications for `user`, newest first.
    pub async fn unread(&self, user: &UserId) -> Result<Vec<Notification>> {
        let all = self.list(user).await?;
        Ok(all.into_iter().filter(|n| n.is_unread_by(user)).collect())
    }

    /// Number of unread notifications for `user`.
    pub async fn unread_count(&self, user: &UserId) -> Result<usize> {
        Ok(self.unread(user).await?.len())
    }

    /// Mark one notification read. Returns false if it was already read.
    pub async fn mark_read(&self, id: NotificationId, user: &UserId) -> Result<bool> {
        let mut storage = self.storage.lock().await;
        let mut notification = storage
            .load_notification(id)
            .await?
            .filter(|n| n.is_for(user))
            .ok_or_else(|| StorageError::NotFound(format!("notification {}", id)))?;
        if !notification.read_by.insert(user.clone()) {
            return Ok(false);
        }
        storage.save_notification(&notification).await?;
        storage.commit(&format!("Read notification {}", id)).await?;
        Ok(true)
    }

    /// Mark everything addressed to `user` read. Returns how many changed.
    pub async fn mark_all_read(&self, user: &UserId) -> Result<usize> {
        let mut storage = self.storage.lock().await;
        let mut changed = 0;
        for mut notification in storage.list_notifications(user).await? {
            if notification.read_by.insert(user.clone()) {
                storage.save_notification(&notification).await?;
                changed += 1;
            }
        }
        if changed > 0 {
            storage.commit(&format!("Read {} notifications", changed)).await?;
        }
        Ok(changed)
    }

    /// Remove `user` from the recipients; the document goes away with the
    /// last recipient.
    pub async fn dismiss(&self, id: NotificationId, user: &UserId) -> Result<()> {
        let mut storage = self.storage.lock().await;
        let Some(mut notification) = storage.load_notification(id).await? else {
            return Ok(());
        };
        notification.recipients.remove(user);
        notification.read_by.remove(user);
        if notification.recipients.is_empty() {
            storage.delete_notification(id).await?;
        } else {
            storage.save_notification(&notification).await?;
        }
        storage.commit(&format!("Dismiss notification {}", id)).await?;
        Ok(())
    }

    /// Remind stakeholders of unfinished tasks due within the configured
    /// window starting at `today`.
    ///
    /// Each task is reminded once per due date. The date is recorded on the
    /// task itself, so dismissing or reading the reminder does not bring it
    /// back, while moving the due date does.
    pub async fn scan_due_soon(&self, today: NaiveDate) -> Result<Vec<Notification>> {
        let window = u64::try_from(self.config.due_soon_window_days).unwrap_or(0);
        let horizon = today.checked_add_days(Days::new(window)).unwrap_or(today);

        let mut storage = self.storage.lock().await;
        let filter = TaskFilter {
            status: Some(vec![TaskStatus::NotStarted, TaskStatus::InProgress, TaskStatus::Review]),
            due_from: Some(today),
            due_to: Some(horizon),
            ..Default::default()
        };
        let tasks = storage.list_tasks(&filter).await?;

        let mut sent = Vec::new();
        for mut task in tasks {
            let Some(due) = task.due_date else { continue };
            if task.reminded_for == Some(due) {
                continue;
            }
            let message = format!("\"{}\" is due on {}", task.title, due);
            if let Some(n) = deliver(
                &mut *storage,
                NotificationKind::DueSoon,
                message,
                task.stakeholders(),
                Some(task.id),
            )
            .await?
            {
                sent.push(n);
            }
            task.reminded_for = Some(due);
            storage.save_task(&task).await?;
        }
        if !sent.is_empty() {
            storage.commit(&format!("Send {} due-soon reminders", sent.len())).await?;
            info!(count = sent.len(), "due-soon reminders sent");
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared;
    use taskdeck_core::Task;
    use taskdeck_storage::MemoryStorage;

    fn users(names: &[&str]) -> BTreeSet<UserId> {
        names.iter().map(|n| UserId::new(*n)).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_read_tracking_is_per_user() {
        let service = NotificationService::new(shared(MemoryStorage::new()), WorkflowConfig::default());
        let n = service
            .notify(NotificationKind::TaskUpdated, "changed", users(&["bob", "carol"]), None)
            .await
            .unwrap()
            .unwrap();

        assert!(service.mark_read(n.id, &UserId::new("bob")).await.unwrap());
        assert!(!service.mark_read(n.id, &UserId::new("bob")).await.unwrap());
        assert_eq!(service.unread_count(&UserId::new("bob")).await.unwrap(), 0);
        assert_eq!(service.unread_count(&UserId::new("carol")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_recipients_sends_nothing() {
        let service = NotificationService::new(shared(MemoryStorage::new()), WorkflowConfig::default());
        let sent = service
            .notify(NotificationKind::TaskUpdated, "x", BTreeSet::new(), None)
            .await
            .unwrap();
        assert!(sent.is_none());
    }

    #[tokio::test]
    async fn test_mark_read_rejects_non_recipient() {
        let service = NotificationService::new(shared(MemoryStorage::new()), WorkflowConfig::default());
        let n = service
            .notify(NotificationKind::Mention, "hi", users(&["bob"]), None)
            .await
            .unwrap()
            .unwrap();
        assert!(service.mark_read(n.id, &UserId::new("mallory")).await.is_err());
    }

    #[tokio::test]
    async fn test_mark_all_read_and_dismiss() {
        let service = NotificationService::new(shared(MemoryStorage::new()), WorkflowConfig::default());
        let bob = UserId::new("bob");
        for _ in 0..3 {
            service
                .notify(NotificationKind::TaskUpdated, "x", users(&["bob"]), None)
                .await
                .unwrap();
        }
        assert_eq!(service.mark_all_read(&bob).await.unwrap(), 3);
        assert_eq!(service.mark_all_read(&bob).await.unwrap(), 0);

        let first = service.list(&bob).await.unwrap()[0].id;
        service.dismiss(first, &bob).await.unwrap();
        assert_eq!(service.list(&bob).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_due_soon_reminds_once() {
        let storage = shared(MemoryStorage::new());
        let config = WorkflowConfig::default().with_due_soon_window(2);
        let service = NotificationService::new(storage.clone(), config);

        let mut soon = Task::new("Soon", UserId::new("alice")).unwrap();
        soon.due_date = Some(date(2024, 6, 3));
        soon.assigned_to.insert(UserId::new("bob"));
        let mut later = Task::new("Later", UserId::new("alice")).unwrap();
        later.due_date = Some(date(2024, 6, 10));
        let mut done = Task::new("Done", UserId::new("alice")).unwrap();
        done.due_date = Some(date(2024, 6, 2));
        done.status = TaskStatus::Completed;
        {
            let mut s = storage.lock().await;
            s.save_task(&soon).await.unwrap();
            s.save_task(&later).await.unwrap();
            s.save_task(&done).await.unwrap();
        }

        let sent = service.scan_due_soon(date(2024, 6, 1)).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].task_id, Some(soon.id));
        assert_eq!(sent[0].recipients, users(&["alice", "bob"]));

        assert!(service.scan_due_soon(date(2024, 6, 2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dismissed_reminder_is_not_resent() {
        let storage = shared(MemoryStorage::new());
        let config = WorkflowConfig::default().with_due_soon_window(3);
        let service = NotificationService::new(storage.clone(), config);
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        let mut task = Task::new("Report", alice.clone()).unwrap();
        task.due_date = Some(date(2024, 6, 3));
        task.assigned_to.insert(bob.clone());
        storage.lock().await.save_task(&task).await.unwrap();

        let sent = service.scan_due_soon(date(2024, 6, 1)).await.unwrap();
        assert_eq!(sent.len(), 1);
        service.dismiss(sent[0].id, &alice).await.unwrap();
        service.dismiss(sent[0].id, &bob).await.unwrap();
        assert!(storage.lock().await.load_notification(sent[0].id).await.unwrap().is_none());

        assert!(service.scan_due_soon(date(2024, 6, 2)).await.unwrap().is_empty());

        // A new due date earns a new reminder.
        {
            let mut s = storage.lock().await;
            let mut task = s.load_task(task.id).await.unwrap().unwrap();
            task.due_date = Some(date(2024, 6, 4));
            s.save_task(&task).await.unwrap();
        }
        let again = service.scan_due_soon(date(2024, 6, 2)).await.unwrap();
        assert_eq!(again.len(), 1);
        assert!(again[0].message.contains("2024-06-04"));
    }
}
