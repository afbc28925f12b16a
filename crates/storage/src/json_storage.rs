//! JSON file storage implementation.
//!
//! Stores one JSON file per document under the data directory. Snapshots
//! and history are left to whatever manages the directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskdeck_core::{
    Comment, CommentId, Membership, MembershipId, Notification, NotificationId, Task, TaskFilter,
    TaskId, Team, TeamId, TimeEntry, TimeEntryId, UserId,
};
use super::{Storage, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const KINDS: [&str; 6] = [
    "tasks",
    "time_entries",
    "comments",
    "notifications",
    "teams",
    "memberships",
];

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    pending: Arc<Mutex<bool>>,
}

impl JsonStorage {
    /// Create storage. This will create one subdirectory per document kind
    /// under `root`.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for kind in KINDS {
            fs::create_dir_all(root.join(kind)).await?;
        }
        debug!(root = %root.display(), "opened json storage");

        Ok(Self {
            root,
            pending: Arc::new(Mutex::new(false)),
        })
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn doc_path(&self, kind: &str, id: impl std::fmt::Display) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    async fn set_pending(&self) {
        *self.pending.lock().await = true;
    }

    /// Whether anything was written since the last commit.
    pub async fn is_pending(&self) -> bool {
        *self.pending.lock().await
    }

    async fn write_doc<T: serde::Serialize>(
        &self,
        kind: &str,
        id: impl std::fmt::Display,
        value: &T,
    ) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.doc_path(kind, id), json.as_bytes()).await?;
        self.set_pending().await;
        Ok(())
    }

    async fn remove_doc(&self, kind: &str, id: impl std::fmt::Display) -> Result<()> {
        remove_if_exists(&self.doc_path(kind, id)).await?;
        self.set_pending().await;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_task(&mut self, task: &Task) -> Result<()> {
        self.write_doc("tasks", task.id, task).await
    }

    async fn load_task(&self, id: TaskId) -> Result<Option<Task>> {
        read_json(&self.doc_path("tasks", id)).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let all: Vec<Task> = list_dir(&self.root.join("tasks")).await?;
        let mut tasks: Vec<Task> = all.into_iter().filter(|t| filter.matches(t)).collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn delete_task(&mut self, id: TaskId) -> Result<()> {
        self.remove_doc("tasks", id).await
    }

    async fn save_time_entry(&mut self, entry: &TimeEntry) -> Result<()> {
        self.write_doc("time_entries", entry.id, entry).await
    }

    async fn load_time_entry(&self, id: TimeEntryId) -> Result<Option<TimeEntry>> {
        read_json(&self.doc_path("time_entries", id)).await
    }

    async fn list_time_entries_for_task(&self, task_id: TaskId) -> Result<Vec<TimeEntry>> {
        let all: Vec<TimeEntry> = list_dir(&self.root.join("time_entries")).await?;
        let mut entries: Vec<_> = all.into_iter().filter(|e| e.task_id == task_id).collect();
        entries.sort_by_key(|e| e.start_time);
        Ok(entries)
    }

    async fn list_time_entries_for_user(&self, user_id: &UserId) -> Result<Vec<TimeEntry>> {
        let all: Vec<TimeEntry> = list_dir(&self.root.join("time_entries")).await?;
        let mut entries: Vec<_> = all.into_iter().filter(|e| &e.user_id == user_id).collect();
        entries.sort_by_key(|e| e.start_time);
        Ok(entries)
    }

    async fn delete_time_entry(&mut self, id: TimeEntryId) -> Result<()> {
        self.remove_doc("time_entries", id).await
    }

    async fn save_comment(&mut self, comment: &Comment) -> Result<()> {
        self.write_doc("comments", comment.id, comment).await
    }

    async fn load_comment(&self, id: CommentId) -> Result<Option<Comment>> {
        read_json(&self.doc_path("comments", id)).await
    }

    async fn list_comments(&self, task_id: TaskId) -> Result<Vec<Comment>> {
        let all: Vec<Comment> = list_dir(&self.root.join("comments")).await?;
        let mut comments: Vec<_> = all.into_iter().filter(|c| c.task_id == task_id).collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn delete_comment(&mut self, id: CommentId) -> Result<()> {
        self.remove_doc("comments", id).await
    }

    async fn save_notification(&mut self, notification: &Notification) -> Result<()> {
        self.write_doc("notifications", notification.id, notification).await
    }

    async fn load_notification(&self, id: NotificationId) -> Result<Option<Notification>> {
        read_json(&self.doc_path("notifications", id)).await
    }

    async fn list_notifications(&self, user_id: &UserId) -> Result<Vec<Notification>> {
        let all: Vec<Notification> = list_dir(&self.root.join("notifications")).await?;
        let mut notifications: Vec<_> = all.into_iter().filter(|n| n.is_for(user_id)).collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn delete_notification(&mut self, id: NotificationId) -> Result<()> {
        self.remove_doc("notifications", id).await
    }

    async fn save_team(&mut self, team: &Team) -> Result<()> {
        self.write_doc("teams", team.id, team).await
    }

    async fn load_team(&self, id: TeamId) -> Result<Option<Team>> {
        read_json(&self.doc_path("teams", id)).await
    }

    async fn list_teams(&self) -> Result<Vec<Team>> {
        let mut teams: Vec<Team> = list_dir(&self.root.join("teams")).await?;
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn delete_team(&mut self, id: TeamId) -> Result<()> {
        self.remove_doc("teams", id).await
    }

    async fn save_membership(&mut self, membership: &Membership) -> Result<()> {
        self.write_doc("memberships", membership.id, membership).await
    }

    async fn list_memberships_for_team(&self, team_id: TeamId) -> Result<Vec<Membership>> {
        let all: Vec<Membership> = list_dir(&self.root.join("memberships")).await?;
        let mut members: Vec<_> = all.into_iter().filter(|m| m.team_id == team_id).collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>> {
        let all: Vec<Membership> = list_dir(&self.root.join("memberships")).await?;
        let mut members: Vec<_> = all.into_iter().filter(|m| &m.user_id == user_id).collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn delete_membership(&mut self, id: MembershipId) -> Result<()> {
        self.remove_doc("memberships", id).await
    }

    async fn commit(&mut self, _message: &str) -> Result<()> {
        // Writes are already on disk; commit only clears pending state.
        *self.pending.lock().await = false;
        Ok(())
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&path).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::{NotificationKind, Role, TaskStatus};

    fn user(name: &str) -> UserId {
        UserId::new(name)
    }

    #[tokio::test]
    async fn test_task_roundtrip_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let mut done = Task::new("Done task", user("alice")).unwrap();
        done.status = TaskStatus::Completed;
        let open = Task::new("Open task", user("alice")).unwrap();
        storage.save_task(&done).await.unwrap();
        storage.save_task(&open).await.unwrap();

        let loaded = storage.load_task(done.id).await.unwrap().unwrap();
        assert_eq!(loaded, done);

        let filter = TaskFilter {
            status: Some(vec![TaskStatus::NotStarted]),
            ..Default::default()
        };
        let tasks = storage.list_tasks(&filter).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, open.id);
    }

    #[tokio::test]
    async fn test_one_file_per_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let task = Task::new("t", user("a")).unwrap();
        storage.save_task(&task).await.unwrap();
        storage.save_task(&task).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path().join("tasks")).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert!(!dir.path().join("meta").exists());

        storage.delete_task(task.id).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path().join("tasks")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        storage.delete_task(TaskId::new()).await.unwrap();
        assert!(storage.load_task(TaskId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_time_entries_by_task_and_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let task_id = TaskId::new();
        let now = chrono::Utc::now();
        storage.save_time_entry(&TimeEntry::start(task_id, user("a"), now)).await.unwrap();
        storage.save_time_entry(&TimeEntry::start(task_id, user("b"), now)).await.unwrap();
        storage.save_time_entry(&TimeEntry::start(TaskId::new(), user("a"), now)).await.unwrap();

        assert_eq!(storage.list_time_entries_for_task(task_id).await.unwrap().len(), 2);
        assert_eq!(storage.list_time_entries_for_user(&user("a")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_notifications_only_for_recipients() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let n = Notification::new(
            NotificationKind::TaskAssigned,
            "assigned",
            [user("bob")].into_iter().collect(),
        );
        storage.save_notification(&n).await.unwrap();

        assert_eq!(storage.list_notifications(&user("bob")).await.unwrap().len(), 1);
        assert!(storage.list_notifications(&user("carol")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memberships_and_pending_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let team_id = TeamId::new();
        storage
            .save_membership(&Membership::new(team_id, user("a"), Role::Owner))
            .await
            .unwrap();
        assert!(storage.is_pending().await);
        storage.commit("add member").await.unwrap();
        assert!(!storage.is_pending().await);

        let members = storage.list_memberships_for_team(team_id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, Role::Owner);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        storage.save_task(&Task::new("good", user("a")).unwrap()).await.unwrap();
        std::fs::write(dir.path().join("tasks").join("broken.json"), "{not json").unwrap();

        let tasks = storage.list_tasks(&TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }
}
