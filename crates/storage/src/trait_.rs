//! Storage trait abstraction.

use async_trait::async_trait;
use taskdeck_core::{
    Comment, CommentId, Membership, MembershipId, Notification, NotificationId, Task, TaskFilter,
    TaskId, Team, TeamId, TimeEntry, TimeEntryId, UserId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for Taskdeck documents.
///
/// This trait allows different storage backends to be plugged in. Saves are
/// upserts; deletes of missing documents succeed.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Task operations ===

    /// Save a task (create or update).
    async fn save_task(&mut self, task: &Task) -> Result<()>;

    /// Load a task by ID.
    async fn load_task(&self, id: TaskId) -> Result<Option<Task>>;

    /// List tasks matching the filter, oldest first.
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;

    /// Delete a task.
    async fn delete_task(&mut self, id: TaskId) -> Result<()>;

    // === Time entry operations ===

    /// Save a time entry.
    async fn save_time_entry(&mut self, entry: &TimeEntry) -> Result<()>;

    /// Load a time entry by ID.
    async fn load_time_entry(&self, id: TimeEntryId) -> Result<Option<TimeEntry>>;

    /// List entries recorded against a task.
    async fn list_time_entries_for_task(&self, task_id: TaskId) -> Result<Vec<TimeEntry>>;

    /// List entries recorded by a user.
    async fn list_time_entries_for_user(&self, user_id: &UserId) -> Result<Vec<TimeEntry>>;

    /// Delete a time entry.
    async fn delete_time_entry(&mut self, id: TimeEntryId) -> Result<()>;

    // === Comment operations ===

    /// Save a comment.
    async fn save_comment(&mut self, comment: &Comment) -> Result<()>;

    /// Load a comment by ID.
    async fn load_comment(&self, id: CommentId) -> Result<Option<Comment>>;

    /// List comments on a task, oldest first.
    async fn list_comments(&self, task_id: TaskId) -> Result<Vec<Comment>>;

    /// Delete a comment.
    async fn delete_comment(&mut self, id: CommentId) -> Result<()>;

    // === Notification operations ===

    /// Save a notification.
    async fn save_notification(&mut self, notification: &Notification) -> Result<()>;

    /// Load a notification by ID.
    async fn load_notification(&self, id: NotificationId) -> Result<Option<Notification>>;

    /// List notifications addressed to a user, newest first.
    async fn list_notifications(&self, user_id: &UserId) -> Result<Vec<Notification>>;

    /// Delete a notification.
    async fn delete_notification(&mut self, id: NotificationId) -> Result<()>;

    // === Team operations ===

    /// Save a team.
    async fn save_team(&mut self, team: &Team) -> Result<()>;

    /// Load a team by ID.
    async fn load_team(&self, id: TeamId) -> Result<Option<Team>>;

    /// List all teams.
    async fn list_teams(&self) -> Result<Vec<Team>>;

    /// Delete a team.
    async fn delete_team(&mut self, id: TeamId) -> Result<()>;

    /// Save a membership.
    async fn save_membership(&mut self, membership: &Membership) -> Result<()>;

    /// List memberships of a team.
    async fn list_memberships_for_team(&self, team_id: TeamId) -> Result<Vec<Membership>>;

    /// List memberships of a user.
    async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>>;

    /// Delete a membership.
    async fn delete_membership(&mut self, id: MembershipId) -> Result<()>;

    // === Change marking ===

    /// Mark the writes since the last commit as one logical change.
    async fn commit(&mut self, message: &str) -> Result<()>;
}
