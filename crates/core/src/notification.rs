//! Notifications fanned out to users.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use crate::id::{NotificationId, TaskId};
use crate::user::UserId;
use crate::Time;

/// A message delivered to a set of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: NotificationId,

    /// What happened
    pub kind: NotificationKind,

    /// Human-readable text
    pub message: String,

    /// Related task
    #[serde(default)]
    pub task_id: Option<TaskId>,

    /// Who should see it
    pub recipients: BTreeSet<UserId>,

    /// Who has seen it
    #[serde(default)]
    pub read_by: BTreeSet<UserId>,

    /// Creation timestamp
    pub created_at: Time,
}

impl Notification {
    /// Create an unread notification.
    pub fn new(
        kind: NotificationKind,
        message: impl Into<String>,
        recipients: BTreeSet<UserId>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            message: message.into(),
            task_id: None,
            recipients,
            read_by: BTreeSet::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Attach the related task.
    pub fn for_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Whether `user` is a recipient.
    pub fn is_for(&self, user: &UserId) -> bool {
        self.recipients.contains(user)
    }

    /// Whether `user` is a recipient who has not read it.
    pub fn is_unread_by(&self, user: &UserId) -> bool {
        self.is_for(user) && !self.read_by.contains(user)
    }
}

/// Notification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone was assigned to a task
    TaskAssigned,
    /// A task changed
    TaskUpdated,
    /// A task was completed
    TaskCompleted,
    /// A comment was posted
    CommentAdded,
    /// A user was mentioned in a comment
    Mention,
    /// A task is due soon
    DueSoon,
    /// A user was added to a team
    TeamInvite,
}

impl NotificationKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TaskAssigned => "task_assigned",
            NotificationKind::TaskUpdated => "task_updated",
            NotificationKind::TaskCompleted => "task_completed",
            NotificationKind::CommentAdded => "comment_added",
            NotificationKind::Mention => "mention",
            NotificationKind::DueSoon => "due_soon",
            NotificationKind::TeamInvite => "team_invite",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
