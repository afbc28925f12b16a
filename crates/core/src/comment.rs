//! Comments on tasks.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use crate::id::{CommentId, TaskId};
use crate::user::UserId;
use crate::Time;

/// A comment left on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: CommentId,

    /// Task commented on
    pub task_id: TaskId,

    /// Author
    pub author: UserId,

    /// Text
    pub body: String,

    /// Users mentioned with `@name`
    #[serde(default)]
    pub mentions: BTreeSet<UserId>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last edit
    #[serde(default)]
    pub edited_at: Option<Time>,
}
