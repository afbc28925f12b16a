//! Workflow errors.

use taskdeck_core::{CommentId, CoreError, TaskId, TeamId, UserId};
use taskdeck_storage::StorageError;

/// Result alias for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors returned by workflow services.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Backend failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid document contents
    #[error("invalid input: {0}")]
    Validation(#[from] CoreError),

    /// Task does not exist
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Team does not exist
    #[error("team not found: {0}")]
    TeamNotFound(TeamId),

    /// Comment does not exist
    #[error("comment not found: {0}")]
    CommentNotFound(CommentId),

    /// Completion refused because prerequisites are open
    #[error("task {task} has {} incomplete dependencies", .pending.len())]
    DependenciesIncomplete {
        /// Task being completed
        task: TaskId,
        /// Dependencies that are not completed
        pending: Vec<TaskId>,
    },

    /// The dependency would make the graph cyclic
    #[error("adding dependency {dependency} to {task} would create a cycle")]
    DependencyCycle {
        /// Task gaining the dependency
        task: TaskId,
        /// Proposed dependency
        dependency: TaskId,
    },

    /// The acting user lacks the required access
    #[error("{user} may not {action}")]
    PermissionDenied {
        /// Acting user
        user: UserId,
        /// What was attempted
        action: String,
    },

    /// Stop requested with nothing running
    #[error("{0} has no active time entry")]
    NoActiveEntry(UserId),

    /// Membership rule violated
    #[error("{0}")]
    Membership(String),

    /// Rejected input that is not a core document rule
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl WorkflowError {
    pub(crate) fn denied(user: &UserId, action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            user: user.clone(),
            action: action.into(),
        }
    }
}
