//! Task workflow services.
//!
//! Recurrence, dependency gating, time tracking, comments, notifications and
//! teams, all layered over a shared [`Storage`](taskdeck_storage::Storage).

#![warn(missing_docs)]

pub mod error;
pub mod config;
pub mod recurrence;
pub mod dependency;
pub mod time_tracking;
pub mod notifications;
pub mod teams;
pub mod comments;
pub mod manager;

pub use error::{WorkflowError, Result};
pub use config::WorkflowConfig;
pub use recurrence::RecurrenceService;
pub use dependency::{DependencyGate, Gate};
pub use time_tracking::TimeTracker;
pub use notifications::NotificationService;
pub use teams::{TeamService, Access};
pub use comments::CommentService;
pub use manager::{TaskManager, NewTask, Completion};

/// Storage handle shared by every service.
pub type SharedStorage<S> = std::sync::Arc<tokio::sync::Mutex<S>>;

/// Wrap a backend for sharing between services.
pub fn shared<S: taskdeck_storage::Storage>(storage: S) -> SharedStorage<S> {
    std::sync::Arc::new(tokio::sync::Mutex::new(storage))
}
