//! Taskdeck core data models.
//!
//! This crate defines the documents that the task service stores and the
//! small amount of pure logic attached to them (recurrence date math,
//! filter matching, duration formatting).

#![warn(missing_docs)]

// Core identities
mod id;
mod user;

// Tasks
mod task;
mod recurrence;
mod time_entry;

// Collaboration
mod comment;
mod notification;
mod team;

mod error;

// Re-exports
pub use id::*;
pub use user::{UserId, Session};

pub use task::{Task, TaskStatus, Priority, Attachment, TaskFilter, TaskPatch};
pub use recurrence::{RecurrenceRule, Frequency};
pub use time_entry::{TimeEntry, format_duration};

pub use comment::Comment;
pub use notification::{Notification, NotificationKind};
pub use team::{Team, Membership, Role};

pub use error::{CoreError, Result};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
