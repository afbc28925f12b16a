//! Task model - the core unit of work in Taskdeck.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::id::{TaskId, TeamId};
use crate::recurrence::RecurrenceRule;
use crate::user::UserId;
use crate::Time;

/// A task represents a trackable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Current status
    pub status: TaskStatus,

    /// Priority
    pub priority: Priority,

    /// Due date
    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    /// Due date the last due-soon reminder went out for
    #[serde(default)]
    pub reminded_for: Option<NaiveDate>,

    /// Free-form labels
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Users working on the task
    #[serde(default)]
    pub assigned_to: BTreeSet<UserId>,

    /// Tasks that must be completed before this one
    #[serde(default)]
    pub dependencies: Vec<TaskId>,

    /// Whether every dependency is completed
    #[serde(default = "default_true")]
    pub dependencies_met: bool,

    /// Recurrence policy
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,

    /// 1-based position in the recurrence series
    #[serde(default = "default_occurrence")]
    pub occurrence: u32,

    /// The instance this one was spawned from
    #[serde(default)]
    pub recurrence_parent: Option<TaskId>,

    /// The instance spawned when this one was completed
    #[serde(default)]
    pub recurrence_successor: Option<TaskId>,

    /// Attached file metadata
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Owning user
    pub owner: UserId,

    /// Team sharing the task
    #[serde(default)]
    pub team_id: Option<TeamId>,

    /// Sum of all time entry durations, in seconds
    #[serde(default)]
    pub total_tracked_secs: u64,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,

    /// When the task was last completed
    #[serde(default)]
    pub completed_at: Option<Time>,
}

fn default_true() -> bool {
    true
}

fn default_occurrence() -> u32 {
    1
}

impl Task {
    /// Create a new task owned by `owner`.
    pub fn new(title: impl Into<String>, owner: UserId) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CoreError::EmptyTitle);
        }
        let now = chrono::Utc::now();
        Ok(Self {
            id: TaskId::new(),
            title,
            description: String::new(),
            status: TaskStatus::NotStarted,
            priority: Priority::Medium,
            due_date: None,
            reminded_for: None,
            tags: BTreeSet::new(),
            assigned_to: BTreeSet::new(),
            dependencies: Vec::new(),
            dependencies_met: true,
            recurrence: None,
            occurrence: 1,
            recurrence_parent: None,
            recurrence_successor: None,
            attachments: Vec::new(),
            owner,
            team_id: None,
            total_tracked_secs: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Whether the task has reached `Completed`.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Unfinished with a due date strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed() && self.due_date.is_some_and(|d| d < today)
    }

    /// Everyone who should hear about changes to this task.
    pub fn stakeholders(&self) -> BTreeSet<UserId> {
        let mut users = self.assigned_to.clone();
        users.insert(self.owner.clone());
        users
    }

    /// Mark the document as modified.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}

/// Lifecycle of a task; also the kanban column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not picked up yet
    NotStarted,
    /// Being worked on
    InProgress,
    /// Awaiting review
    Review,
    /// Done
    Completed,
}

impl TaskStatus {
    /// All statuses in board order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Completed,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "not-started" | "todo" => Ok(TaskStatus::NotStarted),
            "in-progress" | "doing" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(CoreError::UnknownVariant {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(CoreError::UnknownVariant {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// Metadata for a file attached to a task. The bytes live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name
    pub name: String,

    /// Path or URL of the stored blob
    pub location: String,

    /// Size in bytes
    pub size: u64,

    /// MIME type
    pub content_type: Option<String>,

    /// Who attached it
    pub uploaded_by: UserId,

    /// When
    pub uploaded_at: Time,
}

/// Partial update applied to a task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New priority
    pub priority: Option<Priority>,
    /// New due date; `Some(None)` clears it
    pub due_date: Option<Option<NaiveDate>>,
    /// Replacement tag set
    pub tags: Option<BTreeSet<String>>,
    /// New recurrence; `Some(None)` clears it
    pub recurrence: Option<Option<RecurrenceRule>>,
    /// New team; `Some(None)` makes the task personal
    pub team_id: Option<Option<TeamId>>,
}

impl TaskPatch {
    /// Apply the patch in place.
    pub fn apply(self, task: &mut Task) -> Result<()> {
        if let Some(title) = self.title {
            if title.trim().is_empty() {
                return Err(CoreError::EmptyTitle);
            }
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(recurrence) = self.recurrence {
            if let Some(rule) = &recurrence {
                rule.validate()?;
            }
            task.recurrence = recurrence;
        }
        if let Some(team_id) = self.team_id {
            task.team_id = team_id;
        }
        task.touch();
        Ok(())
    }
}

/// Filter for querying tasks. Every set condition must hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Filter by status
    pub status: Option<Vec<TaskStatus>>,

    /// Filter by priority
    pub priority: Option<Vec<Priority>>,

    /// Tasks assigned to this user
    pub assignee: Option<UserId>,

    /// Tasks owned by this user
    pub owner: Option<UserId>,

    /// Tasks shared with this team
    pub team: Option<TeamId>,

    /// Tasks carrying this tag
    pub tag: Option<String>,

    /// Due on or after
    pub due_from: Option<NaiveDate>,

    /// Due on or before
    pub due_to: Option<NaiveDate>,

    /// Case-insensitive substring of title or description
    pub text: Option<String>,
}

impl TaskFilter {
    /// Check a task against the filter.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(statuses) = &self.status {
            if !statuses.contains(&task.status) {
                return false;
            }
        }
        if let Some(priorities) = &self.priority {
            if !priorities.contains(&task.priority) {
                return false;
            }
        }
        if let Some(user) = &self.assignee {
            if !task.assigned_to.contains(user) {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if &task.owner != owner {
                return false;
            }
        }
        if let Some(team) = self.team {
            if task.team_id != Some(team) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !task.tags.contains(tag) {
                return false;
            }
        }
        if self.due_from.is_some() || self.due_to.is_some() {
            let Some(due) = task.due_date else {
                return false;
            };
            if self.due_from.is_some_and(|from| due < from) {
                return false;
            }
            if self.due_to.is_some_and(|to| due > to) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !task.title.to_lowercase().contains(&needle)
                && !task.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}
