//! Workflow configuration.

use serde::{Deserialize, Serialize};

/// Tunables shared by the workflow services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Days ahead of a due date that a reminder is sent
    pub due_soon_window_days: i64,

    /// Notify assignees about task changes
    pub notify_assignees: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            due_soon_window_days: 2,
            notify_assignees: true,
        }
    }
}

impl WorkflowConfig {
    /// Set the reminder window.
    pub fn with_due_soon_window(mut self, days: i64) -> Self {
        self.due_soon_window_days = days;
        self
    }

    /// Enable or disable assignee notifications.
    pub fn with_notify_assignees(mut self, enabled: bool) -> Self {
        self.notify_assignees = enabled;
        self
    }
}
