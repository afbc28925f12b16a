//! Command-line configuration shared by every subcommand.

use std::path::PathBuf;

use clap::Args;
use taskdeck_workflow::WorkflowConfig;

/// Global options. Each can also come from the environment.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Data directory
    #[arg(long = "data", env = "TASKDECK_DATA", default_value = ".taskdeck", global = true)]
    pub data_dir: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "TASKDECK_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Days ahead that count as "due soon"
    #[arg(long, env = "TASKDECK_DUE_SOON_DAYS", default_value_t = 2, global = true)]
    pub due_soon_days: i64,

    /// Do not notify assignees about changes
    #[arg(long, global = true)]
    pub quiet_notifications: bool,
}

impl Config {
    /// Settings for the workflow services.
    pub fn workflow(&self) -> WorkflowConfig {
        WorkflowConfig::default()
            .with_due_soon_window(self.due_soon_days)
            .with_notify_assignees(!self.quiet_notifications)
    }

    /// Where the signed-in session is kept.
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}
