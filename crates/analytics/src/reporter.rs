//! Reports over stored tasks.

use async_trait::async_trait;
use chrono::NaiveDate;
use taskdeck_core::{TaskFilter, UserId};
use taskdeck_storage::Storage;
use taskdeck_workflow::{Result, SharedStorage, TaskManager, WorkflowConfig, WorkflowError};
use tracing::debug;

use crate::{CalendarMonth, DashboardStats, KanbanBoard, ProductivityReport};

/// Produces the views a user sees of their tasks.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Headline counters.
    async fn dashboard(&self, viewer: &UserId, today: NaiveDate) -> Result<DashboardStats>;

    /// Tasks by status.
    async fn board(&self, viewer: &UserId, filter: &TaskFilter) -> Result<KanbanBoard>;

    /// Tasks by due date for one month.
    async fn calendar(&self, viewer: &UserId, year: i32, month: u32) -> Result<CalendarMonth>;

    /// Completions and tracked time between two dates.
    async fn productivity(&self, viewer: &UserId, from: NaiveDate, to: NaiveDate) -> Result<ProductivityReport>;
}

/// [`Reporter`] over shared storage. Only tasks the viewer can see count.
pub struct StorageReporter<S: Storage> {
    storage: SharedStorage<S>,
    tasks: TaskManager<S>,
}

impl<S: Storage> StorageReporter<S> {
    /// Create a reporter.
    pub fn new(storage: SharedStorage<S>) -> Self {
        Self {
            tasks: TaskManager::new(storage.clone(), WorkflowConfig::default()),
            storage,
        }
    }
}

#[async_trait]
impl<S: Storage + 'static> Reporter for StorageReporter<S> {
    async fn dashboard(&self, viewer: &UserId, today: NaiveDate) -> Result<DashboardStats> {
        let tasks = self.tasks.list(viewer, &TaskFilter::default()).await?;
        Ok(DashboardStats::compute(&tasks, today))
    }

    async fn board(&self, viewer: &UserId, filter: &TaskFilter) -> Result<KanbanBoard> {
        let tasks = self.tasks.list(viewer, filter).await?;
        Ok(KanbanBoard::build(tasks))
    }

    async fn calendar(&self, viewer: &UserId, year: i32, month: u32) -> Result<CalendarMonth> {
        let tasks = self.tasks.list(viewer, &TaskFilter::default()).await?;
        CalendarMonth::build(year, month, tasks)
            .ok_or_else(|| WorkflowError::Invalid(format!("no such month: {}-{}", year, month)))
    }

    async fn productivity(&self, viewer: &UserId, from: NaiveDate, to: NaiveDate) -> Result<ProductivityReport> {
        let tasks = self.tasks.list(viewer, &TaskFilter::default()).await?;
        let mut entries = Vec::new();
        {
            let storage = self.storage.lock().await;
            for task in &tasks {
                entries.extend(storage.list_time_entries_for_task(task.id).await?);
            }
        }
        debug!(tasks = tasks.len(), entries = entries.len(), "productivity inputs loaded");
        Ok(ProductivityReport::compute(&tasks, &entries, from, to))
    }
}
