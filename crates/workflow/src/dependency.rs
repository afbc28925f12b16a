//! Dependency gating for task completion.

use std::collections::{HashMap, HashSet};

use taskdeck_core::{Task, TaskFilter, TaskId, TaskStatus};
use taskdeck_storage::Storage;
use tracing::debug;

use crate::Result;

/// Outcome of a dependency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// All dependencies completed
    Ready,
    /// These dependencies are not completed (or no longer exist)
    Blocked(Vec<TaskId>),
}

impl Gate {
    /// Whether the task may be completed.
    pub fn is_ready(&self) -> bool {
        matches!(self, Gate::Ready)
    }
}

/// Decides whether a task's prerequisites are done.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyGate;

impl DependencyGate {
    /// Create a new gate.
    pub fn new() -> Self {
        Self
    }

    /// Check a task's dependencies. An empty list is always ready; a
    /// dependency that cannot be loaded counts as pending.
    pub async fn check(&self, storage: &dyn Storage, task: &Task) -> Result<Gate> {
        let mut pending = Vec::new();
        for dep_id in &task.dependencies {
            match storage.load_task(*dep_id).await? {
                Some(dep) if dep.status == TaskStatus::Completed => {}
                _ => pending.push(*dep_id),
            }
        }

        if pending.is_empty() {
            Ok(Gate::Ready)
        } else {
            Ok(Gate::Blocked(pending))
        }
    }

    /// Recompute `dependencies_met` on `task` without saving it.
    pub async fn refresh(&self, storage: &dyn Storage, task: &mut Task) -> Result<bool> {
        let met = self.check(storage, task).await?.is_ready();
        task.dependencies_met = met;
        Ok(met)
    }

    /// Recompute the flag on every task that depends on `changed` and save
    /// the ones whose flag flipped. Returns the ids that were updated.
    pub async fn refresh_dependents(
        &self,
        storage: &mut dyn Storage,
        changed: TaskId,
    ) -> Result<Vec<TaskId>> {
        let all = storage.list_tasks(&TaskFilter::default()).await?;
        let statuses: HashMap<TaskId, TaskStatus> = all.iter().map(|t| (t.id, t.status)).collect();

        let mut updated = Vec::new();
        for mut task in all.into_iter().filter(|t| t.dependencies.contains(&changed)) {
            let met = task
                .dependencies
                .iter()
                .all(|d| statuses.get(d) == Some(&TaskStatus::Completed));
            if met != task.dependencies_met {
                task.dependencies_met = met;
                task.touch();
                storage.save_task(&task).await?;
                debug!(task = %task.id, met, "dependency flag changed");
                updated.push(task.id);
            }
        }
        Ok(updated)
    }

    /// Whether making `task` depend on `dependency` would close a cycle.
    pub async fn would_cycle(
        &self,
        storage: &dyn Storage,
        task: TaskId,
        dependency: TaskId,
    ) -> Result<bool> {
        if task == dependency {
            return Ok(true);
        }

        // Walk everything `dependency` transitively depends on.
        let mut visited = HashSet::new();
        let mut stack = vec![dependency];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(current) = storage.load_task(id).await? else {
                continue;
            };
            for next in current.dependencies {
                if next == task {
                    return Ok(true);
                }
                stack.push(next);
            }
        }
        Ok(false)
    }
}
