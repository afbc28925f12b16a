//! Task management service.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use taskdeck_core::{
    Attachment, NotificationKind, Priority, RecurrenceRule, Task, TaskFilter, TaskId, TaskPatch,
    TaskStatus, TeamId, UserId,
};
use taskdeck_storage::Storage;
use tracing::{info, warn};

use crate::dependency::{DependencyGate, Gate};
use crate::notifications::deliver;
use crate::recurrence::spawn_successor;
use crate::teams::{require, role_in, Access};
use crate::{Result, SharedStorage, WorkflowConfig, WorkflowError};

/// Specification for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Priority
    pub priority: Priority,
    /// Due date
    pub due_date: Option<NaiveDate>,
    /// Tags
    pub tags: BTreeSet<String>,
    /// Initial assignees
    pub assigned_to: BTreeSet<UserId>,
    /// Prerequisite tasks
    pub dependencies: Vec<TaskId>,
    /// Recurrence rule
    pub recurrence: Option<RecurrenceRule>,
    /// Team to share with
    pub team_id: Option<TeamId>,
}

impl NewTask {
    /// A medium-priority task with nothing else set.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: None,
            tags: BTreeSet::new(),
            assigned_to: BTreeSet::new(),
            dependencies: Vec::new(),
            recurrence: None,
            team_id: None,
        }
    }
}

/// Outcome of a status change.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The task after the change
    pub task: Task,
    /// Next instance, if the task recurs
    pub successor: Option<Task>,
    /// Dependents whose `dependencies_met` flag changed
    pub dependents_changed: Vec<TaskId>,
}

/// Creates, updates and completes tasks.
pub struct TaskManager<S: Storage> {
    storage: SharedStorage<S>,
    gate: DependencyGate,
    config: WorkflowConfig,
}

impl<S: Storage> TaskManager<S> {
    /// Create a manager over shared storage.
    pub fn new(storage: SharedStorage<S>, config: WorkflowConfig) -> Self {
        Self {
            storage,
            gate: DependencyGate::new(),
            config,
        }
    }

    /// Create a task owned by `actor`.
    pub async fn create(&self, actor: &UserId, draft: NewTask) -> Result<Task> {
        let mut task = Task::new(draft.title, actor.clone())?;
        if let Some(rule) = &draft.recurrence {
            rule.validate()?;
        }
        task.description = draft.description;
        task.priority = draft.priority;
        task.due_date = draft.due_date;
        task.tags = draft.tags;
        task.assigned_to = draft.assigned_to;
        task.recurrence = draft.recurrence;
        task.team_id = draft.team_id;

        let mut storage = self.storage.lock().await;
        if let Some(team) = task.team_id {
            if role_in(&*storage, team, actor).await?.is_none() {
                return Err(WorkflowError::denied(actor, format!("share tasks with team {}", team)));
            }
        }
        for dep in draft.dependencies {
            if storage.load_task(dep).await?.is_none() {
                return Err(WorkflowError::TaskNotFound(dep));
            }
            if !task.dependencies.contains(&dep) {
                task.dependencies.push(dep);
            }
        }
        self.gate.refresh(&*storage, &mut task).await?;
        storage.save_task(&task).await?;

        if self.config.notify_assignees {
            let mut recipients = task.assigned_to.clone();
            recipients.remove(actor);
            deliver(
                &mut *storage,
                NotificationKind::TaskAssigned,
                format!("{} assigned you to \"{}\"", actor, task.title),
                recipients,
                Some(task.id),
            )
            .await?;
        }
        storage.commit(&format!("Create task {}", task.id)).await?;
        info!(task = %task.id, title = %task.title, "task created");
        Ok(task)
    }

    /// Load a task `viewer` can see.
    pub async fn get(&self, viewer: &UserId, id: TaskId) -> Result<Task> {
        let storage = self.storage.lock().await;
        let task = load(&*storage, id).await?;
        require(&*storage, &task, viewer, Access::View, "view").await?;
        Ok(task)
    }

    /// Tasks matching `filter` that `viewer` owns, is assigned to, or sees
    /// through a team.
    pub async fn list(&self, viewer: &UserId, filter: &TaskFilter) -> Result<Vec<Task>> {
        let storage = self.storage.lock().await;
        let teams: HashSet<TeamId> = storage
            .list_memberships_for_user(viewer)
            .await?
            .into_iter()
            .map(|m| m.team_id)
            .collect();
        Ok(storage
            .list_tasks(filter)
            .await?
            .into_iter()
            .filter(|t| {
                &t.owner == viewer
                    || t.assigned_to.contains(viewer)
                    || t.team_id.is_some_and(|team| teams.contains(&team))
            })
            .collect())
    }

    /// Apply a partial update.
    pub async fn update(&self, actor: &UserId, id: TaskId, patch: TaskPatch) -> Result<Task> {
        let mut storage = self.storage.lock().await;
        let mut task = load(&*storage, id).await?;
        require(&*storage, &task, actor, Access::Edit, "edit").await?;
        if patch.team_id.is_some() {
            require(&*storage, &task, actor, Access::Manage, "move").await?;
        }
        if let Some(Some(team)) = patch.team_id {
            if role_in(&*storage, team, actor).await?.is_none() {
                return Err(WorkflowError::denied(actor, format!("share tasks with team {}", team)));
            }
        }
        patch.apply(&mut task)?;
        storage.save_task(&task).await?;
        self.notify_stakeholders(
            &mut *storage,
            actor,
            &task,
            NotificationKind::TaskUpdated,
            format!("{} updated \"{}\"", actor, task.title),
        )
        .await?;
        storage.commit(&format!("Update task {}", task.id)).await?;
        Ok(task)
    }

    /// Move a task to `status`.
    ///
    /// Completing is refused while any dependency is open. A completed
    /// recurring task spawns its next instance; failing to spawn is logged
    /// and does not undo the completion.
    pub async fn set_status(&self, actor: &UserId, id: TaskId, status: TaskStatus) -> Result<Completion> {
        let today = chrono::Local::now().date_naive();
        let mut storage = self.storage.lock().await;
        let mut task = load(&*storage, id).await?;
        require(&*storage, &task, actor, Access::Edit, "change status of").await?;

        if status == TaskStatus::Completed {
            if let Gate::Blocked(pending) = self.gate.check(&*storage, &task).await? {
                task.dependencies_met = false;
                storage.save_task(&task).await?;
                warn!(task = %id, pending = pending.len(), "completion blocked by dependencies");
                return Err(WorkflowError::DependenciesIncomplete { task: id, pending });
            }
            task.dependencies_met = true;
        }

        let previous = task.status;
        task.status = status;
        task.completed_at = (status == TaskStatus::Completed).then(chrono::Utc::now);
        task.touch();
        storage.save_task(&task).await?;

        let mut successor = None;
        if status == TaskStatus::Completed {
            match spawn_successor(&mut *storage, &mut task, today).await {
                Ok(next) => successor = next,
                Err(e) => warn!(task = %id, error = %e, "failed to spawn recurring task"),
            }
        }

        let dependents_changed = if previous != status {
            self.gate.refresh_dependents(&mut *storage, id).await?
        } else {
            Vec::new()
        };

        if status == TaskStatus::Completed && previous != status {
            self.notify_stakeholders(
                &mut *storage,
                actor,
                &task,
                NotificationKind::TaskCompleted,
                format!("{} completed \"{}\"", actor, task.title),
            )
            .await?;
        }
        storage.commit(&format!("Set task {} to {}", id, status)).await?;
        info!(task = %id, from = %previous, to = %status, "status changed");

        Ok(Completion {
            task,
            successor,
            dependents_changed,
        })
    }

    /// Shorthand for completing a task.
    pub async fn complete(&self, actor: &UserId, id: TaskId) -> Result<Completion> {
        self.set_status(actor, id, TaskStatus::Completed).await
    }

    /// Assign `user` to a task and tell them.
    pub async fn assign(&self, actor: &UserId, id: TaskId, user: &UserId) -> Result<Task> {
        let mut storage = self.storage.lock().await;
        let mut task = load(&*storage, id).await?;
        require(&*storage, &task, actor, Access::Edit, "assign").await?;
        if !task.assigned_to.insert(user.clone()) {
            return Ok(task);
        }
        task.touch();
        storage.save_task(&task).await?;
        if self.config.notify_assignees && user != actor {
            deliver(
                &mut *storage,
                NotificationKind::TaskAssigned,
                format!("{} assigned you to \"{}\"", actor, task.title),
                [user.clone()].into_iter().collect(),
                Some(task.id),
            )
            .await?;
        }
        storage.commit(&format!("Assign {} to task {}", user, id)).await?;
        Ok(task)
    }

    /// Remove `user` from a task's assignees.
    pub async fn unassign(&self, actor: &UserId, id: TaskId, user: &UserId) -> Result<Task> {
        let mut storage = self.storage.lock().await;
        let mut task = load(&*storage, id).await?;
        // Assignees hold Edit, so they may drop themselves; outsiders may not.
        require(&*storage, &task, actor, Access::Edit, "unassign").await?;
        if task.assigned_to.remove(user) {
            task.touch();
            storage.save_task(&task).await?;
            storage.commit(&format!("Unassign {} from task {}", user, id)).await?;
        }
        Ok(task)
    }

    /// Make `id` depend on `dependency`.
    pub async fn add_dependency(&self, actor: &UserId, id: TaskId, dependency: TaskId) -> Result<Task> {
        let mut storage = self.storage.lock().await;
        let mut task = load(&*storage, id).await?;
        require(&*storage, &task, actor, Access::Edit, "edit dependencies of").await?;
        load(&*storage, dependency).await?;
        if self.gate.would_cycle(&*storage, id, dependency).await? {
            return Err(WorkflowError::DependencyCycle { task: id, dependency });
        }
        if !task.dependencies.contains(&dependency) {
            task.dependencies.push(dependency);
        }
        self.gate.refresh(&*storage, &mut task).await?;
        task.touch();
        storage.save_task(&task).await?;
        storage.commit(&format!("Task {} depends on {}", id, dependency)).await?;
        Ok(task)
    }

    /// Drop a dependency.
    pub async fn remove_dependency(&self, actor: &UserId, id: TaskId, dependency: TaskId) -> Result<Task> {
        let mut storage = self.storage.lock().await;
        let mut task = load(&*storage, id).await?;
        require(&*storage, &task, actor, Access::Edit, "edit dependencies of").await?;
        task.dependencies.retain(|d| *d != dependency);
        self.gate.refresh(&*storage, &mut task).await?;
        task.touch();
        storage.save_task(&task).await?;
        storage.commit(&format!("Task {} no longer depends on {}", id, dependency)).await?;
        Ok(task)
    }

    /// Current dependency gate of a task.
    pub async fn gate(&self, viewer: &UserId, id: TaskId) -> Result<Gate> {
        let storage = self.storage.lock().await;
        let task = load(&*storage, id).await?;
        require(&*storage, &task, viewer, Access::View, "view").await?;
        self.gate.check(&*storage, &task).await
    }

    /// Record attachment metadata. Replaces an attachment of the same name.
    pub async fn attach(&self, actor: &UserId, id: TaskId, attachment: Attachment) -> Result<Task> {
        let mut storage = self.storage.lock().await;
        let mut task = load(&*storage, id).await?;
        require(&*storage, &task, actor, Access::Edit, "attach files to").await?;
        task.attachments.retain(|a| a.name != attachment.name);
        task.attachments.push(attachment);
        task.touch();
        storage.save_task(&task).await?;
        storage.commit(&format!("Attach file to task {}", id)).await?;
        Ok(task)
    }

    /// Forget attachment metadata by name.
    pub async fn detach(&self, actor: &UserId, id: TaskId, name: &str) -> Result<Task> {
        let mut storage = self.storage.lock().await;
        let mut task = load(&*storage, id).await?;
        require(&*storage, &task, actor, Access::Edit, "detach files from").await?;
        task.attachments.retain(|a| a.name != name);
        task.touch();
        storage.save_task(&task).await?;
        storage.commit(&format!("Detach file from task {}", id)).await?;
        Ok(task)
    }

    /// Delete a task with its time entries and comments, and drop it from
    /// other tasks' dependency lists.
    pub async fn delete(&self, actor: &UserId, id: TaskId) -> Result<()> {
        let mut storage = self.storage.lock().await;
        let task = load(&*storage, id).await?;
        require(&*storage, &task, actor, Access::Manage, "delete").await?;

        for entry in storage.list_time_entries_for_task(id).await? {
            storage.delete_time_entry(entry.id).await?;
        }
        for comment in storage.list_comments(id).await? {
            storage.delete_comment(comment.id).await?;
        }
        storage.delete_task(id).await?;

        let dependents = storage.list_tasks(&TaskFilter::default()).await?;
        for mut dependent in dependents.into_iter().filter(|t| t.dependencies.contains(&id)) {
            dependent.dependencies.retain(|d| *d != id);
            self.gate.refresh(&*storage, &mut dependent).await?;
            dependent.touch();
            storage.save_task(&dependent).await?;
        }
        storage.commit(&format!("Delete task {}", id)).await?;
        info!(task = %id, "task deleted");
        Ok(())
    }

    async fn notify_stakeholders(
        &self,
        storage: &mut dyn Storage,
        actor: &UserId,
        task: &Task,
        kind: NotificationKind,
        message: String,
    ) -> Result<()> {
        if !self.config.notify_assignees {
            return Ok(());
        }
        let mut recipients = task.stakeholders();
        recipients.remove(actor);
        deliver(storage, kind, message, recipients, Some(task.id)).await?;
        Ok(())
    }
}

async fn load(storage: &dyn Storage, id: TaskId) -> Result<Task> {
    storage.load_task(id).await?.ok_or(WorkflowError::TaskNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{shared, TeamService, TimeTracker};
    use taskdeck_core::{Frequency, Role};
    use taskdeck_storage::MemoryStorage;

    fn user(name: &str) -> UserId {
        UserId::new(name)
    }

    fn manager() -> (TaskManager<MemoryStorage>, SharedStorage<MemoryStorage>) {
        let storage = shared(MemoryStorage::new());
        (TaskManager::new(storage.clone(), WorkflowConfig::default()), storage)
    }

    #[tokio::test]
    async fn test_create_notifies_assignees() {
        let (manager, storage) = manager();
        let mut draft = NewTask::new("Write docs");
        draft.assigned_to = [user("alice"), user("bob")].into_iter().collect();
        let task = manager.create(&user("alice"), draft).await.unwrap();

        let s = storage.lock().await;
        assert!(s.load_task(task.id).await.unwrap().is_some());
        assert_eq!(s.list_notifications(&user("bob")).await.unwrap().len(), 1);
        assert!(s.list_notifications(&user("alice")).await.unwrap().is_empty());
        assert_eq!(s.commits(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_dependency() {
        let (manager, _) = manager();
        let mut draft = NewTask::new("Deploy");
        draft.dependencies = vec![TaskId::new()];
        let err = manager.create(&user("alice"), draft).await.unwrap_err();
        assert!(matches!(err, WorkflowError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_completion_gated_on_dependencies() {
        let (manager, _) = manager();
        let alice = user("alice");
        let build = manager.create(&alice, NewTask::new("Build")).await.unwrap();
        let mut draft = NewTask::new("Release");
        draft.dependencies = vec![build.id];
        let release = manager.create(&alice, draft).await.unwrap();
        assert!(!release.dependencies_met);

        let err = manager.complete(&alice, release.id).await.unwrap_err();
        match err {
            WorkflowError::DependenciesIncomplete { task, pending } => {
                assert_eq!(task, release.id);
                assert_eq!(pending, vec![build.id]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let done = manager.complete(&alice, build.id).await.unwrap();
        assert_eq!(done.dependents_changed, vec![release.id]);
        assert!(manager.get(&alice, release.id).await.unwrap().dependencies_met);

        let released = manager.complete(&alice, release.id).await.unwrap();
        assert_eq!(released.task.status, TaskStatus::Completed);
        assert!(released.task.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_reopening_dependency_blocks_dependents_again() {
        let (manager, _) = manager();
        let alice = user("alice");
        let a = manager.create(&alice, NewTask::new("A")).await.unwrap();
        let mut draft = NewTask::new("B");
        draft.dependencies = vec![a.id];
        let b = manager.create(&alice, draft).await.unwrap();

        manager.complete(&alice, a.id).await.unwrap();
        let reopened = manager.set_status(&alice, a.id, TaskStatus::InProgress).await.unwrap();
        assert_eq!(reopened.dependents_changed, vec![b.id]);
        assert!(reopened.task.completed_at.is_none());
        assert!(!manager.get(&alice, b.id).await.unwrap().dependencies_met);
    }

    #[tokio::test]
    async fn test_completing_recurring_task_spawns_successor() {
        let (manager, _) = manager();
        let alice = user("alice");
        let mut draft = NewTask::new("Invoice");
        draft.due_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        draft.recurrence = Some(RecurrenceRule::new(Frequency::Monthly, 1).unwrap());
        let task = manager.create(&alice, draft).await.unwrap();

        let done = manager.complete(&alice, task.id).await.unwrap();
        let next = done.successor.unwrap();
        assert_eq!(next.due_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(done.task.recurrence_successor, Some(next.id));

        // Re-completing the same instance does not spawn again
        manager.set_status(&alice, task.id, TaskStatus::Review).await.unwrap();
        let again = manager.complete(&alice, task.id).await.unwrap();
        assert!(again.successor.is_none());
        let open = manager
            .list(&alice, &TaskFilter { status: Some(vec![TaskStatus::NotStarted]), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
    }

    #[tokio::test]
    async fn test_dependency_cycle_rejected() {
        let (manager, _) = manager();
        let alice = user("alice");
        let a = manager.create(&alice, NewTask::new("A")).await.unwrap();
        let b = manager.create(&alice, NewTask::new("B")).await.unwrap();
        manager.add_dependency(&alice, b.id, a.id).await.unwrap();

        let err = manager.add_dependency(&alice, a.id, b.id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::DependencyCycle { .. }));

        let b = manager.remove_dependency(&alice, b.id, a.id).await.unwrap();
        assert!(b.dependencies.is_empty());
        assert!(b.dependencies_met);
    }

    #[tokio::test]
    async fn test_list_respects_visibility() {
        let storage = shared(MemoryStorage::new());
        let manager = TaskManager::new(storage.clone(), WorkflowConfig::default());
        let teams = TeamService::new(storage.clone());
        let team = teams.create_team("Ops", &user("alice")).await.unwrap();
        teams.add_member(&user("alice"), team.id, &user("bob"), Role::Member).await.unwrap();

        let mut shared_draft = NewTask::new("Team task");
        shared_draft.team_id = Some(team.id);
        manager.create(&user("alice"), shared_draft).await.unwrap();
        manager.create(&user("alice"), NewTask::new("Private")).await.unwrap();

        let visible = manager.list(&user("bob"), &TaskFilter::default()).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Team task");
        assert!(manager.list(&user("carol"), &TaskFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_member_cannot_edit_team_task() {
        let storage = shared(MemoryStorage::new());
        let manager = TaskManager::new(storage.clone(), WorkflowConfig::default());
        let teams = TeamService::new(storage.clone());
        let team = teams.create_team("Ops", &user("alice")).await.unwrap();
        teams.add_member(&user("alice"), team.id, &user("bob"), Role::Member).await.unwrap();
        let mut draft = NewTask::new("Team task");
        draft.team_id = Some(team.id);
        let task = manager.create(&user("alice"), draft).await.unwrap();

        let patch = TaskPatch {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        let err = manager.update(&user("bob"), task.id, patch).await.unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied { .. }));
        assert!(manager.get(&user("bob"), task.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_cleans_up() {
        let storage = shared(MemoryStorage::new());
        let manager = TaskManager::new(storage.clone(), WorkflowConfig::default());
        let tracker = TimeTracker::new(storage.clone());
        let alice = user("alice");
        let a = manager.create(&alice, NewTask::new("A")).await.unwrap();
        let mut draft = NewTask::new("B");
        draft.dependencies = vec![a.id];
        let b = manager.create(&alice, draft).await.unwrap();
        tracker.start(&alice, a.id).await.unwrap();
        tracker.stop(&alice).await.unwrap();

        manager.delete(&alice, a.id).await.unwrap();
        let b = manager.get(&alice, b.id).await.unwrap();
        assert!(b.dependencies.is_empty());
        assert!(b.dependencies_met);
        assert!(tracker.entries_for_task(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_and_attach() {
        let (manager, storage) = manager();
        let alice = user("alice");
        let task = manager.create(&alice, NewTask::new("Design")).await.unwrap();
        let task_after = manager.assign(&alice, task.id, &user("bob")).await.unwrap();
        assert!(task_after.assigned_to.contains(&user("bob")));
        assert_eq!(storage.lock().await.list_notifications(&user("bob")).await.unwrap().len(), 1);

        let attachment = Attachment {
            name: "mock.png".into(),
            location: "files/mock.png".into(),
            size: 2048,
            content_type: Some("image/png".into()),
            uploaded_by: user("bob"),
            uploaded_at: chrono::Utc::now(),
        };
        let with_file = manager.attach(&user("bob"), task.id, attachment.clone()).await.unwrap();
        let with_file_again = manager.attach(&user("bob"), task.id, attachment).await.unwrap();
        assert_eq!(with_file.attachments.len(), 1);
        assert_eq!(with_file_again.attachments.len(), 1);
        let without = manager.detach(&alice, task.id, "mock.png").await.unwrap();
        assert!(without.attachments.is_empty());

        let dropped = manager.unassign(&user("bob"), task.id, &user("bob")).await.unwrap();
        assert!(dropped.assigned_to.is_empty());
    }

    #[tokio::test]
    async fn test_outsider_cannot_unassign_anyone() {
        let (manager, _) = manager();
        let alice = user("alice");
        let mallory = user("mallory");
        let mut draft = NewTask::new("Private");
        draft.assigned_to = BTreeSet::from([user("bob")]);
        let task = manager.create(&alice, draft).await.unwrap();

        let err = manager.unassign(&mallory, task.id, &mallory).await.unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied { .. }));
        let err = manager.unassign(&mallory, task.id, &user("bob")).await.unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied { .. }));

        let task = manager.unassign(&user("bob"), task.id, &user("bob")).await.unwrap();
        assert!(task.assigned_to.is_empty());
    }

    #[tokio::test]
    async fn test_assignee_cannot_move_task_between_teams() {
        let storage = shared(MemoryStorage::new());
        let manager = TaskManager::new(storage.clone(), WorkflowConfig::default());
        let teams = TeamService::new(storage.clone());
        let alice = user("alice");
        let team = teams.create_team("Platform", &alice).await.unwrap();
        teams.add_member(&alice, team.id, &user("bob"), Role::Member).await.unwrap();
        let mut draft = NewTask::new("Shared");
        draft.team_id = Some(team.id);
        draft.assigned_to = BTreeSet::from([user("bob")]);
        let task = manager.create(&alice, draft).await.unwrap();

        let detach = TaskPatch {
            team_id: Some(None),
            ..Default::default()
        };
        let err = manager.update(&user("bob"), task.id, detach.clone()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied { .. }));

        let rename = TaskPatch {
            title: Some("Shared work".into()),
            ..Default::default()
        };
        assert!(manager.update(&user("bob"), task.id, rename).await.is_ok());
        let moved = manager.update(&alice, task.id, detach).await.unwrap();
        assert_eq!(moved.team_id, None);
    }
}
