//! In-memory storage backend for tests and ephemeral sessions.

use std::collections::HashMap;
use taskdeck_core::{
    Comment, CommentId, Membership, MembershipId, Notification, NotificationId, Task, TaskFilter,
    TaskId, Team, TeamId, TimeEntry, TimeEntryId, UserId,
};
use super::{Storage, Result};

/// Keeps every document in hash maps. Nothing survives a drop.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    tasks: HashMap<TaskId, Task>,
    time_entries: HashMap<TimeEntryId, TimeEntry>,
    comments: HashMap<CommentId, Comment>,
    notifications: HashMap<NotificationId, Notification>,
    teams: HashMap<TeamId, Team>,
    memberships: HashMap<MembershipId, Membership>,
    commits: usize,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits so far.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_task(&mut self, task: &Task) -> Result<()> {
        self.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn load_task(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self.tasks.values().filter(|t| filter.matches(t)).cloned().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn delete_task(&mut self, id: TaskId) -> Result<()> {
        self.tasks.remove(&id);
        Ok(())
    }

    async fn save_time_entry(&mut self, entry: &TimeEntry) -> Result<()> {
        self.time_entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn load_time_entry(&self, id: TimeEntryId) -> Result<Option<TimeEntry>> {
        Ok(self.time_entries.get(&id).cloned())
    }

    async fn list_time_entries_for_task(&self, task_id: TaskId) -> Result<Vec<TimeEntry>> {
        let mut entries: Vec<_> = self
            .time_entries
            .values()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.start_time);
        Ok(entries)
    }

    async fn list_time_entries_for_user(&self, user_id: &UserId) -> Result<Vec<TimeEntry>> {
        let mut entries: Vec<_> = self
            .time_entries
            .values()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.start_time);
        Ok(entries)
    }

    async fn delete_time_entry(&mut self, id: TimeEntryId) -> Result<()> {
        self.time_entries.remove(&id);
        Ok(())
    }

    async fn save_comment(&mut self, comment: &Comment) -> Result<()> {
        self.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn load_comment(&self, id: CommentId) -> Result<Option<Comment>> {
        Ok(self.comments.get(&id).cloned())
    }

    async fn list_comments(&self, task_id: TaskId) -> Result<Vec<Comment>> {
        let mut comments: Vec<_> = self
            .comments
            .values()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn delete_comment(&mut self, id: CommentId) -> Result<()> {
        self.comments.remove(&id);
        Ok(())
    }

    async fn save_notification(&mut self, notification: &Notification) -> Result<()> {
        self.notifications.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn load_notification(&self, id: NotificationId) -> Result<Option<Notification>> {
        Ok(self.notifications.get(&id).cloned())
    }

    async fn list_notifications(&self, user_id: &UserId) -> Result<Vec<Notification>> {
        let mut notifications: Vec<_> = self
            .notifications
            .values()
            .filter(|n| n.is_for(user_id))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn delete_notification(&mut self, id: NotificationId) -> Result<()> {
        self.notifications.remove(&id);
        Ok(())
    }

    async fn save_team(&mut self, team: &Team) -> Result<()> {
        self.teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn load_team(&self, id: TeamId) -> Result<Option<Team>> {
        Ok(self.teams.get(&id).cloned())
    }

    async fn list_teams(&self) -> Result<Vec<Team>> {
        let mut teams: Vec<_> = self.teams.values().cloned().collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn delete_team(&mut self, id: TeamId) -> Result<()> {
        self.teams.remove(&id);
        Ok(())
    }

    async fn save_membership(&mut self, membership: &Membership) -> Result<()> {
        self.memberships.insert(membership.id, membership.clone());
        Ok(())
    }

    async fn list_memberships_for_team(&self, team_id: TeamId) -> Result<Vec<Membership>> {
        let mut members: Vec<_> = self
            .memberships
            .values()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>> {
        let mut members: Vec<_> = self
            .memberships
            .values()
            .filter(|m| &m.user_id == user_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn delete_membership(&mut self, id: MembershipId) -> Result<()> {
        self.memberships.remove(&id);
        Ok(())
    }

    async fn commit(&mut self, _message: &str) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}
