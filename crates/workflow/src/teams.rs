//! Teams, membership roles and task access checks.

use taskdeck_core::{Membership, NotificationKind, Role, Task, Team, TeamId, UserId};
use taskdeck_storage::Storage;
use tracing::info;

use crate::notifications::deliver;
use crate::{Result, SharedStorage, WorkflowError};

/// What a user may do with a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    /// Not visible
    None,
    /// Visible through team membership
    View,
    /// May edit, change status and track time
    Edit,
    /// May also delete and reassign ownership
    Manage,
}

/// Role of `user` in `team`, if any.
pub(crate) async fn role_in(
    storage: &dyn Storage,
    team: TeamId,
    user: &UserId,
) -> Result<Option<Role>> {
    Ok(storage
        .list_memberships_for_team(team)
        .await?
        .into_iter()
        .find(|m| &m.user_id == user)
        .map(|m| m.role))
}

/// Resolve the access `user` has to `task`.
///
/// Owners manage their tasks, team owners and admins manage team tasks,
/// assignees edit, and other team members view.
pub(crate) async fn access(storage: &dyn Storage, task: &Task, user: &UserId) -> Result<Access> {
    if &task.owner == user {
        return Ok(Access::Manage);
    }
    let role = match task.team_id {
        Some(team) => role_in(storage, team, user).await?,
        None => None,
    };
    if role.is_some_and(|r| r.can_manage()) {
        return Ok(Access::Manage);
    }
    if task.assigned_to.contains(user) {
        return Ok(Access::Edit);
    }
    Ok(if role.is_some() { Access::View } else { Access::None })
}

/// Fail unless `user` has at least `needed` on `task`.
pub(crate) async fn require(
    storage: &dyn Storage,
    task: &Task,
    user: &UserId,
    needed: Access,
    action: &str,
) -> Result<()> {
    if access(storage, task, user).await? >= needed {
        Ok(())
    } else {
        Err(WorkflowError::denied(user, format!("{} task {}", action, task.id)))
    }
}

/// Team and membership management.
pub struct TeamService<S: Storage> {
    storage: SharedStorage<S>,
}

impl<S: Storage> TeamService<S> {
    /// Create a service over shared storage.
    pub fn new(storage: SharedStorage<S>) -> Self {
        Self { storage }
    }

    /// Create a team; the creator becomes its owner.
    pub async fn create_team(&self, name: impl Into<String>, owner: &UserId) -> Result<Team> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WorkflowError::Invalid("team name must not be empty".into()));
        }
        let team = Team {
            id: TeamId::new(),
            name,
            owner: owner.clone(),
            created_at: chrono::Utc::now(),
        };
        let mut storage = self.storage.lock().await;
        storage.save_team(&team).await?;
        storage
            .save_membership(&Membership::new(team.id, owner.clone(), Role::Owner))
            .await?;
        storage.commit(&format!("Create team {}", team.id)).await?;
        info!(team = %team.id, name = %team.name, "team created");
        Ok(team)
    }

    /// Load a team.
    pub async fn get(&self, team: TeamId) -> Result<Team> {
        self.storage
            .lock()
            .await
            .load_team(team)
            .await?
            .ok_or(WorkflowError::TeamNotFound(team))
    }

    /// Members of a team, earliest first.
    pub async fn members(&self, team: TeamId) -> Result<Vec<Membership>> {
        Ok(self.storage.lock().await.list_memberships_for_team(team).await?)
    }

    /// Teams `user` belongs to, with their role.
    pub async fn teams_of(&self, user: &UserId) -> Result<Vec<(Team, Role)>> {
        let storage = self.storage.lock().await;
        let mut teams = Vec::new();
        for membership in storage.list_memberships_for_user(user).await? {
            if let Some(team) = storage.load_team(membership.team_id).await? {
                teams.push((team, membership.role));
            }
        }
        Ok(teams)
    }

    /// Role of `user` in `team`.
    pub async fn role_of(&self, team: TeamId, user: &UserId) -> Result<Option<Role>> {
        let storage = self.storage.lock().await;
        role_in(&*storage, team, user).await
    }

    /// Add `user` to `team` as `role`. Owners and admins may add members;
    /// only owners may add another owner.
    pub async fn add_member(
        &self,
        actor: &UserId,
        team: TeamId,
        user: &UserId,
        role: Role,
    ) -> Result<Membership> {
        let mut storage = self.storage.lock().await;
        let team_doc = storage.load_team(team).await?.ok_or(WorkflowError::TeamNotFound(team))?;
        let actor_role = role_in(&*storage, team, actor).await?;
        match actor_role {
            Some(Role::Owner) => {}
            Some(Role::Admin) if role != Role::Owner => {}
            _ => return Err(WorkflowError::denied(actor, format!("add {} to team {}", role, team))),
        }
        if role_in(&*storage, team, user).await?.is_some() {
            return Err(WorkflowError::Membership(format!("{} is already a member", user)));
        }

        let membership = Membership::new(team, user.clone(), role);
        storage.save_membership(&membership).await?;
        deliver(
            &mut *storage,
            NotificationKind::TeamInvite,
            format!("{} added you to {} as {}", actor, team_doc.name, role),
            [user.clone()].into_iter().collect(),
            None,
        )
        .await?;
        storage.commit(&format!("Add {} to team {}", user, team)).await?;
        info!(team = %team, user = %user, role = %role, "member added");
        Ok(membership)
    }

    /// Change a member's role. Owner only; the last owner cannot be demoted.
    pub async fn change_role(
        &self,
        actor: &UserId,
        team: TeamId,
        user: &UserId,
        role: Role,
    ) -> Result<Membership> {
        let mut storage = self.storage.lock().await;
        if role_in(&*storage, team, actor).await? != Some(Role::Owner) {
            return Err(WorkflowError::denied(actor, format!("change roles in team {}", team)));
        }
        let members = storage.list_memberships_for_team(team).await?;
        let mut membership = members
            .iter()
            .find(|m| &m.user_id == user)
            .cloned()
            .ok_or_else(|| WorkflowError::Membership(format!("{} is not a member", user)))?;

        let owners = members.iter().filter(|m| m.role == Role::Owner).count();
        if membership.role == Role::Owner && role != Role::Owner && owners == 1 {
            return Err(WorkflowError::Membership("a team needs at least one owner".into()));
        }

        membership.role = role;
        storage.save_membership(&membership).await?;
        storage.commit(&format!("Make {} {} of team {}", user, role, team)).await?;
        Ok(membership)
    }

    /// Remove `user` from `team`. Owners and admins may remove members;
    /// owners can only leave by themselves and never as the last owner.
    pub async fn remove_member(&self, actor: &UserId, team: TeamId, user: &UserId) -> Result<()> {
        let mut storage = self.storage.lock().await;
        let members = storage.list_memberships_for_team(team).await?;
        let Some(target) = members.iter().find(|m| &m.user_id == user) else {
            return Ok(());
        };
        let actor_role = members.iter().find(|m| &m.user_id == actor).map(|m| m.role);

        let allowed = if target.role == Role::Owner {
            actor == user
        } else {
            actor == user || actor_role.is_some_and(|r| r.can_manage())
        };
        if !allowed {
            return Err(WorkflowError::denied(actor, format!("remove {} from team {}", user, team)));
        }
        let owners = members.iter().filter(|m| m.role == Role::Owner).count();
        if target.role == Role::Owner && owners == 1 {
            return Err(WorkflowError::Membership("a team needs at least one owner".into()));
        }

        storage.delete_membership(target.id).await?;
        storage.commit(&format!("Remove {} from team {}", user, team)).await?;
        info!(team = %team, user = %user, "member removed");
        Ok(())
    }

    /// Delete a team and its memberships. Owner only. Team tasks become
    /// personal tasks of their owners.
    pub async fn delete_team(&self, actor: &UserId, team: TeamId) -> Result<()> {
        let mut storage = self.storage.lock().await;
        if role_in(&*storage, team, actor).await? != Some(Role::Owner) {
            return Err(WorkflowError::denied(actor, format!("delete team {}", team)));
        }

        let filter = taskdeck_core::TaskFilter {
            team: Some(team),
            ..Default::default()
        };
        for mut task in storage.list_tasks(&filter).await? {
            task.team_id = None;
            task.touch();
            storage.save_task(&task).await?;
        }
        for membership in storage.list_memberships_for_team(team).await? {
            storage.delete_membership(membership.id).await?;
        }
        storage.delete_team(team).await?;
        storage.commit(&format!("Delete team {}", team)).await?;
        info!(team = %team, "team deleted");
        Ok(())
    }

    /// Access `user` has to `task`.
    pub async fn access(&self, task: &Task, user: &UserId) -> Result<Access> {
        let storage = self.storage.lock().await;
        access(&*storage, task, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared;
    use taskdeck_storage::MemoryStorage;

    fn user(name: &str) -> UserId {
        UserId::new(name)
    }

    #[tokio::test]
    async fn test_creator_is_owner() {
        let service = TeamService::new(shared(MemoryStorage::new()));
        let team = service.create_team("Platform", &user("alice")).await.unwrap();
        assert_eq!(service.role_of(team.id, &user("alice")).await.unwrap(), Some(Role::Owner));
        let teams = service.teams_of(&user("alice")).await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].1, Role::Owner);
    }

    #[tokio::test]
    async fn test_membership_changes_are_committed() {
        let storage = shared(MemoryStorage::new());
        let service = TeamService::new(storage.clone());
        let team = service.create_team("Platform", &user("alice")).await.unwrap();
        assert_eq!(storage.lock().await.commits(), 1);
        service.add_member(&user("alice"), team.id, &user("bob"), Role::Member).await.unwrap();
        service.change_role(&user("alice"), team.id, &user("bob"), Role::Admin).await.unwrap();
        service.remove_member(&user("alice"), team.id, &user("bob")).await.unwrap();
        assert_eq!(storage.lock().await.commits(), 4);
    }

    #[tokio::test]
    async fn test_member_cannot_add_members() {
        let service = TeamService::new(shared(MemoryStorage::new()));
        let team = service.create_team("Platform", &user("alice")).await.unwrap();
        service.add_member(&user("alice"), team.id, &user("bob"), Role::Member).await.unwrap();

        let err = service
            .add_member(&user("bob"), team.id, &user("carol"), Role::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_admin_cannot_create_owner() {
        let service = TeamService::new(shared(MemoryStorage::new()));
        let team = service.create_team("Platform", &user("alice")).await.unwrap();
        service.add_member(&user("alice"), team.id, &user("bob"), Role::Admin).await.unwrap();

        assert!(service
            .add_member(&user("bob"), team.id, &user("carol"), Role::Member)
            .await
            .is_ok());
        assert!(service
            .add_member(&user("bob"), team.id, &user("dave"), Role::Owner)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_invite_notifies_new_member() {
        let storage = shared(MemoryStorage::new());
        let service = TeamService::new(storage.clone());
        let team = service.create_team("Platform", &user("alice")).await.unwrap();
        service.add_member(&user("alice"), team.id, &user("bob"), Role::Member).await.unwrap();

        let inbox = storage.lock().await.list_notifications(&user("bob")).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::TeamInvite);
    }

    #[tokio::test]
    async fn test_last_owner_is_protected() {
        let service = TeamService::new(shared(MemoryStorage::new()));
        let team = service.create_team("Platform", &user("alice")).await.unwrap();

        assert!(service.change_role(&user("alice"), team.id, &user("alice"), Role::Member).await.is_err());
        assert!(service.remove_member(&user("alice"), team.id, &user("alice")).await.is_err());

        service.add_member(&user("alice"), team.id, &user("bob"), Role::Owner).await.unwrap();
        service.remove_member(&user("alice"), team.id, &user("alice")).await.unwrap();
        assert_eq!(service.members(team.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_task_access_levels() {
        let storage = shared(MemoryStorage::new());
        let service = TeamService::new(storage.clone());
        let team = service.create_team("Platform", &user("alice")).await.unwrap();
        service.add_member(&user("alice"), team.id, &user("bob"), Role::Member).await.unwrap();
        service.add_member(&user("alice"), team.id, &user("carol"), Role::Admin).await.unwrap();

        let mut task = Task::new("Ship it", user("dave")).unwrap();
        task.team_id = Some(team.id);
        task.assigned_to.insert(user("erin"));

        assert_eq!(service.access(&task, &user("dave")).await.unwrap(), Access::Manage);
        assert_eq!(service.access(&task, &user("carol")).await.unwrap(), Access::Manage);
        assert_eq!(service.access(&task, &user("erin")).await.unwrap(), Access::Edit);
        assert_eq!(service.access(&task, &user("bob")).await.unwrap(), Access::View);
        assert_eq!(service.access(&task, &user("zed")).await.unwrap(), Access::None);
    }

    #[tokio::test]
    async fn test_delete_team_detaches_tasks() {
        let storage = shared(MemoryStorage::new());
        let service = TeamService::new(storage.clone());
        let team = service.create_team("Platform", &user("alice")).await.unwrap();
        let mut task = Task::new("Shared", user("alice")).unwrap();
        task.team_id = Some(team.id);
        storage.lock().await.save_task(&task).await.unwrap();

        service.delete_team(&user("alice"), team.id).await.unwrap();
        let task = storage.lock().await.load_task(task.id).await.unwrap().unwrap();
        assert_eq!(task.team_id, None);
        assert!(service.members(team.id).await.unwrap().is_empty());
    }
}
