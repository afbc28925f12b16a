//! Teams and role-based membership.

use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::id::{MembershipId, TeamId};
use crate::user::UserId;
use crate::Time;

/// A group of users sharing a task set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier
    pub id: TeamId,

    /// Display name
    pub name: String,

    /// Creator and original owner
    pub owner: UserId,

    /// Creation timestamp
    pub created_at: Time,
}

/// Maps a user to a team with a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Unique identifier
    pub id: MembershipId,

    /// Team
    pub team_id: TeamId,

    /// Member
    pub user_id: UserId,

    /// Role within the team
    pub role: Role,

    /// When the user joined
    pub joined_at: Time,
}

impl Membership {
    /// Create a membership starting now.
    pub fn new(team_id: TeamId, user_id: UserId, role: Role) -> Self {
        Self {
            id: MembershipId::new(),
            team_id,
            user_id,
            role,
            joined_at: chrono::Utc::now(),
        }
    }
}

/// Team roles, least privileged first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees team tasks
    Member,
    /// Edits team tasks and manages members
    Admin,
    /// Everything, including deleting the team
    Owner,
}

impl Role {
    /// Owners and admins.
    pub fn can_manage(&self) -> bool {
        *self >= Role::Admin
    }

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            _ => Err(CoreError::UnknownVariant {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}
