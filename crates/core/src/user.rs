//! User identity and the signed-in session.

use crate::Time;
use serde::{Deserialize, Serialize};

/// Identifier for a user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The signed-in user. Created on login, dropped on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Acting user
    pub user_id: UserId,

    /// Name shown in listings
    pub display_name: String,

    /// When the session began
    pub started_at: Time,
}

impl Session {
    /// Start a session for `user_id`.
    pub fn start(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            started_at: chrono::Utc::now(),
        }
    }
}
