//! Unique identifiers for Taskdeck documents.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new id
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

ulid_id!(
    /// Unique identifier for a Task
    TaskId
);
ulid_id!(
    /// Unique identifier for a TimeEntry
    TimeEntryId
);
ulid_id!(
    /// Unique identifier for a Notification
    NotificationId
);
ulid_id!(
    /// Unique identifier for a Comment
    CommentId
);
ulid_id!(
    /// Unique identifier for a Team
    TeamId
);
ulid_id!(
    /// Unique identifier for a Membership record
    MembershipId
);
