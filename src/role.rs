//! Authorization levels shared by the HTTP layer and the plugin registry.
//!
//! Roles form a total order `viewer < user < admin`; every access check in
//! the dashboard compares against that order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered authorization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Viewer = 0,
    User = 1,
    Admin = 2,
}

impl Role {
    /// All roles in ascending order.
    pub const ALL: [Role; 3] = [Role::Viewer, Role::User, Role::Admin];

    /// Numeric rank used in access comparisons.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Returns true if this role satisfies the given floor.
    pub fn allows(self, floor: Role) -> bool {
        self >= floor
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not one of `viewer`, `user`, `admin`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}', expected viewer, user or admin")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
