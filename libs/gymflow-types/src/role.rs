use serde::{Deserialize, Serialize};

use crate::errors::RoleParseError;

/// Every role a gym account can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Coach,
    Receptionist,
    Client,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Coach, Role::Receptionist, Role::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Coach => "coach",
            Self::Receptionist => "receptionist",
            Self::Client => "client",
        }
    }

    /// Staff can look up any member's subscription.
    pub fn is_staff(&self) -> bool {
        match self {
            Self::Admin | Self::Coach | Self::Receptionist => true,
            Self::Client => false,
        }
    }

    /// Create subscriptions, sell memberships and cancel items.
    pub fn can_manage_subscriptions(&self) -> bool {
        match self {
            Self::Admin | Self::Receptionist => true,
            Self::Coach | Self::Client => false,
        }
    }

    /// Edit the membership catalogue and deactivate subscriptions.
    pub fn can_administer(&self) -> bool {
        match self {
            Self::Admin => true,
            Self::Coach | Self::Receptionist | Self::Client => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "coach" => Ok(Self::Coach),
            "receptionist" => Ok(Self::Receptionist),
            "client" => Ok(Self::Client),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}
