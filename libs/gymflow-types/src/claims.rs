use serde::{Deserialize, Serialize};

use crate::Role;

/// JWT claims carried by gymflow access tokens.
///
/// Tokens are issued by the identity service and only verified here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID (UUID as string)
    pub sub: String,

    /// Roles granted to the user. Unknown role names fail deserialization.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Token expiration (Unix timestamp)
    pub exp: i64,

    /// Token issued at (Unix timestamp)
    pub iat: i64,
}

impl AccessClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// True if any held role satisfies `check`.
    pub fn any_role(&self, check: impl Fn(&Role) -> bool) -> bool {
        self.roles.iter().any(check)
    }
}
