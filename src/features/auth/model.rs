use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::access::PrincipalId;
use crate::shared::constants::ROLE_ADMIN;

/// Principal proven by a valid session token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Subject claim of the access token, used as the principal id
    pub sub: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn principal_id(&self) -> PrincipalId {
        PrincipalId::new(self.sub.clone())
    }

    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Admins may list every principal's files
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

/// Claims found under the configured custom namespace
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomClaims {
    #[serde(default)]
    pub roles: Vec<String>,
}
