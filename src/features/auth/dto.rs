use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::AuthenticatedUser;

/// DTO for /api/auth/me response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponseDto {
    pub principal_id: String,
    pub roles: Vec<String>,
    pub is_admin: bool,
}

impl From<AuthenticatedUser> for MeResponseDto {
    fn from(user: AuthenticatedUser) -> Self {
        let is_admin = user.is_admin();
        Self {
            principal_id: user.sub,
            roles: user.roles,
            is_admin,
        }
    }
}
