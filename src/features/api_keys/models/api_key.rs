use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::access::PrincipalId;

/// Database model for API keys
///
/// The `key_hash` and `revoked_at` columns are only used in `WHERE` clauses
/// and stay out of the loaded row.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub principal_id: PrincipalId,
    pub key_prefix: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Data for inserting a new active key
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub id: Uuid,
    pub principal_id: PrincipalId,
    pub key_hash: String,
    pub key_prefix: String,
}
