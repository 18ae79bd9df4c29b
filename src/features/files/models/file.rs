use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::access::{AccessControlled, AccessLevel, PrincipalId};

/// Database model for files
#[derive(Debug, Clone, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub owner_id: PrincipalId,
    pub original_name: String,
    pub content_type: String,
    pub file_size: i64,
    /// Object key of the bytes in the blob store
    pub blob_ref: String,
    pub access_level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessControlled for FileRecord {
    fn owner_id(&self) -> &PrincipalId {
        &self.owner_id
    }

    fn access_level(&self) -> AccessLevel {
        self.access_level
    }
}

/// Values for inserting a new file row
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub id: Uuid,
    pub owner_id: PrincipalId,
    pub original_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub blob_ref: String,
    pub access_level: AccessLevel,
}
