use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::access::{AccessLevel, PrincipalId};
use crate::features::files::models::{FileRecord, NewFileRecord};

/// Persistence for file metadata
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    async fn create(&self, record: NewFileRecord) -> Result<FileRecord>;

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>>;

    /// Set the access level, returning the updated row or `None` if it is gone
    async fn update_access_level(&self, id: Uuid, level: AccessLevel)
        -> Result<Option<FileRecord>>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Newest first
    async fn list_by_owner(&self, owner_id: &PrincipalId) -> Result<Vec<FileRecord>>;

    /// Every file of every principal, newest first
    async fn list_all(&self) -> Result<Vec<FileRecord>>;

    /// Most recent of the owner's files with exactly this name
    async fn find_by_owner_and_name(
        &self,
        owner_id: &PrincipalId,
        name: &str,
    ) -> Result<Option<FileRecord>>;
}

pub struct PgFileStore {
    pool: PgPool,
}

impl PgFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRecordStore for PgFileStore {
    async fn create(&self, record: NewFileRecord) -> Result<FileRecord> {
        let file = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (id, owner_id, original_name, content_type, file_size, blob_ref, access_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(&record.owner_id)
        .bind(&record.original_name)
        .bind(&record.content_type)
        .bind(record.file_size)
        .bind(&record.blob_ref)
        .bind(record.access_level)
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(file)
    }

    async fn update_access_level(
        &self,
        id: Uuid,
        level: AccessLevel,
    ) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(
            r#"
            UPDATE files
            SET access_level = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(level)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner_id: &PrincipalId) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT * FROM files
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    async fn list_all(&self) -> Result<Vec<FileRecord>> {
        let files =
            sqlx::query_as::<_, FileRecord>("SELECT * FROM files ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(files)
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: &PrincipalId,
        name: &str,
    ) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT * FROM files
            WHERE owner_id = $1 AND original_name = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }
}
