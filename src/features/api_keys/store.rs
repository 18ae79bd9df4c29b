use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::access::PrincipalId;
use crate::features::api_keys::models::{ApiKey, NewApiKey};

/// Persistence for API keys
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Revoke every active key of the principal and insert `key` as its only
    /// active key, atomically
    async fn replace_active(&self, key: NewApiKey) -> Result<ApiKey>;

    async fn find_active(&self, principal_id: &PrincipalId) -> Result<Option<ApiKey>>;

    async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>>;

    /// Record that the key was just used
    async fn touch(&self, id: Uuid) -> Result<()>;

    /// Revoke all active keys of the principal, returning how many were revoked
    async fn revoke_all(&self, principal_id: &PrincipalId) -> Result<u64>;
}

pub struct PgApiKeyStore {
    pool: PgPool,
}

impl PgApiKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyStore for PgApiKeyStore {
    async fn replace_active(&self, key: NewApiKey) -> Result<ApiKey> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent issuance for the same principal
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&key.principal_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE api_keys
            SET revoked_at = NOW()
            WHERE principal_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(&key.principal_id)
        .execute(&mut *tx)
        .await?;

        let api_key = sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (id, principal_id, key_hash, key_prefix)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(key.id)
        .bind(&key.principal_id)
        .bind(&key.key_hash)
        .bind(&key.key_prefix)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(api_key)
    }

    async fn find_active(&self, principal_id: &PrincipalId) -> Result<Option<ApiKey>> {
        let api_key = sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT * FROM api_keys
            WHERE principal_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(principal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(api_key)
    }

    async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        let api_key = sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT * FROM api_keys
            WHERE key_hash = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(api_key)
    }

    async fn touch(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_all(&self, principal_id: &PrincipalId) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE api_keys
            SET revoked_at = NOW()
            WHERE principal_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(principal_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
