use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::PrincipalId;
use crate::features::api_keys::dtos::{ApiKeyInfoDto, IssuedApiKeyDto, RevokeApiKeyResponseDto};
use crate::features::api_keys::models::NewApiKey;
use crate::features::api_keys::store::ApiKeyStore;
use crate::features::auth::ApiKeyResolver;
use crate::shared::constants::{API_KEY_DISPLAY_LEN, API_KEY_PREFIX, API_KEY_SECRET_LEN};

type HmacSha256 = Hmac<Sha256>;

/// Service for API key issuance and lookup
pub struct ApiKeyService {
    store: Arc<dyn ApiKeyStore>,
    secret: Vec<u8>,
}

impl ApiKeyService {
    pub fn new(store: Arc<dyn ApiKeyStore>, secret: &str) -> Self {
        Self {
            store,
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Issue a new key for the principal, revoking any active one
    pub async fn issue(&self, principal_id: &PrincipalId) -> Result<IssuedApiKeyDto> {
        let key_value = generate_key();
        let key_hash = self.digest(&key_value)?;
        let key_prefix = key_value[..API_KEY_DISPLAY_LEN].to_string();

        let api_key = self
            .store
            .replace_active(NewApiKey {
                id: Uuid::now_v7(),
                principal_id: principal_id.clone(),
                key_hash,
                key_prefix,
            })
            .await?;

        info!(
            "API key issued: principal={}, prefix={}",
            principal_id, api_key.key_prefix
        );

        Ok(IssuedApiKeyDto {
            key_value,
            prefix: api_key.key_prefix,
            created_at: api_key.created_at,
        })
    }

    /// Metadata of the principal's active key
    pub async fn current(&self, principal_id: &PrincipalId) -> Result<ApiKeyInfoDto> {
        self.store
            .find_active(principal_id)
            .await?
            .map(ApiKeyInfoDto::from)
            .ok_or_else(|| AppError::NotFound("No active API key".to_string()))
    }

    pub async fn revoke(&self, principal_id: &PrincipalId) -> Result<RevokeApiKeyResponseDto> {
        let revoked = self.store.revoke_all(principal_id).await?;

        info!("API keys revoked: principal={}, count={}", principal_id, revoked);

        Ok(RevokeApiKeyResponseDto { revoked })
    }

    /// Keyed digest stored in place of the plaintext key
    fn digest(&self, key: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
        mac.update(key.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl ApiKeyResolver for ApiKeyService {
    async fn resolve_key(&self, key: &str) -> Result<Option<PrincipalId>> {
        if !is_well_formed(key) {
            return Ok(None);
        }

        let Some(api_key) = self.store.find_active_by_hash(&self.digest(key)?).await? else {
            return Ok(None);
        };

        // Usage tracking must not fail the download
        if let Err(e) = self.store.touch(api_key.id).await {
            warn!("Failed to record API key usage: {}", e);
        }

        Ok(Some(api_key.principal_id))
    }
}

/// `fvk_` followed by 64 lowercase hex characters
fn generate_key() -> String {
    format!(
        "{}{}{}",
        API_KEY_PREFIX,
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

fn is_well_formed(key: &str) -> bool {
    key.strip_prefix(API_KEY_PREFIX).is_some_and(|secret| {
        secret.len() == API_KEY_SECRET_LEN
            && secret
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    })
}
