use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::api_keys::models::ApiKey;

/// Response for a freshly issued key. `key_value` is never shown again.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedApiKeyDto {
    /// The secret to pass as `?key=` or `X-Api-Key`
    #[schema(example = "fvk_3f1c9a...")]
    pub key_value: String,
    /// Non-secret leading characters, for display
    pub prefix: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata of the active key
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyInfoDto {
    pub prefix: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<ApiKey> for ApiKeyInfoDto {
    fn from(key: ApiKey) -> Self {
        Self {
            prefix: key.key_prefix,
            created_at: key.created_at,
            last_used_at: key.last_used_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeApiKeyResponseDto {
    /// Number of keys revoked (0 or 1)
    pub revoked: u64,
}
