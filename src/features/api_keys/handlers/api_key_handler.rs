use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::api_keys::dtos::{ApiKeyInfoDto, IssuedApiKeyDto, RevokeApiKeyResponseDto};
use crate::features::api_keys::services::ApiKeyService;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::ApiResponse;

/// Issue a new API key
///
/// Revokes the caller's previous key. The plaintext key is only returned here.
#[utoipa::path(
    post,
    path = "/api/api-keys",
    responses(
        (status = 201, description = "API key issued", body = ApiResponse<IssuedApiKeyDto>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "api-keys"
)]
pub async fn issue_api_key(
    user: AuthenticatedUser,
    State(service): State<Arc<ApiKeyService>>,
) -> Result<(StatusCode, Json<ApiResponse<IssuedApiKeyDto>>)> {
    let issued = service.issue(&user.principal_id()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(issued),
            Some("Store this key now; it cannot be shown again".to_string()),
            None,
        )),
    ))
}

/// Get metadata of the active API key
#[utoipa::path(
    get,
    path = "/api/api-keys",
    responses(
        (status = 200, description = "Active API key", body = ApiResponse<ApiKeyInfoDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "No active API key")
    ),
    security(("bearer_auth" = [])),
    tag = "api-keys"
)]
pub async fn get_api_key(
    user: AuthenticatedUser,
    State(service): State<Arc<ApiKeyService>>,
) -> Result<Json<ApiResponse<ApiKeyInfoDto>>> {
    let info = service.current(&user.principal_id()).await?;
    Ok(Json(ApiResponse::success(Some(info), None, None)))
}

/// Revoke the active API key
#[utoipa::path(
    delete,
    path = "/api/api-keys",
    responses(
        (status = 200, description = "API key revoked", body = ApiResponse<RevokeApiKeyResponseDto>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "api-keys"
)]
pub async fn revoke_api_key(
    user: AuthenticatedUser,
    State(service): State<Arc<ApiKeyService>>,
) -> Result<Json<ApiResponse<RevokeApiKeyResponseDto>>> {
    let response = service.revoke(&user.principal_id()).await?;
    Ok(Json(ApiResponse::success(Some(response), None, None)))
}
