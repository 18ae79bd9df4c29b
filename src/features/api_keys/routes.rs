use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::api_keys::handlers;
use crate::features::api_keys::services::ApiKeyService;

/// Create routes for API key management
///
/// Note: every route requires a session token
pub fn routes(service: Arc<ApiKeyService>) -> Router {
    Router::new()
        .route(
            "/api/api-keys",
            get(handlers::get_api_key)
                .post(handlers::issue_api_key)
                .delete(handlers::revoke_api_key),
        )
        .with_state(service)
}
