use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;

use crate::core::middleware;
use crate::features::api_keys::{self, ApiKeyService};
use crate::features::auth::{routes as auth_routes, CredentialResolver};
use crate::features::files::{self, FileService};

/// Services shared by the API routes
#[derive(Clone)]
pub struct AppServices {
    pub resolver: Arc<CredentialResolver>,
    pub files: Arc<FileService>,
    pub api_keys: Arc<ApiKeyService>,
}

/// API routes with their credential layers
pub fn api_router(services: AppServices) -> Router {
    // Protected routes (require a session token)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes())
        .merge(files::protected_routes(Arc::clone(&services.files)))
        .merge(api_keys::routes(services.api_keys))
        .route_layer(from_fn_with_state(
            Arc::clone(&services.resolver),
            middleware::auth_middleware,
        ));

    // Retrieval routes (session, API key or nothing)
    let retrieval_routes = files::retrieval_routes(services.files).route_layer(
        from_fn_with_state(services.resolver, middleware::credential_middleware),
    );

    Router::new()
        .merge(protected_routes)
        .merge(retrieval_routes)
}
