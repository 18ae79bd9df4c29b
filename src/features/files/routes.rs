use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, download_file, list_files, update_access_level, upload_file,
};
use crate::features::files::services::FileService;
use crate::shared::constants::MULTIPART_OVERHEAD;

/// Routes that require a session token
pub fn protected_routes(file_service: Arc<FileService>) -> Router {
    let body_limit = file_service.max_file_size() + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/api/files/upload",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/files", get(list_files))
        .route("/api/files/{id}", delete(delete_file))
        .route("/api/files/{id}/access", patch(update_access_level))
        .with_state(file_service)
}

/// Download route; the credential is optional and may be an API key
pub fn retrieval_routes(file_service: Arc<FileService>) -> Router {
    Router::new()
        .route("/api/files/{id}", get(download_file))
        .with_state(file_service)
}
