use crate::features::auth::handler;
use axum::{routing::get, Router};

/// Protected auth routes (require a session token)
pub fn protected_routes() -> Router {
    Router::new().route("/api/auth/me", get(handler::get_me))
}
