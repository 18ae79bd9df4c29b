//! Per-request credential resolution.
//!
//! A request may carry a bearer session token, an API key, both or neither.
//! Invalid proofs do not fail the request here: they downgrade to
//! [`Credential::Anonymous`] so that the access policy gets the final say.
//! Infrastructure failures (key store down, JWKS unreachable) still propagate.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::access::{Credential, PrincipalId};
use crate::features::auth::model::AuthenticatedUser;

/// Header accepted as an alternative to the `key` query parameter
pub const API_KEY_HEADER: &str = "x-api-key";

/// Verifies session tokens
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// `Err(AppError::InvalidCredential)` for tokens that are malformed,
    /// expired or not signed by the provider
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser>;
}

/// Maps a presented API key to the principal that issued it
#[async_trait]
pub trait ApiKeyResolver: Send + Sync {
    /// `Ok(None)` for unknown, revoked or malformed keys
    async fn resolve_key(&self, key: &str) -> Result<Option<PrincipalId>>;
}

/// Outcome of resolving one request's auth material
#[derive(Debug, Clone)]
pub struct Resolution {
    pub credential: Credential,
    /// Set only when a session token was verified
    pub user: Option<AuthenticatedUser>,
}

impl Resolution {
    pub fn anonymous() -> Self {
        Self {
            credential: Credential::Anonymous,
            user: None,
        }
    }

    fn session(user: AuthenticatedUser) -> Self {
        Self {
            credential: Credential::Authenticated(user.principal_id()),
            user: Some(user),
        }
    }
}

pub struct CredentialResolver {
    sessions: Arc<dyn SessionVerifier>,
    keys: Arc<dyn ApiKeyResolver>,
}

impl CredentialResolver {
    pub fn new(sessions: Arc<dyn SessionVerifier>, keys: Arc<dyn ApiKeyResolver>) -> Self {
        Self { sessions, keys }
    }

    /// Resolve optional auth material. A valid session wins over a valid key.
    pub async fn resolve(
        &self,
        authorization: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Resolution> {
        if let Some(value) = authorization {
            match bearer_token(value) {
                Some(token) => match self.sessions.verify(token).await {
                    Ok(user) => return Ok(Resolution::session(user)),
                    Err(AppError::InvalidCredential(reason)) => {
                        debug!("Session token rejected, downgrading: {}", reason);
                    }
                    Err(e) => return Err(e),
                },
                None => debug!("Ignoring non-bearer authorization header"),
            }
        }

        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            match self.keys.resolve_key(key).await? {
                Some(principal) => {
                    return Ok(Resolution {
                        credential: Credential::KeyHolder(principal),
                        user: None,
                    })
                }
                None => debug!("API key rejected, downgrading"),
            }
        }

        Ok(Resolution::anonymous())
    }

    /// Strict variant for routes that require a session
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthenticatedUser> {
        let value = authorization
            .ok_or_else(|| AppError::Unauthenticated("Missing authorization header".to_string()))?;

        let token = bearer_token(value).ok_or_else(|| {
            AppError::InvalidCredential("Invalid authorization header format".to_string())
        })?;

        self.sessions.verify(token).await
    }
}

/// Extract the token from a `Bearer <token>` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}

pub fn api_key_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok())
}
