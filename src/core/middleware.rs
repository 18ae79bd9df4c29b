use crate::core::error::AppError;
use crate::features::access::Credential;
use crate::features::auth::resolver::{api_key_header, authorization_header};
use crate::features::auth::CredentialResolver;
use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        // Path only: the query string may carry an API key
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION]);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let authorized = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Basic "))
                .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
                .and_then(|decoded| String::from_utf8(decoded).ok())
                .is_some_and(|creds| creds == *credentials);

            if authorized {
                return Ok(next.run(req).await);
            }

            Err((
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
                "Unauthorized",
            )
                .into_response())
        })
    }
}

/// Require a valid session token.
///
/// Inserts both the [`AuthenticatedUser`](crate::features::auth::model::AuthenticatedUser)
/// and its [`Credential`] into request extensions.
pub async fn auth_middleware(
    State(resolver): State<Arc<CredentialResolver>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = authorization_header(req.headers()).map(str::to_string);

    let user = resolver.authenticate(authorization.as_deref()).await?;

    req.extensions_mut()
        .insert(Credential::Authenticated(user.principal_id()));
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// First non-blank `key` query parameter. Parsed as pairs so a repeated
/// parameter does not fail the whole query.
fn query_api_key(uri: &Uri) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .filter(|(name, _)| name == "key")
        .map(|(_, value)| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Resolve whatever credential the request carries, never rejecting it.
///
/// The API key is read from the `key` query parameter, falling back to the
/// `X-Api-Key` header when the parameter is missing or blank.
pub async fn credential_middleware(
    State(resolver): State<Arc<CredentialResolver>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = authorization_header(req.headers()).map(str::to_string);
    let api_key = query_api_key(req.uri()).or_else(|| {
        api_key_header(req.headers())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    });

    let resolution = resolver
        .resolve(authorization.as_deref(), api_key.as_deref())
        .await?;

    tracing::debug!(credential = resolution.credential.kind(), "Credential resolved");

    if let Some(user) = resolution.user {
        req.extensions_mut().insert(user);
    }
    req.extensions_mut().insert(resolution.credential);
    Ok(next.run(req).await)
}
