use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::jwks::{JwksClient, JwksError};
use super::model::{AuthenticatedUser, CustomClaims};
use super::resolver::SessionVerifier;
use crate::core::error::AppError;

/// Validates RS256 access tokens issued by the OIDC provider
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
    claims_namespace: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    // Some providers omit the token kind; when present it must be an access token
    #[serde(default)]
    kind: Option<String>,
    // iss, aud, exp and nbf are checked by `Validation`; the custom
    // namespace is only known at runtime
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        leeway: Duration,
        claims_namespace: String,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            leeway: leeway.as_secs(),
            claims_namespace,
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header =
            decode_header(token).map_err(|e| AppError::InvalidCredential(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::InvalidCredential(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::InvalidCredential("Missing kid in token header".to_string()))?;

        let decoding_key = self.jwks_client.get_key(&kid).await.map_err(|e| match e {
            JwksError::KeyNotFound(_) => AppError::InvalidCredential(e.to_string()),
            JwksError::FetchError(_) | JwksError::ParseError(_) => {
                AppError::ExternalServiceError(format!("Signing keys unavailable: {}", e))
            }
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::InvalidCredential(e.to_string()))?
            .claims;

        if let Some(kind) = &claims.kind {
            if kind != "AccessToken" {
                return Err(AppError::InvalidCredential(
                    "Token is not an access token".to_string(),
                ));
            }
        }

        let roles = self.custom_claims(&claims)?.roles;

        Ok(AuthenticatedUser {
            sub: claims.sub,
            roles,
        })
    }

    fn custom_claims(&self, claims: &Claims) -> Result<CustomClaims, AppError> {
        match claims.extra.get(&self.claims_namespace) {
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                AppError::InvalidCredential(format!("Malformed custom claims: {}", e))
            }),
            None => Ok(CustomClaims::default()),
        }
    }
}

#[async_trait]
impl SessionVerifier for JwtValidator {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        self.validate_token(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn validator() -> JwtValidator {
        // Unroutable issuer: any attempt to fetch keys would fail the test
        JwtValidator::new(
            Arc::new(JwksClient::new("http://127.0.0.1:9", Duration::from_secs(60))),
            "http://127.0.0.1:9".to_string(),
            "filevault".to_string(),
            Duration::from_secs(0),
            "https://filevault.app/claims".to_string(),
        )
    }

    #[tokio::test]
    async fn test_rejects_garbage_token() {
        let result = validator().validate_token("not-a-jwt").await;
        assert!(matches!(result, Err(AppError::InvalidCredential(_))));
    }

    #[tokio::test]
    async fn test_rejects_symmetric_algorithm_before_key_lookup() {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("k1".to_string());
        let token = encode(
            &header,
            &json!({ "sub": "u1", "exp": 4_102_444_800u64 }),
            &EncodingKey::from_secret(b"attacker-chosen"),
        )
        .unwrap();

        let result = validator().validate_token(&token).await;
        assert!(matches!(result, Err(AppError::InvalidCredential(_))));
    }

    #[test]
    fn test_custom_claims_are_read_from_namespace() {
        let claims: Claims = serde_json::from_value(json!({
            "sub": "u1",
            "https://filevault.app/claims": { "roles": ["admin"] }
        }))
        .unwrap();

        let custom = validator().custom_claims(&claims).unwrap();
        assert_eq!(custom.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_missing_custom_claims_means_no_roles() {
        let claims: Claims = serde_json::from_value(json!({ "sub": "u1" })).unwrap();
        assert!(validator().custom_claims(&claims).unwrap().roles.is_empty());
    }

    #[test]
    fn test_token_kind_is_optional() {
        let without: Claims = serde_json::from_value(json!({ "sub": "u1" })).unwrap();
        assert!(without.kind.is_none());

        let with: Claims =
            serde_json::from_value(json!({ "sub": "u1", "kind": "AccessToken" })).unwrap();
        assert_eq!(with.kind.as_deref(), Some("AccessToken"));
    }
}
