use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Per-file visibility tier, matching the `access_level` database enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Type, ToSchema,
)]
#[sqlx(type_name = "access_level", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AccessLevel {
    /// Only the owner can read
    #[default]
    Private,
    /// Any authenticated principal can read
    ReadOnly,
    /// Any authenticated principal, or the owner's API key, can read
    Public,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Private => "private",
            AccessLevel::ReadOnly => "read-only",
            AccessLevel::Public => "public",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(AccessLevel::Private),
            "read-only" | "readonly" | "read_only" => Ok(AccessLevel::ReadOnly),
            "public" => Ok(AccessLevel::Public),
            other => Err(format!(
                "Invalid access level '{}'. Expected one of: private, read-only, public",
                other
            )),
        }
    }
}

/// Identifier of a principal (the OIDC `sub` of a registered user)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identity proof resolved for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Valid session token
    Authenticated(PrincipalId),
    /// Valid API key, resolved to the principal that issued it
    KeyHolder(PrincipalId),
    /// No credential, or only invalid ones
    Anonymous,
}

impl Credential {
    /// The principal behind the credential, if any
    pub fn principal(&self) -> Option<&PrincipalId> {
        match self {
            Credential::Authenticated(id) | Credential::KeyHolder(id) => Some(id),
            Credential::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Credential::Anonymous)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Credential::Authenticated(_))
    }

    /// Short label for logs (never includes secrets)
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::Authenticated(_) => "session",
            Credential::KeyHolder(_) => "api_key",
            Credential::Anonymous => "anonymous",
        }
    }
}

/// Anything the access policy can be evaluated against
pub trait AccessControlled {
    fn owner_id(&self) -> &PrincipalId;
    fn access_level(&self) -> AccessLevel;
}
