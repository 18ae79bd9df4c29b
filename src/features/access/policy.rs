use crate::core::error::AppError;
use crate::features::access::model::{AccessControlled, AccessLevel, Credential};

/// Evaluates the file access decision table.
///
/// Ownership always wins: `Authenticated(owner)` may read and mutate a file at
/// any level. API keys are read-only credentials and never authorize mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Whether `credential` may fetch the file's bytes
    pub fn can_read<F>(&self, file: &F, credential: &Credential) -> bool
    where
        F: AccessControlled + ?Sized,
    {
        let owner = file.owner_id();

        match credential {
            Credential::Authenticated(id) if id == owner => true,
            Credential::KeyHolder(id) if id == owner => true,
            Credential::Authenticated(_) => matches!(
                file.access_level(),
                AccessLevel::ReadOnly | AccessLevel::Public
            ),
            Credential::KeyHolder(_) | Credential::Anonymous => false,
        }
    }

    /// Whether `credential` may change the access level or delete the file
    pub fn can_mutate<F>(&self, file: &F, credential: &Credential) -> bool
    where
        F: AccessControlled + ?Sized,
    {
        matches!(credential, Credential::Authenticated(id) if id == file.owner_id())
    }

    /// Whether `credential` may create a new file (owned by its principal)
    pub fn can_upload(&self, credential: &Credential) -> bool {
        credential.is_authenticated()
    }

    /// Map a negative decision to the error surfaced at the boundary.
    ///
    /// Anonymous callers always get `Unauthenticated`. Callers that cannot read
    /// the file get `NotFound`, identical to a missing file. `Forbidden` is only
    /// returned when the caller can already see the file.
    pub fn deny(&self, credential: &Credential, visible: bool) -> AppError {
        if credential.is_anonymous() {
            AppError::Unauthenticated("Authentication required".to_string())
        } else if visible {
            AppError::Forbidden("Only the owner can modify this file".to_string())
        } else {
            AppError::NotFound("File not found".to_string())
        }
    }
}
