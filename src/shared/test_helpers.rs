//! In-memory stand-ins for the persistence and identity seams.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::{AccessLevel, PrincipalId};
use crate::features::api_keys::models::{ApiKey, NewApiKey};
use crate::features::api_keys::store::ApiKeyStore;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::resolver::SessionVerifier;
use crate::features::auth::ApiKeyResolver;
use crate::features::files::models::{FileRecord, NewFileRecord};
use crate::features::files::store::FileRecordStore;
use crate::modules::storage::BlobStore;

pub const TEST_API_KEY_SECRET: &str = "test-api-key-secret-0123456789abcdef";

/// Session verifier accepting a fixed set of tokens
#[derive(Default)]
pub struct StaticSessions {
    tokens: HashMap<String, AuthenticatedUser>,
}

impl StaticSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, token: &str, sub: &str) -> Self {
        self.with_user(
            token,
            AuthenticatedUser {
                sub: sub.to_string(),
                roles: Vec::new(),
            },
        )
    }

    pub fn with_user(mut self, token: &str, user: AuthenticatedUser) -> Self {
        self.tokens.insert(token.to_string(), user);
        self
    }
}

#[async_trait]
impl SessionVerifier for StaticSessions {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::InvalidCredential("Unknown test token".to_string()))
    }
}

/// Key resolver accepting a fixed set of keys
#[derive(Default)]
pub struct StaticKeys {
    keys: HashMap<String, PrincipalId>,
}

impl StaticKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: &str, principal: &str) -> Self {
        self.keys.insert(key.to_string(), PrincipalId::from(principal));
        self
    }
}

#[async_trait]
impl ApiKeyResolver for StaticKeys {
    async fn resolve_key(&self, key: &str) -> Result<Option<PrincipalId>> {
        Ok(self.keys.get(key).cloned())
    }
}

#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<Vec<FileRecord>>,
    access_level_writes: AtomicUsize,
}

impl MemoryFileStore {
    /// Number of `update_access_level` calls that reached the store
    pub fn access_level_writes(&self) -> usize {
        self.access_level_writes.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Vec<FileRecord> {
        self.files.lock().unwrap().clone()
    }
}

/// Newest first, ties broken by insertion order
fn newest_first(mut files: Vec<FileRecord>) -> Vec<FileRecord> {
    files.reverse();
    files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    files
}

#[async_trait]
impl FileRecordStore for MemoryFileStore {
    async fn create(&self, record: NewFileRecord) -> Result<FileRecord> {
        let now = Utc::now();
        let file = FileRecord {
            id: record.id,
            owner_id: record.owner_id,
            original_name: record.original_name,
            content_type: record.content_type,
            file_size: record.file_size,
            blob_ref: record.blob_ref,
            access_level: record.access_level,
            created_at: now,
            updated_at: now,
        };
        self.files.lock().unwrap().push(file.clone());
        Ok(file)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>> {
        Ok(self.snapshot().into_iter().find(|f| f.id == id))
    }

    async fn update_access_level(
        &self,
        id: Uuid,
        level: AccessLevel,
    ) -> Result<Option<FileRecord>> {
        self.access_level_writes.fetch_add(1, Ordering::SeqCst);
        let mut files = self.files.lock().unwrap();
        Ok(files.iter_mut().find(|f| f.id == id).map(|f| {
            f.access_level = level;
            f.updated_at = Utc::now();
            f.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|f| f.id != id);
        Ok(files.len() < before)
    }

    async fn list_by_owner(&self, owner_id: &PrincipalId) -> Result<Vec<FileRecord>> {
        Ok(newest_first(
            self.snapshot()
                .into_iter()
                .filter(|f| &f.owner_id == owner_id)
                .collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<FileRecord>> {
        Ok(newest_first(self.snapshot()))
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: &PrincipalId,
        name: &str,
    ) -> Result<Option<FileRecord>> {
        Ok(self
            .list_by_owner(owner_id)
            .await?
            .into_iter()
            .find(|f| f.original_name == name))
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn object_key(&self, path: &str) -> String {
        format!("files/{}", path)
    }

    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

struct StoredKey {
    key: ApiKey,
    key_hash: String,
    revoked: bool,
}

#[derive(Default)]
pub struct MemoryApiKeyStore {
    keys: Mutex<Vec<StoredKey>>,
}

impl MemoryApiKeyStore {
    /// Every digest ever persisted, revoked ones included
    pub fn hashes(&self) -> Vec<String> {
        self.keys
            .lock()
            .unwrap()
            .iter()
            .map(|k| k.key_hash.clone())
            .collect()
    }

    fn find(&self, matches: impl Fn(&StoredKey) -> bool) -> Option<ApiKey> {
        self.keys
            .lock()
            .unwrap()
            .iter()
            .find(|k| !k.revoked && matches(k))
            .map(|k| k.key.clone())
    }

    fn revoke_matching(&self, principal_id: &PrincipalId) -> u64 {
        let mut revoked = 0;
        for stored in self
            .keys
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|k| &k.key.principal_id == principal_id && !k.revoked)
        {
            stored.revoked = true;
            revoked += 1;
        }
        revoked
    }
}

#[async_trait]
impl ApiKeyStore for MemoryApiKeyStore {
    async fn replace_active(&self, key: NewApiKey) -> Result<ApiKey> {
        self.revoke_matching(&key.principal_id);

        let api_key = ApiKey {
            id: key.id,
            principal_id: key.principal_id,
            key_prefix: key.key_prefix,
            created_at: Utc::now(),
            last_used_at: None,
        };
        self.keys.lock().unwrap().push(StoredKey {
            key: api_key.clone(),
            key_hash: key.key_hash,
            revoked: false,
        });
        Ok(api_key)
    }

    async fn find_active(&self, principal_id: &PrincipalId) -> Result<Option<ApiKey>> {
        Ok(self.find(|k| &k.key.principal_id == principal_id))
    }

    async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        Ok(self.find(|k| k.key_hash == key_hash))
    }

    async fn touch(&self, id: Uuid) -> Result<()> {
        if let Some(stored) = self
            .keys
            .lock()
            .unwrap()
            .iter_mut()
            .find(|k| k.key.id == id)
        {
            stored.key.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn revoke_all(&self, principal_id: &PrincipalId) -> Result<u64> {
        Ok(self.revoke_matching(principal_id))
    }
}
