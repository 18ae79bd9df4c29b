use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::access::{AccessLevel, AccessPolicy, Credential};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    DeleteFileResponseDto, FileDownload, FileResponseDto, ListScope,
};
use crate::features::files::models::{FileRecord, NewFileRecord};
use crate::features::files::store::FileRecordStore;
use crate::modules::storage::BlobStore;

/// A file as received from the upload form
pub struct UploadedFile {
    pub data: Vec<u8>,
    /// Filename sent by the client
    pub file_name: String,
    pub content_type: String,
}

/// Service for file operations
///
/// Every operation reads the current record, asks the [`AccessPolicy`], then
/// touches storage.
pub struct FileService {
    files: Arc<dyn FileRecordStore>,
    blobs: Arc<dyn BlobStore>,
    policy: AccessPolicy,
    max_file_size: usize,
}

impl FileService {
    pub fn new(
        files: Arc<dyn FileRecordStore>,
        blobs: Arc<dyn BlobStore>,
        max_file_size: usize,
    ) -> Self {
        Self {
            files,
            blobs,
            policy: AccessPolicy::new(),
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Store the bytes and create the record, owned by the uploader
    pub async fn upload(
        &self,
        credential: &Credential,
        file: UploadedFile,
        custom_name: Option<String>,
        access_level: Option<AccessLevel>,
    ) -> Result<FileResponseDto> {
        if !self.policy.can_upload(credential) {
            return Err(match credential {
                Credential::Anonymous => {
                    AppError::Unauthenticated("Authentication required".to_string())
                }
                _ => AppError::Forbidden("API keys cannot upload files".to_string()),
            });
        }
        let owner_id = credential
            .principal()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))?;

        if file.data.len() > self.max_file_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File too large. Maximum size is {} bytes",
                self.max_file_size
            )));
        }

        let original_name = custom_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| base_name(&file.file_name));

        let id = Uuid::new_v4();
        let blob_ref = self.blobs.object_key(&format!("{}/{}", owner_id, id));
        let file_size = file.data.len() as i64;

        self.blobs
            .put(&blob_ref, file.data, &file.content_type)
            .await?;

        debug!("File bytes stored: {}", blob_ref);

        let created = self
            .files
            .create(NewFileRecord {
                id,
                owner_id,
                original_name,
                content_type: file.content_type,
                file_size,
                blob_ref: blob_ref.clone(),
                access_level: access_level.unwrap_or_default(),
            })
            .await;

        let record = match created {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&blob_ref).await {
                    warn!("Failed to remove orphaned blob '{}': {}", blob_ref, cleanup);
                }
                return Err(e);
            }
        };

        info!(
            "File uploaded: id={}, owner={}, level={}, size={}",
            record.id, record.owner_id, record.access_level, record.file_size
        );

        Ok(record.into())
    }

    /// List the caller's files, or every file for admins
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        scope: ListScope,
    ) -> Result<Vec<FileResponseDto>> {
        let files = match scope {
            ListScope::Own => self.files.list_by_owner(&user.principal_id()).await?,
            ListScope::All if user.is_admin() => self.files.list_all().await?,
            ListScope::All => {
                return Err(AppError::Forbidden(
                    "Listing all files requires the admin role".to_string(),
                ))
            }
        };

        Ok(files.into_iter().map(FileResponseDto::from).collect())
    }

    /// Fetch a file by id, or by name among the caller's own files
    pub async fn retrieve(&self, file_ref: &str, credential: &Credential) -> Result<FileDownload> {
        let record = match Uuid::parse_str(file_ref) {
            Ok(id) => self.files.get(id).await?,
            Err(_) => {
                let owner_id = credential.principal().ok_or_else(|| {
                    AppError::Unauthenticated("Authentication required".to_string())
                })?;
                self.files.find_by_owner_and_name(owner_id, file_ref).await?
            }
        };

        let record = match record {
            Some(record) if self.policy.can_read(&record, credential) => record,
            _ => {
                debug!(
                    "Retrieval denied: ref={}, credential={}",
                    file_ref,
                    credential.kind()
                );
                return Err(self.policy.deny(credential, false));
            }
        };

        let data = self.blobs.get(&record.blob_ref).await?;

        info!(
            "File retrieved: id={}, credential={}",
            record.id,
            credential.kind()
        );

        Ok(FileDownload { record, data })
    }

    /// Change the access level. Setting the current level is a no-op.
    pub async fn update_access_level(
        &self,
        id: Uuid,
        access_level: AccessLevel,
        credential: &Credential,
    ) -> Result<FileResponseDto> {
        let record = self.find_mutable(id, credential).await?;

        if record.access_level == access_level {
            debug!("Access level unchanged: id={}, level={}", id, access_level);
            return Ok(record.into());
        }

        let updated = self
            .files
            .update_access_level(id, access_level)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        info!(
            "Access level changed: id={}, {} -> {}",
            id, record.access_level, updated.access_level
        );

        Ok(updated.into())
    }

    /// Remove the record, then the stored bytes
    pub async fn delete(&self, id: Uuid, credential: &Credential) -> Result<DeleteFileResponseDto> {
        let record = self.find_mutable(id, credential).await?;

        if !self.files.delete(id).await? {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        // The record is gone, so the file is deleted even if the blob lingers
        if let Err(e) = self.blobs.delete(&record.blob_ref).await {
            warn!("Failed to delete blob '{}': {}", record.blob_ref, e);
        }

        info!("File deleted: id={}, owner={}", id, record.owner_id);

        Ok(DeleteFileResponseDto {
            file_id: id,
            deleted: true,
        })
    }

    async fn find_mutable(&self, id: Uuid, credential: &Credential) -> Result<FileRecord> {
        let record = self
            .files
            .get(id)
            .await?
            .ok_or_else(|| self.policy.deny(credential, false))?;

        if !self.policy.can_mutate(&record, credential) {
            let visible = self.policy.can_read(&record, credential);
            return Err(self.policy.deny(credential, visible));
        }

        Ok(record)
    }
}

/// Last path segment of a client-supplied filename
fn base_name(file_name: &str) -> String {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("unnamed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::PrincipalId;
    use crate::shared::test_helpers::{MemoryBlobStore, MemoryFileStore};
    use fake::{faker::filesystem::en::FileName, Fake};

    struct Fixture {
        service: FileService,
        files: Arc<MemoryFileStore>,
        blobs: Arc<MemoryBlobStore>,
    }

    fn fixture() -> Fixture {
        let files = Arc::new(MemoryFileStore::default());
        let blobs = Arc::new(MemoryBlobStore::default());
        Fixture {
            service: FileService::new(files.clone(), blobs.clone(), 1024),
            files,
            blobs,
        }
    }

    fn session(id: &str) -> Credential {
        Credential::Authenticated(PrincipalId::from(id))
    }

    fn key(id: &str) -> Credential {
        Credential::KeyHolder(PrincipalId::from(id))
    }

    fn user(id: &str, roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: id.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn text_file(name: &str, body: &str) -> UploadedFile {
        UploadedFile {
            data: body.as_bytes().to_vec(),
            file_name: name.to_string(),
            content_type: "text/plain".to_string(),
        }
    }

    async fn upload(fx: &Fixture, owner: &str, level: AccessLevel) -> FileResponseDto {
        let name: String = FileName().fake();
        fx.service
            .upload(&session(owner), text_file(&name, "hello"), None, Some(level))
            .await
            .unwrap()
    }

    #[test]
    fn test_base_name_strips_client_paths() {
        assert_eq!(base_name("report.pdf"), "report.pdf");
        assert_eq!(base_name("C:\\Users\\me\\report.pdf"), "report.pdf");
        assert_eq!(base_name("dir/sub/report.pdf"), "report.pdf");
        assert_eq!(base_name(""), "unnamed");
        assert_eq!(base_name("dir/"), "unnamed");
    }

    #[tokio::test]
    async fn test_upload_defaults_to_private_and_owner() {
        let fx = fixture();

        let file = fx
            .service
            .upload(&session("u1"), text_file("notes.txt", "hello"), None, None)
            .await
            .unwrap();

        assert_eq!(file.owner_id, "u1");
        assert_eq!(file.access_level, AccessLevel::Private);
        assert_eq!(file.original_name, "notes.txt");
        assert_eq!(file.file_size, 5);

        let record = fx.files.get(file.file_id).await.unwrap().unwrap();
        assert_eq!(record.blob_ref, format!("files/u1/{}", file.file_id));
        assert_eq!(fx.blobs.get(&record.blob_ref).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_upload_prefers_custom_name() {
        let fx = fixture();

        let file = fx
            .service
            .upload(
                &session("u1"),
                text_file("IMG_0001.txt", "x"),
                Some("  holiday.txt ".to_string()),
                Some(AccessLevel::Public),
            )
            .await
            .unwrap();

        assert_eq!(file.original_name, "holiday.txt");
        assert_eq!(file.access_level, AccessLevel::Public);
    }

    #[tokio::test]
    async fn test_upload_requires_session() {
        let fx = fixture();

        let anonymous = fx
            .service
            .upload(&Credential::Anonymous, text_file("a.txt", "x"), None, None)
            .await;
        assert!(matches!(anonymous, Err(AppError::Unauthenticated(_))));

        let with_key = fx
            .service
            .upload(&key("u1"), text_file("a.txt", "x"), None, None)
            .await;
        assert!(matches!(with_key, Err(AppError::Forbidden(_))));

        assert!(fx.blobs.is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_file() {
        let fx = fixture();
        let big = UploadedFile {
            data: vec![0; 1025],
            file_name: "big.bin".to_string(),
            content_type: "application/octet-stream".to_string(),
        };

        let result = fx.service.upload(&session("u1"), big, None, None).await;

        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
        assert!(fx.blobs.is_empty());
    }

    #[tokio::test]
    async fn test_list_scopes() {
        let fx = fixture();
        upload(&fx, "u1", AccessLevel::Private).await;
        upload(&fx, "u1", AccessLevel::Public).await;
        upload(&fx, "u2", AccessLevel::Public).await;

        let own = fx.service.list(&user("u1", &[]), ListScope::Own).await.unwrap();
        assert_eq!(own.len(), 2);
        assert!(own.iter().all(|f| f.owner_id == "u1"));

        let all = fx
            .service
            .list(&user("root", &["admin"]), ListScope::All)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let denied = fx.service.list(&user("u1", &[]), ListScope::All).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_retrieve_follows_access_policy() {
        let fx = fixture();
        let private = upload(&fx, "u1", AccessLevel::Private).await;
        let read_only = upload(&fx, "u1", AccessLevel::ReadOnly).await;
        let public = upload(&fx, "u1", AccessLevel::Public).await;

        let id = |f: &FileResponseDto| f.file_id.to_string();

        // Owner reads everything with session or key
        for file in [&private, &read_only, &public] {
            assert!(fx.service.retrieve(&id(file), &session("u1")).await.is_ok());
            assert!(fx.service.retrieve(&id(file), &key("u1")).await.is_ok());
        }

        // Other sessions read shared levels only
        assert!(matches!(
            fx.service.retrieve(&id(&private), &session("u2")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(fx.service.retrieve(&id(&read_only), &session("u2")).await.is_ok());
        assert!(fx.service.retrieve(&id(&public), &session("u2")).await.is_ok());

        // Other principals' keys read nothing
        for file in [&private, &read_only, &public] {
            assert!(matches!(
                fx.service.retrieve(&id(file), &key("u2")).await,
                Err(AppError::NotFound(_))
            ));
        }

        // Anonymous callers are asked to authenticate
        assert!(matches!(
            fx.service.retrieve(&id(&public), &Credential::Anonymous).await,
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_retrieve_masks_missing_files() {
        let fx = fixture();
        let missing = Uuid::new_v4().to_string();

        assert!(matches!(
            fx.service.retrieve(&missing, &session("u1")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.retrieve(&missing, &Credential::Anonymous).await,
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_retrieve_after_blob_removed_is_not_found() {
        let fx = fixture();
        let file = upload(&fx, "u1", AccessLevel::Public).await;
        let record = fx.files.get(file.file_id).await.unwrap().unwrap();

        // A concurrent delete drops the blob between lookup and download
        fx.blobs.delete(&record.blob_ref).await.unwrap();

        assert!(matches!(
            fx.service
                .retrieve(&file.file_id.to_string(), &session("u1"))
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_retrieve_by_name_is_scoped_to_caller() {
        let fx = fixture();
        fx.service
            .upload(
                &session("u1"),
                text_file("report.txt", "v1"),
                None,
                Some(AccessLevel::Public),
            )
            .await
            .unwrap();
        fx.service
            .upload(&session("u1"), text_file("report.txt", "v2"), None, None)
            .await
            .unwrap();

        let own = fx.service.retrieve("report.txt", &session("u1")).await.unwrap();
        assert_eq!(own.data, b"v2");
        assert_eq!(own.record.original_name, "report.txt");

        let with_key = fx.service.retrieve("report.txt", &key("u1")).await.unwrap();
        assert_eq!(with_key.data, b"v2");

        // Another principal never resolves u1's names, even for public files
        assert!(matches!(
            fx.service.retrieve("report.txt", &session("u2")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.retrieve("report.txt", &Credential::Anonymous).await,
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_update_access_level() {
        let fx = fixture();
        let file = upload(&fx, "u1", AccessLevel::Private).await;

        let updated = fx
            .service
            .update_access_level(file.file_id, AccessLevel::Public, &session("u1"))
            .await
            .unwrap();
        assert_eq!(updated.access_level, AccessLevel::Public);
        assert_eq!(
            fx.files.get(file.file_id).await.unwrap().unwrap().access_level,
            AccessLevel::Public
        );

        // u2 can read a public file, so the refusal is Forbidden
        assert!(matches!(
            fx.service
                .update_access_level(file.file_id, AccessLevel::Private, &session("u2"))
                .await,
            Err(AppError::Forbidden(_))
        ));

        // Keys never mutate, not even the owner's
        assert!(matches!(
            fx.service
                .update_access_level(file.file_id, AccessLevel::Private, &key("u1"))
                .await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_update_access_level_is_idempotent() {
        let fx = fixture();
        let file = upload(&fx, "u1", AccessLevel::ReadOnly).await;

        let first = fx
            .service
            .update_access_level(file.file_id, AccessLevel::ReadOnly, &session("u1"))
            .await
            .unwrap();
        let second = fx
            .service
            .update_access_level(file.file_id, AccessLevel::ReadOnly, &session("u1"))
            .await
            .unwrap();

        assert_eq!(first.updated_at, file.updated_at);
        assert_eq!(second.updated_at, file.updated_at);
        assert_eq!(fx.files.access_level_writes(), 0);
    }

    #[tokio::test]
    async fn test_mutation_of_hidden_file_is_not_found() {
        let fx = fixture();
        let file = upload(&fx, "u1", AccessLevel::Private).await;

        assert!(matches!(
            fx.service
                .update_access_level(file.file_id, AccessLevel::Public, &session("u2"))
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.delete(file.file_id, &session("u2")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.delete(file.file_id, &Credential::Anonymous).await,
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_blob() {
        let fx = fixture();
        let file = upload(&fx, "u1", AccessLevel::Public).await;
        let blob_ref = fx.files.get(file.file_id).await.unwrap().unwrap().blob_ref;

        assert!(matches!(
            fx.service.delete(file.file_id, &key("u1")).await,
            Err(AppError::Forbidden(_))
        ));

        let deleted = fx.service.delete(file.file_id, &session("u1")).await.unwrap();
        assert_eq!(deleted.file_id, file.file_id);
        assert!(deleted.deleted);

        assert!(fx.files.get(file.file_id).await.unwrap().is_none());
        assert!(!fx.blobs.contains(&blob_ref));

        assert!(matches!(
            fx.service.delete(file.file_id, &session("u1")).await,
            Err(AppError::NotFound(_))
        ));
    }
}
