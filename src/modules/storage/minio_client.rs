//! MinIO/S3-compatible blob store
//!
//! Objects are private to the service: clients never receive bucket URLs,
//! every download is streamed back through the access policy.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::BlobStore;
use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    key_prefix: String,
}

impl MinIOClient {
    /// Create a client and make sure its bucket exists
    pub async fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            key_prefix: config.key_prefix.trim_matches('/').to_string(),
        };

        client.ensure_bucket_exists().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, key_prefix: {}",
            client.endpoint,
            client.bucket.name(),
            client.key_prefix
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        match self.create_bucket().await {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    async fn create_bucket(&self) -> Result<(), AppError> {
        Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

#[async_trait]
impl BlobStore for MinIOClient {
    fn object_key(&self, path: &str) -> String {
        prefixed_key(&self.key_prefix, path)
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to upload file '{}': {}", key, e))
            })?;

        ensure_success(response.status_code(), "upload", key)?;

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let response = self.bucket.get_object(key).await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to download file '{}': {}", key, e))
        })?;

        ensure_found(response.status_code(), key)?;

        debug!("Downloaded '{}' from bucket '{}'", key, self.bucket.name());
        Ok(response.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("Failed to delete file '{}': {}", key, e))
            })?;

        // Deleting an absent object is not an error
        if response.status_code() != 404 {
            ensure_success(response.status_code(), "delete", key)?;
        }

        debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }
}

fn prefixed_key(prefix: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", prefix, path)
    }
}

/// A missing object surfaces like a missing file record
fn ensure_found(status: u16, key: &str) -> Result<(), AppError> {
    if status == 404 {
        debug!("Object '{}' not found in storage", key);
        return Err(AppError::NotFound("File not found".to_string()));
    }
    ensure_success(status, "download", key)
}

/// rust-s3 is built without `fail-on-err`, so non-2xx responses arrive as `Ok`
fn ensure_success(status: u16, action: &str, key: &str) -> Result<(), AppError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(AppError::ExternalServiceError(format!(
            "Storage {} of '{}' failed with HTTP {}",
            action, key, status
        )))
    }
}
