//! Storage module for file blobs
//!
//! [`BlobStore`] is the seam the file service writes bytes through;
//! [`MinIOClient`] is the S3-compatible implementation used in production.

mod minio_client;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use minio_client::MinIOClient;

/// Opaque byte storage addressed by object key
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Full object key for a path relative to the store's prefix
    fn object_key(&self, path: &str) -> String;

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError>;

    /// `AppError::NotFound` when no object exists under `key`
    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}
