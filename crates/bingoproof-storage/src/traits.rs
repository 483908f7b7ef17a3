//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement.

use async_trait::async_trait;
use bingoproof_core::StorageBackend;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object already exists at key: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3-compatible object storage, local filesystem) must
/// implement this trait so the pipeline can work with any backend without
/// coupling to implementation details.
///
/// **Keys are write-once.** `put` to an existing key is an
/// [`StorageError::AlreadyExists`] conflict, never an in-place overwrite;
/// key derivation (see the `keys` module) guarantees fresh keys per upload.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write a blob at `key` and return its publicly accessible URL.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String>;

    /// Download a blob by its key.
    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Check if a blob exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Size in bytes of a stored blob, if it exists.
    async fn content_length(&self, key: &str) -> StorageResult<u64>;

    /// Delete a blob by its key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Which backend this is.
    fn backend_type(&self) -> StorageBackend;
}
