//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::{StorageBackend, Visibility};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use guestdrop_core::models::StoredObject;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Listing failed: {0}")]
    ListFailed(String),

    #[error("Signing failed: {0}")]
    SignFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

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

/// Content handed to `put_object`; consumed until EOF.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Chunked object content returned by `get_stream`.
pub type ObjectStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Options for `put_object`.
#[derive(Debug, Clone)]
pub struct PutObjectOptions {
    pub content_type: String,
    pub visibility: Visibility,
    /// Guest-supplied filename, kept as object metadata and never used in the key.
    pub original_filename: Option<String>,
    /// Expected size, when known (used for logging).
    pub content_length: Option<u64>,
}

impl PutObjectOptions {
    pub fn private(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            visibility: Visibility::Private,
            original_filename: None,
            content_length: None,
        }
    }

    pub fn public(content_type: impl Into<String>) -> Self {
        Self {
            visibility: Visibility::PublicRead,
            ..Self::private(content_type)
        }
    }

    pub fn with_original_filename(mut self, filename: impl Into<String>) -> Self {
        self.original_filename = Some(filename.into());
        self
    }

    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }
}

/// An object opened for reading.
pub struct ObjectDownload {
    pub content_type: Option<String>,
    /// Visibility recorded when the object was written.
    pub visibility: Visibility,
    pub size: u64,
    pub stream: ObjectStream,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) implement this trait so the
/// upload pipeline and the browse service never depend on a concrete store.
///
/// **Key format:** see the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `reader` to the store under `key` and return the object's location URL.
    ///
    /// A failed put never leaves a partially written object visible under `key`.
    /// Repeated puts to the same key overwrite.
    async fn put_object(
        &self,
        key: &str,
        options: PutObjectOptions,
        reader: ObjectReader,
    ) -> StorageResult<String>;

    /// List every object whose key starts with `prefix`, ordered by key.
    ///
    /// No match is an empty list, not an error.
    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<StoredObject>>;

    /// Generate a URL granting read access to a private object for `expires_in`.
    ///
    /// Expiry is enforced by whoever serves the URL. Object visibility is not changed.
    async fn signed_retrieval_url(&self, key: &str, expires_in: Duration)
        -> StorageResult<String>;

    /// Open an object as a stream of chunks
    async fn get_stream(&self, key: &str) -> StorageResult<ObjectDownload>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
