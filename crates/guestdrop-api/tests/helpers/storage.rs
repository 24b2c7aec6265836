//! Storage doubles for failure-path tests.

#![allow(dead_code)]

use async_trait::async_trait;
use guestdrop_core::models::StoredObject;
use guestdrop_storage::{
    ObjectDownload, ObjectReader, PutObjectOptions, Storage, StorageBackend, StorageError,
    StorageResult,
};
use std::sync::Mutex;
use std::time::Duration;

/// A store that is unreachable for writes. Deletes are recorded.
#[derive(Default)]
pub struct FailingStorage {
    pub deleted: Mutex<Vec<String>>,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn put_object(
        &self,
        _key: &str,
        _options: PutObjectOptions,
        _reader: ObjectReader,
    ) -> StorageResult<String> {
        Err(StorageError::UploadFailed(
            "object store unreachable".to_string(),
        ))
    }

    async fn list_by_prefix(&self, _prefix: &str) -> StorageResult<Vec<StoredObject>> {
        Ok(Vec::new())
    }

    async fn signed_retrieval_url(
        &self,
        key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Err(StorageError::SignFailed(key.to_string()))
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ObjectDownload> {
        Err(StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.deleted
            .lock()
            .expect("delete log poisoned")
            .push(key.to_string());
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
