use crate::keys::{is_public_key, validate_key, validate_prefix};
use crate::token;
use crate::traits::{
    ObjectDownload, ObjectReader, PutObjectOptions, Storage, StorageError, StorageResult,
};
use crate::{StorageBackend, Visibility};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use guestdrop_core::models::StoredObject;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Directory (under the base path) holding per-object attribute files.
const ATTRS_DIR: &str = ".attrs";

/// Attributes the filesystem cannot carry natively.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ObjectAttributes {
    content_type: Option<String>,
    original_filename: Option<String>,
    public: bool,
}

/// Local filesystem storage implementation
///
/// Objects are plain files under `base_path`. Retrieval URLs point at the
/// service's `/files/{key}` route and carry an HMAC token for private objects.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_key: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/guestdrop/objects")
    /// * `base_url` - Public base URL of this service (e.g., "http://localhost:3000")
    /// * `signing_key` - Secret used to sign retrieval tokens
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_key: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_key: signing_key.into(),
        })
    }

    pub fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }

    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.base_path.join(storage_key))
    }

    fn attrs_path(&self, storage_key: &str) -> PathBuf {
        self.base_path
            .join(ATTRS_DIR)
            .join(format!("{}.json", storage_key))
    }

    /// URL of the object on the `/files` route, each key segment percent-encoded.
    fn generate_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/files/{}", self.base_url, encoded.join("/"))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Sidecar attributes, or `None` for objects written without one.
    async fn read_attrs(&self, storage_key: &str) -> Option<ObjectAttributes> {
        let raw = fs::read(self.attrs_path(storage_key)).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(attrs) => Some(attrs),
            Err(e) => {
                tracing::warn!(error = %e, key = %storage_key, "Unreadable attribute file");
                None
            }
        }
    }

    async fn write_attrs(&self, storage_key: &str, attrs: &ObjectAttributes) -> StorageResult<()> {
        let attrs_path = self.attrs_path(storage_key);
        self.ensure_parent_dir(&attrs_path).await?;
        let attrs_json =
            serde_json::to_vec(attrs).map_err(|e| StorageError::BackendError(e.to_string()))?;
        fs::write(&attrs_path, attrs_json).await?;
        Ok(())
    }

    async fn remove_quietly(path: &Path, what: &str) {
        if let Err(e) = fs::remove_file(path).await {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove {}", what);
        }
    }

    /// Stream `reader` into a hidden temp file beside `path`; the caller renames it.
    async fn write_temp(
        &self,
        path: &Path,
        mut reader: ObjectReader,
    ) -> StorageResult<(PathBuf, u64)> {
        let parent = path.parent().unwrap_or(&self.base_path);
        let temp_path = parent.join(format!(".{}.part", Uuid::new_v4().simple()));

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        let written = async {
            let bytes = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;

        match written {
            Ok(bytes) => Ok((temp_path, bytes)),
            Err(e) => {
                drop(file);
                if let Err(cleanup_err) = fs::remove_file(&temp_path).await {
                    tracing::warn!(
                        error = %cleanup_err,
                        path = %temp_path.display(),
                        "Failed to remove partial file"
                    );
                }
                Err(StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    fn path_to_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let segments: Option<Vec<&str>> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect();
        Some(segments?.join("/"))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_object(
        &self,
        key: &str,
        options: PutObjectOptions,
        reader: ObjectReader,
    ) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;
        let (temp_path, bytes_copied) = self.write_temp(&path, reader).await?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            Self::remove_quietly(&temp_path, "partial file").await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to move file into place {}: {}",
                path.display(),
                e
            )));
        }

        // Never leave an object without its attributes.
        let attrs = ObjectAttributes {
            content_type: Some(options.content_type.clone()),
            original_filename: options.original_filename.clone(),
            public: options.visibility == Visibility::PublicRead,
        };
        if let Err(e) = self.write_attrs(key, &attrs).await {
            Self::remove_quietly(&path, "object without attributes").await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to record attributes for {}: {}",
                key, e
            )));
        }

        let url = self.generate_url(key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes_copied,
            visibility = ?options.visibility,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(url)
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        validate_prefix(prefix)?;

        // Walk only the deepest directory the prefix fully names.
        let root = match prefix.rsplit_once('/') {
            Some((dir, _)) => self.base_path.join(dir),
            None => self.base_path.clone(),
        };

        let mut objects = Vec::new();
        let mut pending = vec![root];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::ListFailed(e.to_string())),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?
            {
                if entry.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }

                let metadata = entry
                    .metadata()
                    .await
                    .map_err(|e| StorageError::ListFailed(e.to_string()))?;
                let path = entry.path();

                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Some(key) = self.path_to_key(&path) else {
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                let last_modified: DateTime<Utc> = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());

                let original_filename = self
                    .read_attrs(&key)
                    .await
                    .and_then(|attrs| attrs.original_filename);

                objects.push(StoredObject {
                    key,
                    size: metadata.len(),
                    last_modified,
                    original_filename,
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));

        tracing::debug!(prefix = %prefix, count = objects.len(), "Local storage listing");

        Ok(objects)
    }

    async fn signed_retrieval_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(key)?;
        let token = token::create(key, expires_in, &self.signing_key);
        Ok(format!("{}?token={}", self.generate_url(key), token))
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ObjectDownload> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => {
                return Err(StorageError::DownloadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        let size = file.metadata().await?.len();
        let attrs = self.read_attrs(key).await;
        // Objects without a sidecar fall back to the prefix convention.
        let visibility = match attrs.as_ref().map(|a| a.public) {
            Some(true) => Visibility::PublicRead,
            Some(false) => Visibility::Private,
            None if is_public_key(key) => Visibility::PublicRead,
            None => Visibility::Private,
        };

        let key_owned = key.to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    key = %key_owned,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream download error"
                );
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(ObjectDownload {
            content_type: attrs.and_then(|a| a.content_type),
            visibility,
            size,
            stream: Box::pin(stream),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        if let Err(e) = fs::remove_file(self.attrs_path(key)).await {
            tracing::debug!(error = %e, key = %key, "No attribute file removed");
        }

        tracing::info!(path = %path.display(), key = %key, "Local storage delete successful");

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
