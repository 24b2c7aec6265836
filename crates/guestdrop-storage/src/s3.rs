use crate::keys::{is_public_key, validate_key};
use crate::traits::{
    ObjectDownload, ObjectReader, PutObjectOptions, Storage, StorageError, StorageResult,
};
use crate::{StorageBackend, Visibility};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use guestdrop_core::models::StoredObject;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, GetOptions, ObjectStore, ObjectStoreExt, Result as ObjectResult,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Object metadata entry carrying the guest-supplied filename.
const ORIGINAL_FILENAME_METADATA: &str = "original-filename";

/// Concurrent metadata lookups while listing.
const LIST_METADATA_CONCURRENCY: usize = 8;

/// object_store cannot set object ACLs: anonymous read is granted by the
/// bucket policy on `backgrounds/`, so the requested visibility must agree
/// with the key's prefix.
fn check_visibility(key: &str, visibility: Visibility) -> StorageResult<()> {
    let public_key = is_public_key(key);
    match (visibility, public_key) {
        (Visibility::PublicRead, true) | (Visibility::Private, false) => Ok(()),
        (Visibility::PublicRead, false) => Err(StorageError::InvalidKey(format!(
            "Public objects must live under backgrounds/: {}",
            key
        ))),
        (Visibility::Private, true) => Err(StorageError::InvalidKey(format!(
            "Objects under backgrounds/ are publicly readable: {}",
            key
        ))),
    }
}

/// S3 storage implementation
///
/// Objects are written through a multipart-capable buffered writer, so a put
/// that fails mid-stream is aborted and never becomes visible. Public objects
/// are served from the bucket's public URL; the bucket policy must grant
/// anonymous read on `backgrounds/`.
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<AmazonS3>,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    public_base_url: Option<String>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `public_base_url` - Optional base URL (CDN or custom domain) for public objects
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        public_base_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the standard AWS environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            bucket,
            region,
            endpoint_url,
            public_base_url: public_base_url.map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    /// Generate public URL for S3 object
    ///
    /// Uses `public_base_url` when configured, then the custom endpoint
    /// (path-style), then the standard AWS virtual-hosted URL.
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref base) = self.public_base_url {
            format!("{}/{}", base, key)
        } else if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    fn attributes_for(options: &PutObjectOptions) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, options.content_type.clone().into());
        if let Some(ref filename) = options.original_filename {
            // S3 user metadata must be ASCII.
            attributes.insert(
                Attribute::Metadata(ORIGINAL_FILENAME_METADATA.into()),
                urlencoding::encode(filename).into_owned().into(),
            );
        }
        attributes
    }

    /// Guest filename stored as object metadata, if any.
    async fn original_filename(&self, location: &Path) -> Option<String> {
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result: ObjectResult<_> = self.store.get_opts(location, options).await;
        match result {
            Ok(result) => result
                .attributes
                .get(&Attribute::Metadata(ORIGINAL_FILENAME_METADATA.into()))
                .and_then(|value| urlencoding::decode(AsRef::<str>::as_ref(value)).ok())
                .map(|name| name.into_owned()),
            Err(e) => {
                tracing::debug!(error = %e, location = %location, "No object metadata");
                None
            }
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_object(
        &self,
        key: &str,
        options: PutObjectOptions,
        mut reader: ObjectReader,
    ) -> StorageResult<String> {
        validate_key(key)?;
        check_visibility(key, options.visibility)?;
        let location = Path::from(key.to_string());
        let start = std::time::Instant::now();

        let store: Arc<dyn ObjectStore> = self.store.clone();
        let mut writer =
            BufWriter::new(store, location).with_attributes(Self::attributes_for(&options));

        let written = async {
            let bytes = tokio::io::copy(&mut reader, &mut writer).await?;
            writer.shutdown().await?;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;

        let size = match written {
            Ok(size) => size,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(
                        error = %abort_err,
                        bucket = %self.bucket,
                        key = %key,
                        "Failed to abort S3 upload"
                    );
                }
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    expected_bytes = ?options.content_length,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                return Err(StorageError::UploadFailed(e.to_string()));
            }
        };

        let url = self.generate_url(key);

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            visibility = ?options.visibility,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(url)
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<StoredObject>> {
        let start = std::time::Instant::now();

        // object_store matches whole path segments; list the enclosing
        // directory and apply the string prefix here.
        let dir = prefix.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let dir_path = Path::from(dir);
        let listing = ObjectStore::list(
            &*self.store,
            if dir.is_empty() { None } else { Some(&dir_path) },
        );

        let metas: Vec<_> = listing.try_collect().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                prefix = %prefix,
                "S3 listing failed"
            );
            StorageError::ListFailed(e.to_string())
        })?;

        let mut objects: Vec<StoredObject> = futures::stream::iter(
            metas
                .into_iter()
                .filter(|meta| meta.location.as_ref().starts_with(prefix)),
        )
        .map(|meta| async move {
            let original_filename = self.original_filename(&meta.location).await;
            StoredObject {
                key: meta.location.to_string(),
                size: meta.size,
                last_modified: meta.last_modified,
                original_filename,
            }
        })
        .buffered(LIST_METADATA_CONCURRENCY)
        .collect()
        .await;
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %prefix,
            count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 listing successful"
        );

        Ok(objects)
    }

    async fn signed_retrieval_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::SignFailed(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ObjectDownload> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| AsRef::<str>::as_ref(value).to_string());
        let size = result.meta.size;

        let bucket = self.bucket.clone();
        let key_owned = key.to_string();
        let stream = result.into_stream().map(move |res| match res {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::error!(
                    bucket = %bucket,
                    key = %key_owned,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream download error"
                );
                Err(StorageError::DownloadFailed(e.to_string()))
            }
        });

        Ok(ObjectDownload {
            content_type,
            visibility: if is_public_key(key) {
                Visibility::PublicRead
            } else {
                Visibility::Private
            },
            size,
            stream: Box::pin(stream),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
