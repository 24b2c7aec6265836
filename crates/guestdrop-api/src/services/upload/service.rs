//! Upload service
//!
//! Every upload moves through the same pipeline: the body is streamed into a
//! staging file (enforcing the size cap), the staged bytes are forwarded to the
//! object store, and the staging file is removed whatever the outcome.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use guestdrop_core::models::UploadReceipt;
use guestdrop_core::validation::validate_event_id;
use guestdrop_core::{AppError, UnknownEventPolicy};
use guestdrop_db::EventRepository;
use guestdrop_storage::{keys, PutObjectOptions, Storage};
use tokio::io::AsyncWriteExt;

use super::types::{IncomingFile, StagedFile, StoredBackground};
use crate::error::storage_to_app_error;
use crate::utils::now_millis;
use crate::utils::upload::{normalize_content_type, sanitize_filename};

const STAGING_PREFIX: &str = "guestdrop-upload-";

/// Upper bound for event background images, below the guest cap when that is larger.
pub const MAX_BACKGROUND_SIZE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn Storage>,
    events: EventRepository,
    staging_dir: PathBuf,
    max_upload_size_bytes: u64,
    max_background_size_bytes: u64,
    unknown_event_policy: UnknownEventPolicy,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn Storage>,
        events: EventRepository,
        staging_dir: PathBuf,
        max_upload_size_bytes: usize,
        unknown_event_policy: UnknownEventPolicy,
    ) -> Self {
        Self {
            storage,
            events,
            staging_dir,
            max_upload_size_bytes: max_upload_size_bytes as u64,
            max_background_size_bytes: (max_upload_size_bytes as u64)
                .min(MAX_BACKGROUND_SIZE_BYTES),
            unknown_event_policy,
        }
    }

    /// Decide whether uploads for `event_id` are accepted at all.
    pub async fn admit(&self, event_id: &str) -> Result<(), AppError> {
        validate_event_id(event_id)?;

        if self.unknown_event_policy == UnknownEventPolicy::Reject
            && self.events.find_by_id(event_id).await?.is_none()
        {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        Ok(())
    }

    /// Full guest upload: admit, stage, forward, clean up.
    #[tracing::instrument(skip(self, file), fields(event_id = %event_id))]
    pub async fn handle_upload<S>(
        &self,
        event_id: &str,
        file: IncomingFile<S>,
    ) -> Result<UploadReceipt, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>>,
    {
        self.admit(event_id).await?;
        self.store_guest_file(event_id, file).await
    }

    /// Stage and forward a guest file for an already admitted event.
    pub async fn store_guest_file<S>(
        &self,
        event_id: &str,
        file: IncomingFile<S>,
    ) -> Result<UploadReceipt, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>>,
    {
        let staged = self.stage(file, self.max_upload_size_bytes).await?;

        let key = keys::upload_key(
            event_id,
            now_millis(),
            &sanitize_filename(&staged.original_filename),
        );
        let options = PutObjectOptions::private(staged.content_type.clone())
            .with_original_filename(staged.original_filename.clone())
            .with_content_length(staged.size);

        let forwarded = self.forward(&staged, &key, options).await;
        let size = staged.size;
        let original_filename = staged.original_filename.clone();
        staged.close();
        let location = forwarded?;

        tracing::info!(
            event_id = %event_id,
            key = %key,
            size_bytes = size,
            "Guest upload stored"
        );

        Ok(UploadReceipt {
            key,
            location,
            size,
            original_filename,
        })
    }

    /// Forward a staged background image to the public prefix.
    pub async fn store_background(&self, staged: StagedFile) -> Result<StoredBackground, AppError> {
        let key = keys::background_key(now_millis(), &sanitize_filename(&staged.original_filename));
        let options = PutObjectOptions::public(staged.content_type.clone())
            .with_original_filename(staged.original_filename.clone())
            .with_content_length(staged.size);

        let forwarded = self.forward(&staged, &key, options).await;
        staged.close();
        let url = forwarded?;

        Ok(StoredBackground { key, url })
    }

    /// Best-effort removal of a background whose event could not be saved.
    pub async fn discard_background(&self, background: &StoredBackground) {
        if let Err(e) = self.storage.delete(&background.key).await {
            tracing::warn!(
                error = %e,
                key = %background.key,
                "Failed to delete orphaned background"
            );
        }
    }

    /// Stage an event background under the background size cap.
    pub async fn stage_background<S>(&self, file: IncomingFile<S>) -> Result<StagedFile, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>>,
    {
        self.stage(file, self.max_background_size_bytes).await
    }

    /// Stream an incoming file into a fresh staging file, at most `limit` bytes.
    ///
    /// On any failure the staging file is removed before returning.
    async fn stage<S>(&self, file: IncomingFile<S>, limit: u64) -> Result<StagedFile, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>>,
    {
        let IncomingFile {
            filename,
            content_type,
            body,
        } = file;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.staging_dir)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    staging_dir = %self.staging_dir.display(),
                    "Failed to create staging file"
                );
                AppError::Internal(format!("Failed to create staging file: {}", e))
            })?;

        let mut size: u64 = 0;
        let written = async {
            let mut writer = tokio::fs::File::from_std(staging.as_file().try_clone()?);
            let mut body = std::pin::pin!(body);

            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                size += chunk.len() as u64;
                if size > limit {
                    return Err(AppError::PayloadTooLarge(format!(
                        "File size exceeds maximum allowed size of {} MB",
                        limit / 1024 / 1024
                    )));
                }
                writer.write_all(&chunk).await?;
            }

            writer.flush().await?;
            Ok::<(), AppError>(())
        }
        .await;

        let staged = StagedFile {
            file: staging,
            size,
            original_filename: filename.unwrap_or_else(|| "file".to_string()),
            content_type: normalize_content_type(content_type.as_deref()),
        };

        match written {
            Ok(()) => {
                tracing::debug!(
                    path = %staged.path().display(),
                    size_bytes = staged.size,
                    "Upload staged"
                );
                Ok(staged)
            }
            Err(e) => {
                staged.close();
                Err(e)
            }
        }
    }

    async fn forward(
        &self,
        staged: &StagedFile,
        key: &str,
        options: PutObjectOptions,
    ) -> Result<String, AppError> {
        let reader = tokio::fs::File::open(staged.path()).await?;

        self.storage
            .put_object(key, options, Box::pin(reader))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %key, "Failed to forward upload to storage");
                storage_to_app_error(e)
            })
    }
}
