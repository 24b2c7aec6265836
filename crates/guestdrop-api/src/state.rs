//! Application state shared by all handlers.

use guestdrop_core::Config;
use guestdrop_db::EventRepository;
use guestdrop_storage::Storage;
use std::sync::Arc;

use crate::services::{LinkService, UploadService};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub events: EventRepository,
    pub upload: UploadService,
    pub links: LinkService,
    /// Secret for `/files` retrieval tokens; set only when objects are served
    /// by this process (local backend).
    pub file_signing_key: Option<Vec<u8>>,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>, events: EventRepository) -> Self {
        let upload = UploadService::new(
            storage.clone(),
            events.clone(),
            config.staging_dir().clone(),
            config.max_upload_size_bytes(),
            config.unknown_event_policy(),
        );
        let links = LinkService::new(
            storage.clone(),
            config.public_base_url(),
            std::time::Duration::from_secs(config.signed_url_ttl_secs()),
        );
        let file_signing_key = match storage.backend_type() {
            guestdrop_core::StorageBackend::Local => {
                Some(config.local_storage_signing_key().as_bytes().to_vec())
            }
            guestdrop_core::StorageBackend::S3 => None,
        };

        Self {
            config,
            storage,
            events,
            upload,
            links,
            file_signing_key,
        }
    }
}
