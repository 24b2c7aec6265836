//! Guest links, QR codes, and admin browsing of an event's uploads.

use std::sync::Arc;
use std::time::Duration;

use guestdrop_core::models::{Event, EventSummary, UploadLink};
use guestdrop_core::AppError;
use guestdrop_storage::{keys, Storage, StorageError};
use qrcode::render::svg;
use qrcode::QrCode;

use crate::error::storage_to_app_error;

#[derive(Clone)]
pub struct LinkService {
    storage: Arc<dyn Storage>,
    public_base_url: String,
    signed_url_ttl: Duration,
}

impl LinkService {
    pub fn new(storage: Arc<dyn Storage>, public_base_url: &str, signed_url_ttl: Duration) -> Self {
        Self {
            storage,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            signed_url_ttl,
        }
    }

    /// `{base_url}/event/{event_id}`, whatever trailing slashes `base_url` carries.
    pub fn guest_link(base_url: &str, event_id: &str) -> String {
        format!("{}/event/{}", base_url.trim_end_matches('/'), event_id)
    }

    pub fn link_for(&self, event_id: &str) -> String {
        Self::guest_link(&self.public_base_url, event_id)
    }

    pub fn summarize(&self, event: Event) -> EventSummary {
        let guest_link = self.link_for(&event.id);
        EventSummary { event, guest_link }
    }

    /// Signed retrieval links for every upload of an event, ordered by key.
    ///
    /// Each link is labelled with the guest's original filename when known.
    #[tracing::instrument(skip(self), fields(event_id = %event_id))]
    pub async fn list_uploads(&self, event_id: &str) -> Result<Vec<UploadLink>, AppError> {
        let objects = self
            .storage
            .list_by_prefix(&keys::event_uploads_prefix(event_id))
            .await
            .map_err(storage_to_app_error)?;

        let mut links = Vec::with_capacity(objects.len());
        for object in objects {
            let signed_url = match self
                .storage
                .signed_retrieval_url(&object.key, self.signed_url_ttl)
                .await
            {
                Ok(url) => url,
                // One unusable key must not hide the rest of the event.
                Err(StorageError::InvalidKey(reason)) => {
                    tracing::warn!(key = %object.key, reason = %reason, "Skipping unsignable upload");
                    continue;
                }
                Err(e) => return Err(storage_to_app_error(e)),
            };
            links.push(UploadLink {
                display_name: object.display_name().to_string(),
                signed_url,
                size: object.size,
                last_modified: object.last_modified,
            });
        }

        tracing::debug!(count = links.len(), "Listed event uploads");

        Ok(links)
    }

    /// Render `link` as a standalone SVG QR code.
    pub fn qr_svg(link: &str) -> Result<String, AppError> {
        let code = QrCode::new(link.as_bytes())
            .map_err(|e| AppError::Internal(format!("Failed to encode QR code: {}", e)))?;

        Ok(code
            .render::<svg::Color>()
            .min_dimensions(200, 200)
            .quiet_zone(true)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestdrop_storage::{LocalStorage, PutObjectOptions};

    #[test]
    fn test_guest_link_trims_trailing_slash() {
        assert_eq!(
            LinkService::guest_link("https://photos.example.com/", "abc"),
            "https://photos.example.com/event/abc"
        );
        assert_eq!(
            LinkService::guest_link("http://localhost:3000", "abc"),
            "http://localhost:3000/event/abc"
        );
    }

    #[test]
    fn test_qr_svg_is_svg() {
        let svg = LinkService::qr_svg("https://photos.example.com/event/abc").unwrap();
        assert!(svg.contains("<svg"));
    }

    #[tokio::test]
    async fn test_list_uploads_signs_each_object() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path(), "http://localhost:3000".to_string(), b"k".to_vec())
                .await
                .unwrap(),
        );
        for key in ["uploads/e1/2_b.jpg", "uploads/e1/1_a.jpg", "uploads/e2/1_c.jpg"] {
            storage
                .put_object(
                    key,
                    PutObjectOptions::private("image/jpeg"),
                    Box::pin(std::io::Cursor::new(b"data".to_vec())),
                )
                .await
                .unwrap();
        }

        let links = LinkService::new(storage, "http://localhost:3000", Duration::from_secs(60));
        let uploads = links.list_uploads("e1").await.unwrap();

        let names: Vec<&str> = uploads.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["1_a.jpg", "2_b.jpg"]);
        assert!(uploads.iter().all(|u| u.signed_url.contains("?token=")));
        assert!(links.list_uploads("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_uploads_keeps_dotted_names_and_original_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path(), "http://localhost:3000".to_string(), b"k".to_vec())
                .await
                .unwrap(),
        );
        storage
            .put_object(
                "uploads/e1/1_a.jpg",
                PutObjectOptions::private("image/jpeg").with_original_filename("صورة.jpg"),
                Box::pin(std::io::Cursor::new(b"data".to_vec())),
            )
            .await
            .unwrap();
        // Written by an older release without sanitizing.
        std::fs::write(dir.path().join("uploads/e1/2_my..photo.jpg"), b"old").unwrap();

        let links = LinkService::new(storage, "http://localhost:3000", Duration::from_secs(60));
        let uploads = links.list_uploads("e1").await.unwrap();

        let names: Vec<&str> = uploads.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["صورة.jpg", "2_my..photo.jpg"]);
        assert!(uploads.iter().all(|u| u.signed_url.contains("?token=")));
    }
}
