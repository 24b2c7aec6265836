//! Shared key generation for storage backends.
//!
//! Guest uploads live under `uploads/{event_id}/`, event backgrounds under
//! `backgrounds/`. Filenames passed in here must already be sanitized; a
//! random component keeps two uploads with the same sanitized name apart.

use crate::{StorageError, StorageResult};
use uuid::Uuid;

pub const UPLOADS_PREFIX: &str = "uploads";
pub const BACKGROUNDS_PREFIX: &str = "backgrounds";

/// Prefix under which all uploads of one event are stored, with trailing slash.
pub fn event_uploads_prefix(event_id: &str) -> String {
    format!("{}/{}/", UPLOADS_PREFIX, event_id)
}

fn object_name(timestamp_ms: i64, filename: &str) -> String {
    format!("{}_{}_{}", timestamp_ms, Uuid::new_v4().simple(), filename)
}

/// Key for a guest upload: `uploads/{event_id}/{timestamp_ms}_{uuid}_{filename}`.
pub fn upload_key(event_id: &str, timestamp_ms: i64, filename: &str) -> String {
    format!(
        "{}{}",
        event_uploads_prefix(event_id),
        object_name(timestamp_ms, filename)
    )
}

/// Key for an event background: `backgrounds/{timestamp_ms}_{uuid}_{filename}`.
pub fn background_key(timestamp_ms: i64, filename: &str) -> String {
    format!(
        "{}/{}",
        BACKGROUNDS_PREFIX,
        object_name(timestamp_ms, filename)
    )
}

/// Whether the key lives under the publicly readable prefix.
pub fn is_public_key(key: &str) -> bool {
    key.starts_with(BACKGROUNDS_PREFIX) && key[BACKGROUNDS_PREFIX.len()..].starts_with('/')
}

/// Reject keys that could escape the store root or collide with backend
/// bookkeeping files.
///
/// Only whole `.`/`..` segments are traversal; `2_my..photo.jpg` is a valid name.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }

    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }

    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment.starts_with('.'))
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains an empty or hidden segment".to_string(),
        ));
    }

    Ok(())
}

/// Check a listing prefix; the trailing segment may be partial or empty.
pub fn validate_prefix(prefix: &str) -> StorageResult<()> {
    if prefix.starts_with('/')
        || prefix.contains('\\')
        || prefix.split('/').any(|segment| segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(
            "Listing prefix contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_key_layout() {
        let key = upload_key("abc123", 1_700_000_000_000, "photo.jpg");
        let name = key
            .strip_prefix("uploads/abc123/1700000000000_")
            .unwrap();
        let (unique, filename) = name.split_once('_').unwrap();
        assert_eq!(unique.len(), 32);
        assert!(unique.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(filename, "photo.jpg");
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn test_same_name_same_millisecond_keys_differ() {
        assert_ne!(upload_key("e1", 5, "____.jpg"), upload_key("e1", 5, "____.jpg"));
        assert_ne!(background_key(5, "bg.jpg"), background_key(5, "bg.jpg"));
    }

    #[test]
    fn test_background_keys_are_public() {
        let key = background_key(42, "bg.jpg");
        assert!(key.starts_with("backgrounds/42_"));
        assert!(key.ends_with("_bg.jpg"));
        assert!(is_public_key(&key));
        assert!(!is_public_key("uploads/abc/1_a.jpg"));
        assert!(!is_public_key("backgroundsX/1_a.jpg"));
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("uploads/abc/1_a.jpg").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("uploads//a").is_err());
        assert!(validate_key(".attrs/uploads/a").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("uploads/abc/..").is_err());
    }

    #[test]
    fn test_validate_key_allows_dots_inside_names() {
        assert!(validate_key("uploads/e1/2_my..photo.jpg").is_ok());
        assert!(validate_key("uploads/e1/1_a...b").is_ok());
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("uploads/e1/").is_ok());
        assert!(validate_prefix("uploads/e1").is_ok());
        assert!(validate_prefix("").is_ok());
        assert!(validate_prefix("../").is_err());
        assert!(validate_prefix("uploads/../x").is_err());
        assert!(validate_prefix("/etc").is_err());
    }
}
