use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry of a prefix listing in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Name the guest gave the file, when the backend kept it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

impl StoredObject {
    /// Final path segment of the key.
    pub fn key_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// The guest's filename, or the key's final segment when none was kept.
    pub fn display_name(&self) -> &str {
        self.original_filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.key_name())
    }
}

/// A guest upload as shown to the admin: its name and a time-limited link.
#[derive(Debug, Clone, Serialize)]
pub struct UploadLink {
    pub display_name: String,
    pub signed_url: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Result of a successful guest upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub key: String,
    pub location: String,
    pub size: u64,
    pub original_filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_is_last_segment() {
        let obj = StoredObject {
            key: "uploads/abc/1700000000000_photo.jpg".to_string(),
            size: 3,
            last_modified: Utc::now(),
            original_filename: None,
        };
        assert_eq!(obj.display_name(), "1700000000000_photo.jpg");
    }

    #[test]
    fn test_display_name_prefers_original_filename() {
        let obj = StoredObject {
            key: "uploads/abc/1700000000000_0f3a_____.jpg".to_string(),
            size: 3,
            last_modified: Utc::now(),
            original_filename: Some("صورة.jpg".to_string()),
        };
        assert_eq!(obj.display_name(), "صورة.jpg");
        assert_eq!(obj.key_name(), "1700000000000_0f3a_____.jpg");
    }
}
