//! Common utilities for file upload handlers

use axum::extract::multipart::Field;
use guestdrop_core::AppError;

use crate::error::multipart_to_app_error;

const MAX_FILENAME_LENGTH: usize = 255;
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Reduce a client-supplied filename to a safe storage filename.
///
/// Keeps only the final path component, maps anything outside
/// `[A-Za-z0-9._-]` to `_`, and falls back to `file` for traversal attempts
/// or names too short to be meaningful. The result is not unique; storage keys
/// add their own unique part.
pub fn sanitize_filename(filename: &str) -> String {
    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    if filename_only == "." || filename_only == ".." {
        return "file".to_string();
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['_', '.']).is_empty() || sanitized.len() < 3 {
        return "file".to_string();
    }

    sanitized
}

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
pub fn normalize_content_type(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_lowercase()
}

/// Read a text field, trimming surrounding whitespace.
pub async fn read_text_field(field: Field<'_>) -> Result<String, AppError> {
    let text = field.text().await.map_err(multipart_to_app_error)?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_names() {
        assert_eq!(sanitize_filename("IMG_0042.jpg"), "IMG_0042.jpg");
        assert_eq!(sanitize_filename("clip-1.mp4"), "clip-1.mp4");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename("été.png"), "_t_.png");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("C:\\Users\\me\\pic.jpg"), "pic.jpg");
        assert_eq!(sanitize_filename("a/b/c/pic.jpg"), "pic.jpg");
    }

    #[test]
    fn test_sanitize_falls_back_for_traversal_and_short_names() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename("a"), "file");
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("???"), "file");
        assert_eq!(sanitize_filename("a/.."), "file");
    }

    #[test]
    fn test_sanitize_keeps_inner_dots() {
        assert_eq!(sanitize_filename("my..photo.jpg"), "my..photo.jpg");
    }

    #[test]
    fn test_sanitize_non_latin_names_collide() {
        assert_eq!(sanitize_filename("صورة.jpg"), "____.jpg");
        assert_eq!(sanitize_filename("حفلة.jpg"), "____.jpg");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = format!("{}.jpg", "a".repeat(400));
        assert_eq!(sanitize_filename(&long).len(), MAX_FILENAME_LENGTH);
    }

    #[test]
    fn test_normalize_content_type() {
        assert_eq!(
            normalize_content_type(Some("Image/JPEG; charset=utf-8")),
            "image/jpeg"
        );
        assert_eq!(normalize_content_type(None), DEFAULT_CONTENT_TYPE);
        assert_eq!(normalize_content_type(Some("  ")), DEFAULT_CONTENT_TYPE);
    }
}
