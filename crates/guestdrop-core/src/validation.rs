//! Input validation shared by the HTTP layer and the upload pipeline.

use crate::AppError;

/// Longest event id accepted on the guest path.
pub const MAX_EVENT_ID_LENGTH: usize = 64;

/// Check that an event id is syntactically usable as a storage key segment.
///
/// Accepts 1 to 64 characters of `[A-Za-z0-9_-]`. This does not check that the
/// event exists.
pub fn validate_event_id(event_id: &str) -> Result<(), AppError> {
    if event_id.is_empty() || event_id.len() > MAX_EVENT_ID_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Event id must be between 1 and {} characters",
            MAX_EVENT_ID_LENGTH
        )));
    }

    if !event_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::InvalidInput(
            "Event id contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Trim a required form field, rejecting it when blank.
pub fn require_field(name: &str, value: Option<String>) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::InvalidInput(format!("Missing field: {}", name))),
    }
}
