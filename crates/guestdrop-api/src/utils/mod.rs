pub mod upload;

use axum::http::{header, HeaderMap};

/// Whether the client asked for JSON rather than a rendered page.
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

/// Current time as milliseconds since the Unix epoch, used in storage keys.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
