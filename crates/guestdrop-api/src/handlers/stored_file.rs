//! Object download route for the local storage backend.
//!
//! Objects stored as publicly readable are served to anyone. Everything else
//! requires a retrieval token issued for that exact key and not yet expired.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use futures::StreamExt;
use guestdrop_core::AppError;
use guestdrop_storage::{token, Visibility};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct StoredFileQuery {
    pub token: Option<String>,
}

#[tracing::instrument(skip(state, query), fields(operation = "get_stored_file"))]
pub async fn get_stored_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<StoredFileQuery>,
) -> Result<Response, HttpAppError> {
    // Objects live elsewhere when the backend hands out its own URLs.
    let Some(secret) = state.file_signing_key.as_deref() else {
        return Err(AppError::NotFound("File not found".to_string()).into());
    };

    let token = query
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = token {
        token::verify(token, &key, secret).map_err(|e| AppError::Forbidden(e.to_string()))?;
    }

    let download = state.storage.get_stream(&key).await?;

    let is_public = download.visibility == Visibility::PublicRead;
    if token.is_none() && !is_public {
        return Err(AppError::Forbidden("Missing retrieval token".to_string()).into());
    }

    let body_stream = download.stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let cache_control = if is_public {
        "public, max-age=86400"
    } else {
        "private, max-age=3600"
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            download
                .content_type
                .as_deref()
                .unwrap_or("application/octet-stream"),
        )
        .header(header::CONTENT_LENGTH, download.size)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
