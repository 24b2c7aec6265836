//! Guest upload endpoint.

use crate::error::{multipart_to_app_error, HttpAppError};
use crate::services::upload::IncomingFile;
use crate::state::AppState;
use crate::utils::wants_json;
use crate::views;
use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use guestdrop_core::AppError;
use std::sync::Arc;

const FILE_FIELD: &str = "file";

/// Accept one file from a guest and store it under the event's prefix.
///
/// The event is checked before the body is read. Fields other than `file`
/// are ignored.
#[tracing::instrument(skip(state, headers, multipart), fields(operation = "guest_upload"))]
pub async fn upload_to_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, HttpAppError> {
    state.upload.admit(&event_id).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_to_app_error)?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // Browsers send an empty, unnamed part when no file was picked.
        if field.file_name().map_or(true, str::is_empty) {
            continue;
        }

        let incoming = IncomingFile {
            filename: field.file_name().map(String::from),
            content_type: field.content_type().map(String::from),
            body: field.map_err(multipart_to_app_error),
        };
        let receipt = state.upload.store_guest_file(&event_id, incoming).await?;

        let response = if wants_json(&headers) {
            Json(receipt).into_response()
        } else {
            Html(views::upload_success(&event_id)).into_response()
        };
        return Ok(response);
    }

    Err(AppError::InvalidInput("No file uploaded".to_string()).into())
}
