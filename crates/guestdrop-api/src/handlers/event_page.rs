//! Guest landing page for an event.

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::views;
use axum::{
    extract::{Path, State},
    response::Html,
};
use guestdrop_core::AppError;
use std::sync::Arc;

#[tracing::instrument(skip(state), fields(operation = "event_page"))]
pub async fn event_page(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Html<String>, HttpAppError> {
    let event = state
        .events
        .find_by_id(&event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    Ok(Html(views::guest_page(&event)))
}
