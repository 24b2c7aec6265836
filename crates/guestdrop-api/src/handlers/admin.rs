//! Organizer endpoints: console, event creation, event listing, upload browsing.
//!
//! Everything except the console page requires the admin secret.

use crate::auth::{bearer_token, require_admin};
use crate::error::{multipart_to_app_error, HttpAppError};
use crate::services::upload::{IncomingFile, StagedFile};
use crate::services::LinkService;
use crate::state::AppState;
use crate::utils::upload::read_text_field;
use crate::utils::wants_json;
use crate::views;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use futures::TryStreamExt;
use guestdrop_core::models::{EventSummary, NewEvent, UploadLink};
use guestdrop_core::validation::{require_field, validate_event_id};
use guestdrop_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedEventResponse {
    #[serde(flatten)]
    pub summary: EventSummary,
    pub qr_svg: String,
}

#[derive(Debug, Serialize)]
pub struct EventUploadsResponse {
    pub event_id: String,
    pub uploads: Vec<UploadLink>,
}

/// Fields of the create form, collected in whatever order they arrive.
#[derive(Default)]
struct CreateEventForm {
    name: Option<String>,
    date: Option<String>,
    place: Option<String>,
    password: Option<String>,
    background: Option<StagedFile>,
}

pub async fn console() -> Html<String> {
    Html(views::admin_console())
}

/// Create an event: store its background publicly, then record it.
#[tracing::instrument(skip(state, headers, multipart), fields(operation = "create_event"))]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let mut form = CreateEventForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_to_app_error)?
    {
        let field_name = field.name().map(str::to_string).unwrap_or_default();
        match field_name.as_str() {
            "eventName" => form.name = Some(read_text_field(field).await?),
            "eventDate" => form.date = Some(read_text_field(field).await?),
            "eventPlace" => form.place = Some(read_text_field(field).await?),
            "password" => form.password = Some(read_text_field(field).await?),
            "bgPhoto" => {
                if field.file_name().map_or(true, str::is_empty) {
                    continue;
                }
                if form.background.is_some() {
                    return Err(AppError::InvalidInput(
                        "Only one background photo is allowed".to_string(),
                    )
                    .into());
                }
                // A secret presented before the file is checked before staging.
                if form.password.is_some() || bearer_token(&headers).is_some() {
                    require_admin(
                        state.config.admin_password(),
                        &headers,
                        form.password.as_deref(),
                    )?;
                }
                let incoming = IncomingFile {
                    filename: field.file_name().map(String::from),
                    content_type: field.content_type().map(String::from),
                    body: field.map_err(multipart_to_app_error),
                };
                form.background = Some(state.upload.stage_background(incoming).await?);
            }
            _ => {}
        }
    }

    // Nothing is forwarded until both the secret and the fields check out.
    let checked = require_admin(
        state.config.admin_password(),
        &headers,
        form.password.as_deref(),
    )
    .and_then(|()| {
        Ok((
            require_field("eventName", form.name)?,
            require_field("eventDate", form.date)?,
            require_field("eventPlace", form.place)?,
        ))
    });

    let ((name, date, place), staged) = match (checked, form.background) {
        (Ok(fields), Some(staged)) => (fields, staged),
        (Ok(_), None) => {
            return Err(AppError::InvalidInput("Missing field: bgPhoto".to_string()).into());
        }
        (Err(e), staged) => {
            if let Some(staged) = staged {
                staged.close();
            }
            return Err(e.into());
        }
    };

    let background = state.upload.store_background(staged).await?;

    let event = match state
        .events
        .create(NewEvent {
            name,
            date,
            place,
            bg: background.url.clone(),
        })
        .await
    {
        Ok(event) => event,
        Err(e) => {
            state.upload.discard_background(&background).await;
            return Err(e.into());
        }
    };

    let summary = state.links.summarize(event);
    let qr_svg = LinkService::qr_svg(&summary.guest_link)?;

    tracing::info!(
        event_id = %summary.event.id,
        background_key = %background.key,
        "Event created"
    );

    let response = if wants_json(&headers) {
        Json(CreatedEventResponse { summary, qr_svg }).into_response()
    } else {
        Html(views::event_created(&summary, &qr_svg)).into_response()
    };
    Ok(response)
}

/// All events with their guest links.
#[tracing::instrument(skip(state, headers, form), fields(operation = "list_events"))]
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<PasswordForm>,
) -> Result<Response, HttpAppError> {
    require_admin(
        state.config.admin_password(),
        &headers,
        form.password.as_deref(),
    )?;

    let summaries: Vec<EventSummary> = state
        .events
        .list_all()
        .await?
        .into_iter()
        .map(|event| state.links.summarize(event))
        .collect();

    let response = if wants_json(&headers) {
        Json(summaries).into_response()
    } else {
        let password = form.password.unwrap_or_default();
        Html(views::events_list(&summaries, &password)).into_response()
    };
    Ok(response)
}

/// Signed retrieval links for every upload of one event.
///
/// Works for ids that are not in the registry, so uploads accepted under an
/// unknown id stay reachable.
#[tracing::instrument(skip(state, headers, query), fields(operation = "list_photos"))]
pub async fn list_photos(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Query(query): Query<PasswordForm>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    require_admin(
        state.config.admin_password(),
        &headers,
        query.password.as_deref(),
    )?;
    validate_event_id(&event_id)?;

    let uploads = state.links.list_uploads(&event_id).await?;

    let response = if wants_json(&headers) {
        Json(EventUploadsResponse { event_id, uploads }).into_response()
    } else {
        Html(views::photos_page(&event_id, &uploads)).into_response()
    };
    Ok(response)
}
