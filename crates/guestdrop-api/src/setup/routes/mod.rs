//! Route configuration and setup.
//!
//! Guest pages and uploads live under `/event`, organizer endpoints under
//! `/admin`, and local-backend downloads under `/files`.

mod health;

use crate::handlers::{admin, event_page, guest_upload, stored_file};
use crate::middleware::security_headers::{
    security_headers_middleware, url_origin, SecurityHeadersConfig,
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use guestdrop_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Allowance on top of the upload cap for multipart framing and text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let security_headers_config = Arc::new(SecurityHeadersConfig::new(
        image_origins(config),
        config.is_production(),
    ));

    let body_limit = config
        .max_upload_size_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let http_concurrency_limit = config.http_concurrency_limit();
    tracing::info!(
        http_concurrency_limit,
        body_limit_bytes = body_limit,
        "Request limits enabled"
    );

    let app = Router::new()
        .route("/health", get(health::health_check))
        .merge(guest_routes())
        .merge(admin_routes())
        .merge(file_routes())
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            security_headers_config,
            security_headers_middleware,
        ))
        .with_state(state);

    Ok(app)
}

fn guest_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/event/{event_id}", get(event_page::event_page))
        .route(
            "/event/{event_id}/upload",
            post(guest_upload::upload_to_event),
        )
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(admin::console))
        .route("/admin/create", post(admin::create_event))
        .route("/admin/events", post(admin::list_events))
        .route("/admin/photos/{event_id}", get(admin::list_photos))
}

fn file_routes() -> Router<Arc<AppState>> {
    Router::new().route("/files/{*key}", get(stored_file::get_stored_file))
}

/// Origins that may serve event backgrounds.
fn image_origins(config: &Config) -> Vec<String> {
    [
        config.s3_public_base_url(),
        config.s3_endpoint(),
        config.local_storage_base_url(),
    ]
    .into_iter()
    .flatten()
    .filter_map(url_origin)
    .collect()
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|origin| origin == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
