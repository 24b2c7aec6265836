use axum::http::{header, HeaderValue};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Security headers configuration
#[derive(Clone)]
pub struct SecurityHeadersConfig {
    /// Extra origins allowed to serve images (e.g. the public bucket or CDN).
    pub image_origins: Vec<String>,
    pub is_production: bool,
}

impl SecurityHeadersConfig {
    pub fn new(image_origins: Vec<String>, is_production: bool) -> Self {
        Self {
            image_origins,
            is_production,
        }
    }

    /// Build Content-Security-Policy header value
    ///
    /// Pages are server-rendered with inline styles and no scripts.
    fn build_csp(&self) -> String {
        let mut img_src = "img-src 'self' data: https:".to_string();
        for origin in &self.image_origins {
            img_src.push(' ');
            img_src.push_str(origin);
        }

        [
            "default-src 'self'",
            "script-src 'none'",
            "style-src 'self' 'unsafe-inline'",
            img_src.as_str(),
            "media-src 'self' https:",
            "form-action 'self'",
            "frame-ancestors 'none'",
        ]
        .join("; ")
    }
}

/// Origin (scheme://host[:port]) of a URL, if it has one.
pub fn url_origin(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let host = rest.split('/').next().filter(|h| !h.is_empty())?;
    Some(format!("{}://{}", scheme, host))
}

/// Security headers middleware
/// Adds security headers to all HTTP responses
pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // HSTS only makes sense behind HTTPS
    if config.is_production {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    if let Ok(header_value) = HeaderValue::from_str(&config.build_csp()) {
        headers.insert(header::CONTENT_SECURITY_POLICY, header_value);
    }

    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("geolocation=(), microphone=()"),
    );

    // Served files set their own caching
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, private"),
        );
    }

    response
}
