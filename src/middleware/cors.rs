use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

const METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

/// CORS layer for the configured origin.
/// With an explicit origin, credentials (auth cookies) are allowed; otherwise any origin without credentials.
pub fn create_cors_layer(origin: Option<&str>) -> CorsLayer {
    let origin = origin
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .and_then(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        });

    match origin {
        Some(origin) => CorsLayer::new()
            .allow_methods(METHODS)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .allow_origin(origin)
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_methods(METHODS)
            .allow_headers(Any)
            .allow_origin(Any),
    }
}
