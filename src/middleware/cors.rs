use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The browser client may be served from any origin; only the verbs and
/// headers the API uses are allowed.
pub fn api_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any)
}
