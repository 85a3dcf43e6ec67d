//! HTTP surface of the check-in service.
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /scan | POST | Classify a scanned QR payload and mark attendance |
//! | /attendee/{ticket} | GET | Registration record or 404 |
//! | /stats | GET | `{present_count}` |
//! | /attendance/export | GET | CSV of attendance ordered by scan time |
//! | /ping | GET | Liveness |
//!
//! Every route is also mounted under `/api`.

pub mod csv;
pub mod error;
pub mod handler;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::checkin::CheckinService;

/// Routes without middleware or state.
pub fn build_router() -> Router<CheckinService> {
    Router::new()
        .route("/ping", get(handler::ping))
        .route("/scan", post(handler::scan))
        .route("/attendee/{ticket}", get(handler::attendee))
        .route("/stats", get(handler::stats))
        .route("/attendance/export", get(handler::export))
}

/// Fully configured application: routes at `/` and `/api`, CORS and tracing.
pub fn build_app(service: CheckinService, cors_origins: &[String]) -> Router {
    let routes = build_router();
    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
