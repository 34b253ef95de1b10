use std::any::Any;

use anyhow::anyhow;
use axum::extract::DefaultBodyLimit;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

use crate::AppState;

mod auth;
mod envelope;
mod error;
mod handlers;
mod routes;

pub use auth::AdminToken;
pub use envelope::Envelope;
pub use error::AppError;

/// Room for the text fields that travel with the video part.
const FORM_FIELDS_ALLOWANCE: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router {
    router_with_static(state, None)
}

/// Same API router; unknown paths are looked up in `static_dir` before
/// falling through to the JSON 404.
pub fn router_with_static(state: AppState, static_dir: Option<&str>) -> Router {
    let body_limit = usize::try_from(state.upload_max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_FIELDS_ALLOWANCE);

    let api = Router::new()
        .merge(routes::health())
        .merge(routes::reviews())
        .merge(routes::moderation());

    let api = match static_dir {
        Some(dir) => api.fallback_service(
            ServeDir::new(dir).not_found_service(handlers::not_found.into_service()),
        ),
        None => api.fallback(handlers::not_found),
    };

    api.layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "request handler panicked");
    AppError::internal("Internal server error").into_response()
}

/// CORS for the configured browser origins. Admin calls send credentials,
/// so a wildcard origin is refused at startup.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            if origin == "*" {
                return Err(anyhow!(
                    "invalid ALLOWED_ORIGINS entry *: list explicit origins, admin requests carry credentials"
                ));
            }
            HeaderValue::from_str(origin)
                .map_err(|err| anyhow!("invalid ALLOWED_ORIGINS entry {}: {}", origin, err))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-admin-token"),
        ]))
}
