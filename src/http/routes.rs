use axum::{routing::get, routing::patch, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/api/health", get(handlers::health))
}

pub fn reviews() -> Router<AppState> {
    Router::new().route(
        "/api/reviews",
        get(handlers::list_approved_reviews).post(handlers::submit_review),
    )
}

pub fn moderation() -> Router<AppState> {
    Router::new()
        .route("/api/admin/reviews", get(handlers::list_all_reviews))
        .route(
            "/api/admin/reviews/:id",
            patch(handlers::update_review_status).delete(handlers::delete_review),
        )
        .route("/api/admin/reviews/:id/edit", patch(handlers::edit_review))
        .route(
            "/api/admin/reviews/:id/toggle-rating",
            patch(handlers::toggle_rating),
        )
}
