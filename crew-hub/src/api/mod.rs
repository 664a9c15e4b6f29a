//! REST API for the roster hub
//!
//! Serves the live roster read model, group creation, profile and username
//! management, admin data operations, and the SSE event feed.

pub mod handlers;
pub mod sse;

use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest(
            "/api",
            Router::new()
                .route("/roster", get(handlers::get_roster))
                .route("/groups", post(handlers::create_group))
                .route("/users/:id/profile", get(handlers::get_profile))
                .route("/users/:id/profile", put(handlers::put_profile))
                .route("/usernames/:name", get(handlers::get_username))
                .route("/usernames", post(handlers::claim_username))
                .route("/admin/clear", post(handlers::clear_data))
                .route("/admin/seed", post(handlers::seed_data))
                .route("/events", get(sse::event_stream)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
