mod account;
mod documents;
mod files;

pub use account::{login, logout, me, signup};
pub use documents::{
    admin_approve, admin_reject, forward, list, reviewer_approve, reviewer_reject, upload,
};
pub use files::{download_file, grammar_check};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/upload", post(upload))
        .route("/documents", get(list))
        .route("/documents/:id/file", get(download_file))
        .route("/documents/:id/grammar-check", post(grammar_check))
        .route("/forward/:id", post(forward))
        .route("/reviewer/approve/:id", post(reviewer_approve))
        .route("/reviewer/reject/:id", post(reviewer_reject))
        .route("/admin/approve/:id", post(admin_approve))
        .route("/admin/reject/:id", post(admin_reject))
        // Paths used by older clients.
        .route("/reviewer-reject/:id", post(reviewer_reject))
        .route("/approve/:id", post(admin_approve))
        .route("/reject/:id", post(admin_reject))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
