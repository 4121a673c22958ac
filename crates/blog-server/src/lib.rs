//! Blog server library logic.

pub mod api;
pub mod api_posts;
pub mod config;
pub mod fixtures;

use axum::{routing::get, Extension, Json, Router};
use blog_db::DbPool;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api_posts::list_posts_handler))
        .route("/post/{id}/", get(api_posts::get_post_handler))
        .route("/post/{id}", get(api_posts::redirect_post_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
