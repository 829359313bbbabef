//! HTTP route handlers.

pub mod generate;
pub mod history;
pub mod ui;

use crate::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = if state.store().health_check() {
        "ok"
    } else {
        "unavailable"
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

/// Build the full application: JSON API under `/api`, interactive pages at
/// the root.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate::generate))
        .route("/history", get(history::list));

    let ui_routes = Router::new()
        .route("/", get(ui::index))
        .route("/ui/generate", post(ui::submit))
        .route("/ui/history", get(ui::history));

    Router::new()
        .nest("/api", api_routes)
        .merge(ui_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
