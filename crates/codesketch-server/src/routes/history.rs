//! History routes.

use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use codesketch_core::DEFAULT_HISTORY_LIMIT;
use codesketch_types::{DEFAULT_SESSION_ID, HistoryItem};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

fn default_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// GET /api/history - Most recent interactions of a session, oldest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryItem>>, (StatusCode, String)> {
    let records = state
        .orchestrator
        .history(&query.session_id, query.limit)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(records.into_iter().map(HistoryItem::from).collect()))
}
