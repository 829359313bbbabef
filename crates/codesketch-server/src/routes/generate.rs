//! Generation route.

use crate::state::AppState;
use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use codesketch_types::{GenerateRequest, GenerateResponse};
use std::sync::Arc;
use tracing::{error, info};

/// POST /api/generate - Run a prompt through codegen, diagram and analysis.
///
/// The body is read as JSON whatever the `Content-Type` header says.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let req: GenerateRequest = serde_json::from_slice(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)))?;

    info!(
        target: "codesketch::api",
        session_id = %req.session_id,
        prompt_chars = req.prompt.chars().count(),
        "Generate request"
    );

    let response = state
        .orchestrator
        .handle(&req.prompt, &req.session_id)
        .await
        .map_err(|e| {
            error!(target: "codesketch::api", session_id = %req.session_id, "Generate failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(response))
}
