//! Request and response bodies for the HTTP API.

use crate::{CodeAnalysis, DEFAULT_SESSION_ID, InteractionRecord};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

/// Result of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub generated_code: Option<String>,
    pub diagram_base64: Option<String>,
    pub analysis: CodeAnalysis,
}

/// Wire shape of one history entry.
///
/// `analysis_json` stays string-encoded and `created_at` is ISO-8601.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub session_id: String,
    pub user_prompt: String,
    pub generated_code: Option<String>,
    pub diagram_base64: Option<String>,
    pub analysis_json: Option<String>,
    pub created_at: String,
}

impl From<InteractionRecord> for HistoryItem {
    fn from(r: InteractionRecord) -> Self {
        Self {
            id: r.id,
            session_id: r.session_id,
            user_prompt: r.user_prompt,
            generated_code: r.generated_code,
            diagram_base64: r.diagram_base64,
            analysis_json: r.analysis_json,
            created_at: r.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}
