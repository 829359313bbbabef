//! Persisted interaction records.

use crate::CodeAnalysis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session used when a caller does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Fields supplied by the caller when recording an interaction.
///
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInteraction {
    pub session_id: String,
    pub user_prompt: String,
    pub generated_code: Option<String>,
    pub diagram_base64: Option<String>,
    pub analysis: Option<CodeAnalysis>,
}

/// One persisted prompt-to-result cycle. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Store-assigned, strictly increasing across all sessions.
    pub id: i64,
    pub session_id: String,
    pub user_prompt: String,
    pub generated_code: Option<String>,
    pub diagram_base64: Option<String>,
    /// Analysis exactly as it was written, JSON-encoded.
    pub analysis_json: Option<String>,
    /// Server clock at insert time.
    pub created_at: DateTime<Utc>,
}

impl InteractionRecord {
    /// Decode the stored analysis. Rows whose JSON no longer matches the
    /// current shape yield `None`.
    pub fn analysis(&self) -> Option<CodeAnalysis> {
        self.analysis_json
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}
