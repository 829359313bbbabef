//! Server-rendered interactive pages.
//!
//! The prompt form drives the same pipeline as `POST /api/generate`, with
//! results and failures rendered inline. A second form reloads the stored
//! history of whichever session id is typed into it.

use crate::state::AppState;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use codesketch_core::DEFAULT_HISTORY_LIMIT;
use codesketch_types::{CodeAnalysis, DEFAULT_SESSION_ID, GenerateResponse, InteractionRecord};
use serde::Deserialize;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

/// GET / - Empty prompt form.
pub async fn index() -> Html<String> {
    Html(page(&form_section("", DEFAULT_SESSION_ID), ""))
}

/// POST /ui/generate - Run the pipeline and render the outcome.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PromptForm>,
) -> (StatusCode, Html<String>) {
    let session_id = if form.session_id.trim().is_empty() {
        DEFAULT_SESSION_ID.to_string()
    } else {
        form.session_id.trim().to_string()
    };

    info!(target: "codesketch::ui", session_id = %session_id, "Form submission");

    let form_html = form_section(&form.prompt, &session_id);
    match state.orchestrator.handle(&form.prompt, &session_id).await {
        Ok(response) => (
            StatusCode::OK,
            Html(page(&form_html, &result_section(&response, &session_id))),
        ),
        Err(e) => {
            error!(target: "codesketch::ui", session_id = %session_id, "Generation failed: {}", e);
            let body = format!(
                r#"<section class="error"><h2>Generation failed</h2><p>{}</p></section>"#,
                escape_html(&e.to_string())
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page(&form_html, &body)))
        }
    }
}

/// GET /ui/history - Render a session's stored interactions.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> (StatusCode, Html<String>) {
    let store = state.store();
    let loaded = store.count_for_session(&query.session_id).and_then(|total| {
        store
            .query_by_session(&query.session_id, DEFAULT_HISTORY_LIMIT)
            .map(|records| (total, records))
    });

    let form_html = form_section("", &query.session_id);
    match loaded {
        Ok((total, records)) => (
            StatusCode::OK,
            Html(page(&form_html, &history_section(&query.session_id, total, &records))),
        ),
        Err(e) => {
            error!(target: "codesketch::ui", session_id = %query.session_id, "History load failed: {}", e);
            let body = format!(
                r#"<section class="error"><h2>History unavailable</h2><p>{}</p></section>"#,
                escape_html(&e.to_string())
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page(&form_html, &body)))
        }
    }
}

fn page(form: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>codesketch</title>
<style>
body {{ font-family: sans-serif; max-width: 960px; margin: 2rem auto; }}
pre {{ background: #f4f4f4; padding: 1rem; overflow-x: auto; }}
.error {{ color: #a00; }}
img {{ max-width: 100%; }}
</style>
</head>
<body>
<h1>codesketch</h1>
{form}
{body}
</body>
</html>"#
    )
}

fn form_section(prompt: &str, session_id: &str) -> String {
    let session_id = escape_html(session_id);
    format!(
        r#"<form method="post" action="/ui/generate">
<label for="prompt">Prompt</label><br>
<textarea id="prompt" name="prompt" rows="6" cols="80">{}</textarea><br>
<label for="session_id">Session</label>
<input id="session_id" name="session_id" value="{session_id}">
<button type="submit">Generate</button>
</form>
<form method="get" action="/ui/history">
<label for="history_session_id">History for session</label>
<input id="history_session_id" name="session_id" value="{session_id}">
<button type="submit">Load history</button>
</form>"#,
        escape_html(prompt)
    )
}

/// Link to a session's history page, safe for any session id.
fn history_href(session_id: &str) -> String {
    escape_html(&format!(
        "/ui/history?session_id={}",
        urlencoding::encode(session_id)
    ))
}

fn result_section(response: &GenerateResponse, session_id: &str) -> String {
    let mut html = String::from(r#"<section class="result">"#);
    html.push_str("<h2>Generated code</h2>");
    html.push_str(&code_block(response.generated_code.as_deref()));
    html.push_str("<h2>Diagram</h2>");
    html.push_str(&diagram_image(response.diagram_base64.as_deref()));
    html.push_str("<h2>Analysis</h2>");
    html.push_str(&analysis_block(&response.analysis));
    let _ = write!(
        html,
        r#"<p><a href="{}">Session history</a></p></section>"#,
        history_href(session_id)
    );
    html
}

fn history_section(session_id: &str, total: u64, records: &[InteractionRecord]) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<section class="history"><h2>History for {}</h2><p>{} stored interaction(s), showing {}</p>"#,
        escape_html(session_id),
        total,
        records.len()
    );

    for record in records {
        let _ = write!(
            html,
            r#"<article><h3>#{} at {}</h3><p>{}</p>"#,
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            escape_html(&record.user_prompt)
        );
        html.push_str(&code_block(record.generated_code.as_deref()));
        html.push_str(&diagram_image(record.diagram_base64.as_deref()));
        match (record.analysis(), &record.analysis_json) {
            (Some(analysis), _) => html.push_str(&analysis_block(&analysis)),
            (None, Some(raw)) => {
                let _ = write!(html, "<pre>{}</pre>", escape_html(raw));
            }
            (None, None) => {}
        }
        html.push_str("</article>");
    }

    html.push_str("</section>");
    html
}

fn code_block(code: Option<&str>) -> String {
    match code {
        Some(code) => format!("<pre><code>{}</code></pre>", escape_html(code)),
        None => "<p><em>No code generated.</em></p>".to_string(),
    }
}

fn diagram_image(diagram_base64: Option<&str>) -> String {
    match diagram_base64 {
        Some(b64) if !b64.is_empty() => format!(
            r#"<img alt="Generated diagram" src="data:{};base64,{}">"#,
            sniff_image_mime(b64),
            b64
        ),
        _ => "<p><em>No diagram.</em></p>".to_string(),
    }
}

fn analysis_block(analysis: &CodeAnalysis) -> String {
    let json = serde_json::to_string_pretty(analysis).unwrap_or_default();
    format!("<pre>{}</pre>", escape_html(&json))
}

/// Guess the image MIME type from its magic bytes, defaulting to PNG.
pub fn sniff_image_mime(diagram_base64: &str) -> &'static str {
    // 16 base64 chars decode to 12 bytes, enough for every signature below
    let head: String = diagram_base64.chars().take(16).collect();
    let Ok(bytes) = BASE64.decode(head.as_bytes()) else {
        return "image/png";
    };

    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
