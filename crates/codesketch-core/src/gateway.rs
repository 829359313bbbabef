//! Client for hosted model-serving endpoints.
//!
//! Two calls are exposed: text completion and text-to-image. Each is a single
//! POST to `{base_url}/{model_id}` with no retry and no caching.

use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default hosted inference endpoint.
pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";

/// Upper bound on a text-generation call.
pub const TEXT_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on an image-generation call.
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Sampling parameters forwarded with every text-generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    /// In `[0, 1]`.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// In `[0, 1]`.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default)]
    pub return_full_text: bool,
}

fn default_max_new_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.2
}

fn default_top_p() -> f32 {
    0.9
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            return_full_text: false,
        }
    }
}

impl GenerationParams {
    /// Clamp the sampling knobs into `[0, 1]`.
    pub fn clamped(mut self) -> Self {
        self.temperature = self.temperature.clamp(0.0, 1.0);
        self.top_p = self.top_p.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedText {
    pub generated_text: String,
}

/// Shapes a text-generation endpoint is known to answer with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextGeneration {
    /// `[{"generated_text": "..."}, ...]`
    Batch(Vec<GeneratedText>),
    /// `{"generated_text": "..."}`
    Single(GeneratedText),
    /// Anything else, kept verbatim for diagnostics.
    Opaque(serde_json::Value),
}

impl TextGeneration {
    /// The generated text, if the response carried any.
    ///
    /// Opaque payloads yield `None` rather than being passed off as code.
    pub fn into_text(self) -> Option<String> {
        match self {
            TextGeneration::Batch(items) => items.into_iter().next().map(|t| t.generated_text),
            TextGeneration::Single(item) => Some(item.generated_text),
            TextGeneration::Opaque(raw) => {
                warn!(
                    target: "codesketch::gateway",
                    "Unrecognized text-generation response: {}",
                    truncate(&raw.to_string(), 200)
                );
                None
            }
        }
    }
}

/// Boundary to the hosted models. Implemented over HTTP by
/// [`HfInferenceClient`] and by stubs in tests.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn generate_text(
        &self,
        model_id: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<TextGeneration, GatewayError>;

    async fn generate_image(&self, model_id: &str, prompt: &str) -> Result<Vec<u8>, GatewayError>;
}

#[derive(Serialize)]
struct TextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
}

/// HTTP client for a Hugging Face style inference API.
#[derive(Clone)]
pub struct HfInferenceClient {
    base_url: String,
    token: Option<String>,
    text_timeout: Duration,
    image_timeout: Duration,
    http: Client,
}

impl std::fmt::Debug for HfInferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfInferenceClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .field("text_timeout", &self.text_timeout)
            .field("image_timeout", &self.image_timeout)
            .finish()
    }
}

impl HfInferenceClient {
    /// Create a client. A blank token means requests go out unauthenticated.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, GatewayError> {
        // No idle connections are kept, so every call gets its own connection.
        let http = Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            text_timeout: TEXT_TIMEOUT,
            image_timeout: IMAGE_TIMEOUT,
            http,
        })
    }

    /// Override the per-call deadlines for text and image requests.
    pub fn with_timeouts(mut self, text: Duration, image: Duration) -> Self {
        self.text_timeout = text;
        self.image_timeout = image;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/{}", self.base_url, model_id)
    }

    fn post(&self, model_id: &str, timeout: Duration) -> RequestBuilder {
        let request = self.http.post(self.endpoint(model_id)).timeout(timeout);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(request: RequestBuilder, timeout: Duration) -> Result<Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelGateway for HfInferenceClient {
    async fn generate_text(
        &self,
        model_id: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<TextGeneration, GatewayError> {
        debug!(target: "codesketch::gateway", model_id, "Requesting text generation");

        let timeout = self.text_timeout;
        let request = self.post(model_id, timeout).json(&TextGenerationRequest {
            inputs: prompt,
            parameters: params,
        });
        let response = Self::send(request, timeout).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn generate_image(&self, model_id: &str, prompt: &str) -> Result<Vec<u8>, GatewayError> {
        debug!(target: "codesketch::gateway", model_id, "Requesting image generation");

        let timeout = self.image_timeout;
        let request = self.post(model_id, timeout).body(prompt.to_string());
        let response = Self::send(request, timeout).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        debug!(target: "codesketch::gateway", model_id, bytes = bytes.len(), "Received image");
        Ok(bytes.to_vec())
    }
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(timeout)
    } else {
        GatewayError::Transport(err.to_string())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
