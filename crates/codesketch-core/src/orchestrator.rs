//! Request orchestration: code generation, diagram generation, analysis and
//! persistence, strictly in that order.

use crate::analyzer::analyze;
use crate::gateway::{GenerationParams, ModelGateway};
use crate::prompts::{build_codegen_prompt, build_diagram_prompt};
use crate::store::InteractionStore;
use crate::timing::{Stage, StageTimer};
use crate::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use codesketch_types::{GenerateResponse, InteractionRecord, NewInteraction};
use std::sync::Arc;
use tracing::{info, warn};

/// Hosted models used for each remote stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub code_model_id: String,
    pub diagram_model_id: String,
}

/// Sequences the gateway calls and the analyzer, then records the result.
///
/// The diagram call waits for code generation because its prompt depends on
/// the generated code.
pub struct Orchestrator {
    gateway: Arc<dyn ModelGateway>,
    store: Arc<InteractionStore>,
    models: ModelSelection,
    params: GenerationParams,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        store: Arc<InteractionStore>,
        models: ModelSelection,
    ) -> Self {
        Self {
            gateway,
            store,
            models,
            params: GenerationParams::default(),
        }
    }

    pub fn with_generation_params(mut self, params: GenerationParams) -> Self {
        self.params = params.clamped();
        self
    }

    pub fn store(&self) -> &Arc<InteractionStore> {
        &self.store
    }

    pub fn models(&self) -> &ModelSelection {
        &self.models
    }

    /// Run one prompt through the pipeline and persist the outcome.
    ///
    /// A gateway failure aborts before anything is written; a store failure
    /// is returned after the remote calls have already happened.
    pub async fn handle(&self, prompt: &str, session_id: &str) -> Result<GenerateResponse> {
        let mut timer = StageTimer::start();

        timer.begin(Stage::Codegen);
        let generated_code = self
            .gateway
            .generate_text(
                &self.models.code_model_id,
                &build_codegen_prompt(prompt),
                &self.params,
            )
            .await
            .inspect_err(|e| {
                warn!(target: "codesketch::orchestrator", session_id, "Code generation failed: {}", e)
            })?
            .into_text()
            .filter(|code| !code.is_empty());
        timer.end();

        timer.begin(Stage::Diagram);
        let diagram_bytes = self
            .gateway
            .generate_image(
                &self.models.diagram_model_id,
                &build_diagram_prompt(prompt, generated_code.as_deref()),
            )
            .await
            .inspect_err(|e| {
                warn!(target: "codesketch::orchestrator", session_id, "Diagram generation failed: {}", e)
            })?;
        timer.end();
        let diagram_base64 = BASE64.encode(&diagram_bytes);

        timer.begin(Stage::Analysis);
        let mut analysis = analyze(generated_code.as_deref().unwrap_or(""));
        timer.end();
        let latency = timer.finish();
        analysis.latency_ms = Some(latency);

        let id = self.store.insert(&NewInteraction {
            session_id: session_id.to_string(),
            user_prompt: prompt.to_string(),
            generated_code: generated_code.clone(),
            diagram_base64: Some(diagram_base64.clone()),
            analysis: Some(analysis.clone()),
        })?;

        info!(
            target: "codesketch::orchestrator",
            id,
            session_id,
            total_ms = latency.total,
            codegen_ms = latency.codegen,
            diagram_ms = latency.diagram,
            "Handled prompt"
        );

        Ok(GenerateResponse {
            generated_code,
            diagram_base64: Some(diagram_base64),
            analysis,
        })
    }

    /// History passthrough: the most recent `limit` records, oldest first.
    pub fn history(&self, session_id: &str, limit: usize) -> Result<Vec<InteractionRecord>> {
        self.store.query_by_session(session_id, limit)
    }
}
