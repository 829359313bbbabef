//! Core pipeline for codesketch: model gateway, code analyzer, interaction
//! store and the orchestrator that sequences them.

mod analyzer;
mod complexity;
mod error;
mod gateway;
mod orchestrator;
mod prompts;
mod store;
mod timing;

pub use analyzer::{analyze, detect_patterns, tokenize};
pub use complexity::average_complexity;
pub use error::{CodesketchError, GatewayError};
pub use gateway::{
    DEFAULT_INFERENCE_URL, GeneratedText, GenerationParams, HfInferenceClient, IMAGE_TIMEOUT,
    ModelGateway, TEXT_TIMEOUT, TextGeneration,
};
pub use orchestrator::{ModelSelection, Orchestrator};
pub use prompts::{build_codegen_prompt, build_diagram_prompt};
pub use store::{DEFAULT_HISTORY_LIMIT, InteractionStore};
pub use timing::{Stage, StageTimer};

/// Result type for codesketch operations.
pub type Result<T> = std::result::Result<T, CodesketchError>;
