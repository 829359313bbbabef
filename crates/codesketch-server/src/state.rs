//! Shared application state.

use crate::config::Config;
use codesketch_core::{HfInferenceClient, InteractionStore, ModelGateway, Orchestrator};
use std::sync::Arc;

/// Shared application state.
///
/// Both request surfaces go through the same orchestrator and store.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub config: Config,
}

impl AppState {
    /// Wire the HTTP inference client to an already opened store.
    pub fn new(config: Config, store: Arc<InteractionStore>) -> codesketch_core::Result<Self> {
        let gateway = HfInferenceClient::new(&config.inference_base_url, config.hf_token.clone())?;
        if !gateway.is_authenticated() {
            tracing::warn!(
                target: "codesketch::startup",
                "No inference token configured, model calls will be unauthenticated"
            );
        }
        Ok(Self::with_gateway(config, store, Arc::new(gateway)))
    }

    /// Build state around any gateway implementation.
    pub fn with_gateway(
        config: Config,
        store: Arc<InteractionStore>,
        gateway: Arc<dyn ModelGateway>,
    ) -> Self {
        let orchestrator = Orchestrator::new(gateway, store, config.model_selection())
            .with_generation_params(config.generation.clone());

        Self {
            orchestrator,
            config,
        }
    }

    pub fn store(&self) -> &Arc<InteractionStore> {
        self.orchestrator.store()
    }
}
