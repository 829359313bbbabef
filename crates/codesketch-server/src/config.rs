//! Server configuration.
//!
//! Values come from a TOML file (or built-in defaults), then environment
//! variables, then CLI flags, each layer overriding the previous one.

use anyhow::{Context, Result};
use codesketch_core::{DEFAULT_INFERENCE_URL, GenerationParams, ModelSelection};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variables read by [`Config::apply_env`].
pub const ENV_HF_TOKEN: &str = "HF_TOKEN";
pub const ENV_CODE_MODEL_ID: &str = "CODE_MODEL_ID";
pub const ENV_DIFFUSION_MODEL_ID: &str = "DIFFUSION_MODEL_ID";
pub const ENV_DATABASE_PATH: &str = "DATABASE_PATH";
pub const ENV_API_HOST: &str = "API_HOST";
pub const ENV_API_PORT: &str = "API_PORT";
pub const ENV_INFERENCE_BASE_URL: &str = "INFERENCE_BASE_URL";

#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Bearer token for the inference API. Unset means unauthenticated calls.
    #[serde(default)]
    pub hf_token: Option<String>,
    #[serde(default = "default_code_model_id")]
    pub code_model_id: String,
    #[serde(default = "default_diffusion_model_id")]
    pub diffusion_model_id: String,
    #[serde(default = "default_inference_base_url")]
    pub inference_base_url: String,
    #[serde(default)]
    pub generation: GenerationParams,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data").join("app.db")
}

fn default_code_model_id() -> String {
    "bigcode/starcoder2-3b".to_string()
}

fn default_diffusion_model_id() -> String {
    "stabilityai/stable-diffusion-2-1".to_string()
}

fn default_inference_base_url() -> String {
    DEFAULT_INFERENCE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            hf_token: None,
            code_model_id: default_code_model_id(),
            diffusion_model_id: default_diffusion_model_id(),
            inference_base_url: default_inference_base_url(),
            generation: GenerationParams::default(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_path", &self.db_path)
            .field("hf_token", &self.hf_token.as_ref().map(|_| "<redacted>"))
            .field("code_model_id", &self.code_model_id)
            .field("diffusion_model_id", &self.diffusion_model_id)
            .field("inference_base_url", &self.inference_base_url)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }

    /// Override fields from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override fields from an arbitrary variable lookup. Blank values are
    /// treated as unset.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_HF_TOKEN) {
            self.hf_token = Some(token);
        }
        if let Some(model) = get(ENV_CODE_MODEL_ID) {
            self.code_model_id = model;
        }
        if let Some(model) = get(ENV_DIFFUSION_MODEL_ID) {
            self.diffusion_model_id = model;
        }
        if let Some(path) = get(ENV_DATABASE_PATH) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(host) = get(ENV_API_HOST) {
            self.host = host;
        }
        if let Some(port) = get(ENV_API_PORT) {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid port: {:?}", ENV_API_PORT, port))?;
        }
        if let Some(url) = get(ENV_INFERENCE_BASE_URL) {
            self.inference_base_url = url;
        }
        Ok(())
    }

    /// Database path with a leading `~` expanded to the home directory.
    pub fn resolve_db_path(&self) -> PathBuf {
        match (self.db_path.strip_prefix("~"), dirs::home_dir()) {
            (Ok(rest), Some(home)) => home.join(rest),
            _ => self.db_path.clone(),
        }
    }

    pub fn model_selection(&self) -> ModelSelection {
        ModelSelection {
            code_model_id: self.code_model_id.clone(),
            diagram_model_id: self.diffusion_model_id.clone(),
        }
    }
}
