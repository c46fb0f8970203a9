//! Runtime configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{ChannelOverlay, ZenomeError, ZenomeResult};
use crate::{
    DEFAULT_API_BASE, DEFAULT_EMBEDDING_MODEL, DEFAULT_ENCODING, DEFAULT_GRID_SIZE,
    DEFAULT_NARRATIVE_MODEL, MAX_GRID_SIZE,
};

/// Env var holding the hosted-model API key
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Env var overriding the API base URL
pub const ENV_API_BASE: &str = "ZENOME_API_BASE";

/// Which tokenizer feeds the entropy metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    /// tiktoken BPE ranks for `encoding`
    #[default]
    Bpe,
    /// Hashed regex pre-token pieces; approximates BPE token counts
    Hashing,
}

/// Runtime configuration for the query pipeline.
///
/// Resolution order: defaults, then JSON file, then environment, then
/// CLI flags (applied by the binary).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZenomeConfig {
    /// Samples per axis of the field grid. Default: 40.
    pub grid_size: usize,

    /// Embedding model name. Default: text-embedding-ada-002.
    pub embedding_model: String,

    /// Chat model used for interpretations. Default: gpt-4.
    pub narrative_model: String,

    /// Tokenizer encoding name. Default: cl100k_base.
    pub encoding: String,

    /// Tokenizer implementation. Default: bpe.
    pub tokenizer: TokenizerKind,

    /// Base URL for the hosted embedding and chat endpoints.
    pub api_base: String,

    /// API key. Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Ask the narrative service for an interpretation of each query.
    pub narrative_enabled: bool,

    /// Channels overlaid into the field bias unless a request overrides them.
    pub overlay: ChannelOverlay,
}

impl Default for ZenomeConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            narrative_model: DEFAULT_NARRATIVE_MODEL.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            tokenizer: TokenizerKind::Bpe,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            narrative_enabled: true,
            overlay: ChannelOverlay::all(),
        }
    }
}

impl ZenomeConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> ZenomeResult<()> {
        if !(2..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(ZenomeError::Config(format!(
                "grid_size must be in [2, {}], got {}",
                MAX_GRID_SIZE, self.grid_size
            )));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(ZenomeError::Config("embedding_model must not be empty".to_string()));
        }
        if self.narrative_model.trim().is_empty() {
            return Err(ZenomeError::Config("narrative_model must not be empty".to_string()));
        }
        if self.encoding.trim().is_empty() {
            return Err(ZenomeError::Config("encoding must not be empty".to_string()));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ZenomeError::Config(format!(
                "api_base must be an http(s) URL, got {}",
                self.api_base
            )));
        }
        Ok(())
    }

    /// Load from JSON string. Missing keys fall back to defaults.
    pub fn from_json(json: &str) -> ZenomeResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ZenomeError::Config(format!("JSON parse error: {e}")))
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ZenomeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Overlay values from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup (process env in production).
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(base) = lookup(ENV_API_BASE).filter(|b| !b.trim().is_empty()) {
            self.api_base = base;
        }
        self
    }
}
