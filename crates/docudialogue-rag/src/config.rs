//! Configuration for the RAG core

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::config(format!("invalid config: {e}")))
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 300,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of nearest neighbors fetched per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensionality (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout_secs: 120,
        }
    }
}

/// Sampling parameters forwarded to the generation backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Randomness of generation, in [0, 1]
    pub temperature: f32,
    /// Maximum response length in tokens, in [64, 2048]
    pub max_output_tokens: u32,
    /// Nucleus sampling cutoff, in [0, 1]
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1024,
            top_p: 0.9,
        }
    }
}

impl SamplingParams {
    /// Reject out-of-range parameters before they reach a backend.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::config(format!(
                "temperature {} outside [0, 1]",
                self.temperature
            )));
        }
        if !(64..=2048).contains(&self.max_output_tokens) {
            return Err(Error::config(format!(
                "max_output_tokens {} outside [64, 2048]",
                self.max_output_tokens
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(Error::config(format!("top_p {} outside [0, 1]", self.top_p)));
        }
        Ok(())
    }
}

/// Which provider family serves a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI chat-completions API
    OpenAi,
    /// Google Gemini generate-content API
    Gemini,
}

/// The supported generation models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelId {
    /// OpenAI GPT-4o
    Gpt4o,
    /// OpenAI GPT-4o-mini
    Gpt4oMini,
    /// Google Gemini 2.0 Flash
    Gemini2Flash,
}

impl ModelId {
    /// Wire name sent to the provider API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Gemini2Flash => "gemini-2.0-flash-exp",
        }
    }

    /// Provider family this model belongs to.
    pub fn provider(&self) -> ProviderKind {
        match self {
            ModelId::Gpt4o | ModelId::Gpt4oMini => ProviderKind::OpenAi,
            ModelId::Gemini2Flash => ProviderKind::Gemini,
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gpt-4o" => Ok(ModelId::Gpt4o),
            "gpt-4o-mini" => Ok(ModelId::Gpt4oMini),
            "gemini-2.0-flash-exp" | "gemini-2.0-flash" => Ok(ModelId::Gemini2Flash),
            other => Err(Error::config(format!("unknown model id: {other}"))),
        }
    }
}

/// Everything the orchestrator needs to talk to one backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Selected model
    pub model: ModelId,
    /// API key for the model's provider
    pub api_key: String,
    /// Sampling parameters
    pub sampling: SamplingParams,
    /// Override of the provider base URL (used by tests and proxies)
    pub base_url: Option<String>,
}

impl BackendConfig {
    /// Config for a model with default sampling.
    pub fn new(model: ModelId, api_key: impl Into<String>) -> Self {
        Self {
            model,
            api_key: api_key.into(),
            sampling: SamplingParams::default(),
            base_url: None,
        }
    }
}
