//! Configuration system.
//!
//! Layered loading: built-in defaults, then an optional TOML file, then
//! `MENDER__*` environment overrides. Validation happens once at load; an
//! invalid configuration is fatal before any batch starts.

use crate::error::PipelineError;
use crate::logging::LoggingConfig;
use crate::provider::{context7, ollama};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenderConfig {
    /// Items per batch; batches run strictly sequentially.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrency cap for in-flight item pipelines within a batch.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Independent timeout applied to every provider call.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// When false, the heuristic augmentation stage is skipped entirely.
    #[serde(default = "default_true")]
    pub enable_pattern_matching: bool,

    /// Embedding cache capacity (LRU entries).
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,

    #[serde(default = "default_context7_base_url")]
    pub context7_base_url: String,

    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_batch_size() -> usize {
    5
}

fn default_max_concurrent() -> usize {
    3
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    4096
}

fn default_ollama_base_url() -> String {
    ollama::DEFAULT_BASE_URL.to_string()
}

fn default_context7_base_url() -> String {
    context7::DEFAULT_BASE_URL.to_string()
}

fn default_embed_model() -> String {
    ollama::DEFAULT_EMBED_MODEL.to_string()
}

fn default_generation_model() -> String {
    ollama::DEFAULT_GENERATION_MODEL.to_string()
}

impl Default for MenderConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
            provider_timeout_secs: default_provider_timeout_secs(),
            enable_pattern_matching: default_true(),
            cache_capacity: default_cache_capacity(),
            ollama_base_url: default_ollama_base_url(),
            context7_base_url: default_context7_base_url(),
            embed_model: default_embed_model(),
            generation_model: default_generation_model(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MenderConfig {
    /// Load configuration from defaults, an optional file, and environment.
    ///
    /// Environment overrides use the `MENDER__` prefix with `__` separating
    /// nesting levels, e.g. `MENDER__BATCH_SIZE=10`.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = Config::builder().add_source(Config::try_from(&MenderConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(Environment::with_prefix("MENDER").separator("__"));

        let config: MenderConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::Configuration(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent == 0 {
            return Err(PipelineError::Configuration(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.provider_timeout_secs == 0 {
            return Err(PipelineError::Configuration(
                "provider_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.ollama_base_url.is_empty() || self.context7_base_url.is_empty() {
            return Err(PipelineError::Configuration(
                "provider base URLs must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}
