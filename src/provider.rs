//! Provider abstraction.
//!
//! Unified interfaces for the four unreliable upstream collaborators the
//! pipeline orchestrates: embedding generation, contextual retrieval,
//! generative suggestion synthesis, and heuristic pattern matching. HTTP
//! clients for local Ollama and Context7 backends live in the submodules;
//! the pipeline itself only sees the traits.

use crate::error::PipelineError;
use crate::item::{Suggestion, WorkItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod context7;
pub mod ollama;
pub mod patterns;
pub mod probe;

/// One retrieved documentation snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub result: String,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

/// Produces embedding vectors for item text. `Ok(None)` means the backend
/// answered but had no embedding to give; the stage degrades either way.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, PipelineError>;
}

/// Retrieves contextual documentation for a sub-query. Each call is
/// independent; per-call failures are skipped by the pipeline.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn query(&self, query: &str) -> Result<ContextSnippet, PipelineError>;
}

/// Synthesizes free-form suggestion text for an item, expected to embed one
/// structured `{"suggestions": [...]}` block.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn generate(
        &self,
        item: &WorkItem,
        context: &[ContextSnippet],
    ) -> Result<String, PipelineError>;
}

/// Secondary heuristic provider, bypassed entirely when disabled.
#[async_trait]
pub trait PatternProvider: Send + Sync {
    async fn analyze(&self, item: &WorkItem) -> Result<Vec<Suggestion>, PipelineError>;
}

/// The provider set one run is wired with. Pattern matching is `None` when
/// disabled by configuration; the stage then costs nothing.
#[derive(Clone)]
pub struct Providers {
    pub embedding: Arc<dyn EmbeddingProvider>,
    pub context: Arc<dyn ContextProvider>,
    pub suggestion: Arc<dyn SuggestionProvider>,
    pub patterns: Option<Arc<dyn PatternProvider>>,
}

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared reqwest client for provider backends. The per-call stage timeout is
/// enforced by the pipeline; the request timeout here is a backstop.
pub(crate) fn build_http_client(request_timeout: Duration) -> Result<Client, PipelineError> {
    Client::builder()
        .no_proxy()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| PipelineError::Configuration(format!("Failed to create HTTP client: {}", e)))
}
