//! Ollama-backed embedding and generation clients.
//!
//! Both speak the local Ollama HTTP API: `/api/embeddings` for vectors and
//! `/api/generate` for non-streamed completions.

use crate::error::{map_http_error, PipelineError};
use crate::item::WorkItem;
use crate::provider::{
    build_http_client, ContextSnippet, EmbeddingProvider, SuggestionProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_EMBED_MODEL: &str = "embeddinggemma";
pub const DEFAULT_GENERATION_MODEL: &str = "gemma3";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Embedding client for `POST {base}/api/embeddings`.
pub struct OllamaEmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbeddingClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, PipelineError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(map_http_error)?
            .error_for_status()
            .map_err(map_http_error)?;

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            PipelineError::MalformedResponse(format!("Invalid embedding payload: {}", e))
        })?;

        if parsed.embedding.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parsed.embedding))
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Generation client for `POST {base}/api/generate`.
pub struct OllamaGenerationClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGenerationClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    fn build_prompt(item: &WorkItem, context: &[ContextSnippet]) -> String {
        let mut prompt = format!(
            "You are fixing a {} error.\n\
             File: {} (line {}, column {})\n\
             Message: {}\n",
            item.category.as_str(),
            item.file,
            item.line,
            item.column,
            item.message
        );

        if !item.context.is_empty() {
            prompt.push_str(&format!("Source context:\n{}\n", item.context));
        }

        if !context.is_empty() {
            prompt.push_str("\nRelevant documentation:\n");
            for snippet in context {
                prompt.push_str(&snippet.result);
                prompt.push('\n');
            }
        }

        prompt.push_str(
            "\nRespond with one JSON object: {\"suggestions\": [{\"title\", \
             \"description\", \"code\" (optional), \"confidence\" (0-1), \
             \"category\" (quick-fix|refactor|migration|pattern-matching|general), \
             \"automated\" (bool)}]}. At most five suggestions.",
        );
        prompt
    }
}

#[async_trait]
impl SuggestionProvider for OllamaGenerationClient {
    async fn generate(
        &self,
        item: &WorkItem,
        context: &[ContextSnippet],
    ) -> Result<String, PipelineError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt: Self::build_prompt(item, context),
                stream: false,
            })
            .send()
            .await
            .map_err(map_http_error)?
            .error_for_status()
            .map_err(map_http_error)?;

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            PipelineError::MalformedResponse(format!("Invalid generation payload: {}", e))
        })?;

        if parsed.response.is_empty() {
            return Err(PipelineError::MalformedResponse(
                "Empty generation response".to_string(),
            ));
        }
        Ok(parsed.response)
    }
}
