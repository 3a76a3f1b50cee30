//! Context7 documentation retrieval client.
//!
//! Talks to a local Context7 MCP bridge over `POST {base}/tools/call`. Each
//! query is independent; the pipeline skips failed sub-queries.

use crate::error::{map_http_error, PipelineError};
use crate::provider::{build_http_client, ContextProvider, ContextSnippet};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

const DOC_TOKEN_BUDGET: u32 = 5000;

#[derive(Deserialize)]
struct ToolCallResponse {
    #[serde(default)]
    success: bool,
    result: Option<ToolCallResult>,
}

#[derive(Deserialize)]
struct ToolCallResult {
    #[serde(default)]
    content: String,
    #[serde(default)]
    confidence: Option<f32>,
}

pub struct Context7Client {
    client: Client,
    base_url: String,
}

impl Context7Client {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ContextProvider for Context7Client {
    async fn query(&self, query: &str) -> Result<ContextSnippet, PipelineError> {
        let url = format!("{}/tools/call", self.base_url);
        let payload = json!({
            "name": "get_library_docs",
            "arguments": {
                "query": query,
                "tokens": DOC_TOKEN_BUDGET,
                "format": "markdown",
            }
        });

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(map_http_error)?
            .error_for_status()
            .map_err(map_http_error)?;

        let parsed: ToolCallResponse = response.json().await.map_err(|e| {
            PipelineError::MalformedResponse(format!("Invalid tool-call payload: {}", e))
        })?;

        let result = match (parsed.success, parsed.result) {
            (true, Some(result)) if !result.content.is_empty() => result,
            _ => {
                return Err(PipelineError::MalformedResponse(format!(
                    "No content returned for query '{}'",
                    query
                )))
            }
        };

        Ok(ContextSnippet {
            confidence: result.confidence.unwrap_or(0.8).clamp(0.0, 1.0),
            result: result.content,
            timestamp: Utc::now(),
        })
    }
}
