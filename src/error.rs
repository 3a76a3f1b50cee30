//! Error types for the enrichment pipeline.

use thiserror::Error;

/// Pipeline-level errors.
///
/// Transient and malformed-response errors are caught at stage boundaries
/// and degrade that stage's contribution; configuration errors are fatal
/// and abort a run before the first batch starts.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Transient provider error: {0}")]
    Transient(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider call timed out after {0}s")]
    Timeout(u64),

    #[error("Admission release without a matching acquire")]
    PermitImbalance,

    #[error("Item processing failed: {0}")]
    ItemFailed(String),
}

impl PipelineError {
    /// Whether the error degrades a single stage rather than failing the item.
    pub fn is_stage_degradation(&self) -> bool {
        matches!(
            self,
            PipelineError::Transient(_)
                | PipelineError::MalformedResponse(_)
                | PipelineError::Timeout(_)
        )
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Configuration(err.to_string())
    }
}

/// Map reqwest failures into the pipeline taxonomy.
///
/// Timeouts and connection failures are transient; anything that reached the
/// server but produced garbage is a malformed response.
pub fn map_http_error(error: reqwest::Error) -> PipelineError {
    if error.is_timeout() {
        PipelineError::Transient(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        PipelineError::Transient(format!("Connection error: {}", error))
    } else if error.is_decode() {
        PipelineError::MalformedResponse(format!("Undecodable response body: {}", error))
    } else if error.is_status() {
        PipelineError::Transient(format!(
            "Request failed with status {}: {}",
            error.status().map(|s| s.as_u16()).unwrap_or(0),
            error
        ))
    } else {
        PipelineError::Transient(format!("HTTP error: {}", error))
    }
}
