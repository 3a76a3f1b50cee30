//! Generative output parsing.
//!
//! Provider output is free-form text expected to embed one structured
//! `{"suggestions": [...]}` object. Parsing never silently swallows a
//! failure: strict extraction is tried first, then a regex-based first-block
//! extraction, and only then the documented single-suggestion fallback.

use crate::item::{Suggestion, SuggestionCategory};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Fallback suggestion parameters.
const FALLBACK_CONFIDENCE: f32 = 0.7;
const FALLBACK_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No JSON object found in response")]
    NoStructuredBlock,

    #[error("Structured block did not match the suggestions schema: {0}")]
    SchemaMismatch(String),

    #[error("Structured block contained no suggestions")]
    Empty,
}

#[derive(Deserialize)]
struct SuggestionsEnvelope {
    suggestions: Vec<RawSuggestion>,
}

#[derive(Deserialize)]
struct RawSuggestion {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    confidence: f32,
    #[serde(default = "default_category")]
    category: SuggestionCategory,
    #[serde(default)]
    automated: bool,
}

fn default_category() -> SuggestionCategory {
    SuggestionCategory::General
}

impl From<RawSuggestion> for Suggestion {
    fn from(raw: RawSuggestion) -> Self {
        Suggestion {
            title: raw.title,
            description: raw.description,
            code: raw.code,
            confidence: raw.confidence.clamp(0.0, 1.0),
            category: raw.category,
            automated: raw.automated,
        }
    }
}

fn first_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy: first `{` through last `}` so nested objects stay intact.
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

fn decode_envelope(block: &str) -> Result<Vec<Suggestion>, ParseError> {
    let envelope: SuggestionsEnvelope =
        serde_json::from_str(block).map_err(|e| ParseError::SchemaMismatch(e.to_string()))?;
    if envelope.suggestions.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(envelope.suggestions.into_iter().map(Into::into).collect())
}

/// Extract structured suggestions from raw provider text.
///
/// Strict parse of the whole (trimmed) payload first; if the model wrapped
/// the object in prose or a code fence, fall back to the first-block regex.
pub fn parse_generated(raw: &str) -> Result<Vec<Suggestion>, ParseError> {
    let trimmed = raw.trim();
    if let Ok(suggestions) = decode_envelope(trimmed) {
        return Ok(suggestions);
    }

    let block = first_block_regex()
        .find(trimmed)
        .ok_or(ParseError::NoStructuredBlock)?;
    decode_envelope(block.as_str())
}

/// Synthesize the documented single fallback suggestion from unparsable text.
pub fn fallback_suggestion(raw: &str) -> Suggestion {
    let preview: String = raw.chars().take(FALLBACK_PREVIEW_CHARS).collect();
    Suggestion {
        title: "Review model response".to_string(),
        description: format!("{}...", preview),
        code: None,
        confidence: FALLBACK_CONFIDENCE,
        category: SuggestionCategory::General,
        automated: false,
    }
}

/// Parse provider output, degrading to the fallback suggestion on failure.
pub fn parse_or_fallback(raw: &str) -> Vec<Suggestion> {
    match parse_generated(raw) {
        Ok(suggestions) => suggestions,
        Err(err) => {
            debug!(error = %err, "structured extraction failed, using fallback suggestion");
            vec![fallback_suggestion(raw)]
        }
    }
}
