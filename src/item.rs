//! Work item and suggestion data model.
//!
//! A `WorkItem` is one detected source error flowing through the enrichment
//! pipeline. Item ids are deterministic blake3 hashes of `(file, line,
//! message)`, so the same error triple always yields the same id and cached
//! enrichment state can be reused across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error category assigned by the upstream detector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Typescript,
    Svelte,
    Css,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Typescript => "typescript",
            ErrorCategory::Svelte => "svelte",
            ErrorCategory::Css => "css",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

/// Severity reported by the upstream detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Lifecycle status of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Processed,
    Failed,
}

/// Category of a fix suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionCategory {
    QuickFix,
    Refactor,
    Migration,
    PatternMatching,
    General,
}

/// One candidate fix produced by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Estimated correctness in [0, 1].
    pub confidence: f32,
    pub category: SuggestionCategory,
    /// Whether the fix can be applied without human review.
    pub automated: bool,
}

/// One unit of enrichable input: a detected source error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Deterministic hash of `(file, line, message)`, hex-encoded.
    pub id: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub category: ErrorCategory,
    pub severity: Severity,
    /// Free-text source context around the error location.
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Ranked suggestions, at most five after ranking.
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    pub status: ItemStatus,
    /// Incremented only when processing fails.
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file: impl Into<String>,
        line: u32,
        column: u32,
        message: impl Into<String>,
        category: ErrorCategory,
        severity: Severity,
        context: impl Into<String>,
    ) -> Self {
        let file = file.into();
        let message = message.into();
        let now = Utc::now();
        Self {
            id: compute_item_id(&file, line, &message),
            file,
            line,
            column,
            message,
            category,
            severity,
            context: context.into(),
            embedding: None,
            suggestions: Vec::new(),
            status: ItemStatus::Pending,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Text used for embedding generation and generative prompts.
    pub fn enrichment_text(&self) -> String {
        format!(
            "{} [{}:{}] {}",
            self.category.as_str(),
            self.file,
            self.line,
            self.message
        )
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Compute the deterministic item id from the identifying triple.
///
/// Fields are length-delimited so `("a", 1, "bc")` and `("a1", 1, "c")`
/// cannot collide.
pub fn compute_item_id(file: &str, line: u32, message: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(file.len() as u64).to_le_bytes());
    hasher.update(file.as_bytes());
    hasher.update(&line.to_le_bytes());
    hasher.update(&(message.len() as u64).to_le_bytes());
    hasher.update(message.as_bytes());
    hex::encode(hasher.finalize().as_bytes())
}

/// Outcome of processing one work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub success: bool,
    pub item: WorkItem,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Per-batch outcomes in completion-recorded order. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    outcomes: Vec<ItemOutcome>,
}

impl BatchResult {
    pub fn new(outcomes: Vec<ItemOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }
}
