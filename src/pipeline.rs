//! Per-item enrichment pipeline.
//!
//! Drives one work item through the stage sequence: embedding, context
//! retrieval, suggestion generation, heuristic augmentation, ranking. Every
//! stage is a suspension point under an independent timeout. Stage failures
//! degrade that stage's contribution; the item only fails when every
//! attempted stage raises. Whatever happens, exactly one telemetry update is
//! recorded per item and sibling items are never affected.

use crate::cache::EmbeddingCache;
use crate::error::PipelineError;
use crate::item::{ErrorCategory, ItemOutcome, ItemStatus, Suggestion, WorkItem};
use crate::parse::parse_or_fallback;
use crate::provider::{ContextSnippet, Providers};
use crate::ranker::rank;
use crate::telemetry::TelemetryAggregator;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub struct ItemPipeline {
    providers: Providers,
    cache: Arc<EmbeddingCache>,
    telemetry: Arc<TelemetryAggregator>,
    stage_timeout: Duration,
}

impl ItemPipeline {
    pub fn new(
        providers: Providers,
        cache: Arc<EmbeddingCache>,
        telemetry: Arc<TelemetryAggregator>,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            cache,
            telemetry,
            stage_timeout,
        }
    }

    /// Process one item to a settled outcome. Never panics or propagates
    /// provider errors past the item boundary.
    pub async fn process(&self, mut item: WorkItem) -> ItemOutcome {
        let start = Instant::now();
        item.status = ItemStatus::Processing;
        item.touch();

        let result = self.enrich(&mut item).await;
        let processing_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                item.status = ItemStatus::Processed;
                item.touch();
                self.telemetry.record_success(processing_time_ms);
                info!(
                    item_id = %item.id,
                    suggestions = item.suggestions.len(),
                    duration_ms = processing_time_ms,
                    "item processed"
                );
                ItemOutcome {
                    success: true,
                    item,
                    processing_time_ms,
                    error_message: None,
                }
            }
            Err(err) => {
                item.status = ItemStatus::Failed;
                item.attempts += 1;
                item.touch();
                self.telemetry.record_failure(processing_time_ms);
                warn!(
                    item_id = %item.id,
                    error = %err,
                    attempts = item.attempts,
                    "item failed"
                );
                ItemOutcome {
                    success: false,
                    item,
                    processing_time_ms,
                    error_message: Some(err.to_string()),
                }
            }
        }
    }

    async fn enrich(&self, item: &mut WorkItem) -> Result<(), PipelineError> {
        let mut any_stage_succeeded = false;
        let mut last_error: Option<PipelineError> = None;

        // Stage 1: embedding, memoized. Failure leaves the item without an
        // embedding and the pipeline continues.
        match self
            .timed(self.cache.get_or_embed(item, &*self.providers.embedding))
            .await
        {
            Ok(embedding) => {
                item.embedding = embedding;
                any_stage_succeeded = true;
            }
            Err(err) => {
                warn!(item_id = %item.id, error = %err, "embedding stage degraded");
                last_error = Some(err);
            }
        }

        // Stage 2: category-selected context sub-queries. Each failure is
        // logged and skipped; it never fails the item.
        let mut snippets: Vec<ContextSnippet> = Vec::new();
        for query in context_queries(item) {
            match self.timed(self.providers.context.query(&query)).await {
                Ok(snippet) => {
                    any_stage_succeeded = true;
                    snippets.push(snippet);
                }
                Err(err) => {
                    debug!(item_id = %item.id, query = %query, error = %err, "context sub-query skipped");
                    last_error = Some(err);
                }
            }
        }

        // Stage 3: generative synthesis, parsed strictly with a documented
        // single-suggestion fallback.
        let mut candidates: Vec<Suggestion> = Vec::new();
        match self
            .timed(self.providers.suggestion.generate(item, &snippets))
            .await
        {
            Ok(raw) => {
                any_stage_succeeded = true;
                candidates.extend(parse_or_fallback(&raw));
            }
            Err(err) => {
                warn!(item_id = %item.id, error = %err, "generation stage degraded");
                last_error = Some(err);
            }
        }

        // Stage 4: heuristic augmentation, zero cost when disabled.
        if let Some(patterns) = &self.providers.patterns {
            match self.timed(patterns.analyze(item)).await {
                Ok(found) => {
                    any_stage_succeeded = true;
                    candidates.extend(found);
                }
                Err(err) => {
                    warn!(item_id = %item.id, error = %err, "pattern stage degraded");
                    last_error = Some(err);
                }
            }
        }

        if !any_stage_succeeded {
            return Err(last_error
                .unwrap_or_else(|| PipelineError::ItemFailed("no stage produced output".into())));
        }

        // Stage 5: rank merged candidates and store on the item.
        item.suggestions = rank(candidates);
        Ok(())
    }

    async fn timed<T>(
        &self,
        fut: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        match timeout(self.stage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout(self.stage_timeout.as_secs())),
        }
    }
}

/// Context sub-queries selected by item category.
///
/// Svelte items get one query that switches on the legacy reactive-statement
/// marker; unclassified items in component files get generic component-fix
/// queries; categories with no curated docs get none.
pub fn context_queries(item: &WorkItem) -> Vec<String> {
    match item.category {
        ErrorCategory::Typescript => vec![
            "typescript type error resolution".to_string(),
            "typescript strict mode common fixes".to_string(),
        ],
        ErrorCategory::Svelte => {
            let migration_query = if item.message.contains("$:") {
                "svelte 5 runes migration from reactive statements"
            } else {
                "svelte component error fixes"
            };
            vec![
                "svelte 5 component patterns".to_string(),
                migration_query.to_string(),
            ]
        }
        ErrorCategory::Unknown if item.file.ends_with(".svelte") => vec![
            "svelte component troubleshooting".to_string(),
            "sveltekit common component fixes".to_string(),
        ],
        _ => Vec::new(),
    }
}
