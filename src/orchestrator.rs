//! Batch orchestration.
//!
//! Partitions the input into fixed-size batches. Batches run strictly
//! sequentially; items within a batch run concurrently, bounded by the
//! admission controller. The public entry point never errors for per-item
//! failures: it always returns a best-effort report, with failed items
//! surfaced distinctly so the caller can decide about resubmission.

use crate::admission::AdmissionController;
use crate::cache::EmbeddingCache;
use crate::config::MenderConfig;
use crate::error::PipelineError;
use crate::item::{BatchResult, ItemOutcome, Suggestion, WorkItem};
use crate::pipeline::ItemPipeline;
use crate::provider::Providers;
use crate::telemetry::{TelemetryAggregator, TelemetryState};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// Progress notification emitted once per settled batch.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    /// Zero-based index of the batch that just settled.
    pub batch_index: usize,
    pub batch_count: usize,
    /// Items settled so far across the whole run.
    pub settled: usize,
    pub total: usize,
    pub statistics: TelemetryState,
}

/// Per-item entry in the final report; successes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub error_id: String,
    pub file: String,
    pub line: u32,
    pub message: String,
    pub suggestions: Vec<Suggestion>,
    pub processing_time_ms: u64,
}

/// Best-effort run report consumed by the external persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub total_errors: usize,
    pub processed: usize,
    pub statistics: TelemetryState,
    pub suggestions: Vec<ReportEntry>,
}

/// Everything a run produced: the report plus failed items and raw batch
/// results for callers that want to resubmit or inspect.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub failed_items: Vec<WorkItem>,
    pub batches: Vec<BatchResult>,
}

pub struct BatchOrchestrator {
    providers: Providers,
    cache: Arc<EmbeddingCache>,
    batch_size: usize,
    max_concurrent: usize,
    stage_timeout: Duration,
    progress: Option<UnboundedSender<ProgressEvent>>,
}

impl BatchOrchestrator {
    /// Build an orchestrator from validated configuration. Configuration
    /// problems are fatal here, before any batch starts.
    pub fn new(providers: Providers, config: &MenderConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            providers,
            cache: Arc::new(EmbeddingCache::new(config.cache_capacity)),
            batch_size: config.batch_size,
            max_concurrent: config.max_concurrent,
            stage_timeout: config.provider_timeout(),
            progress: None,
        })
    }

    /// Attach a best-effort progress channel; one event fires per batch.
    pub fn with_progress(mut self, sender: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// The embedding cache outlives individual runs, so identical errors in
    /// a later run reuse earlier embeddings.
    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// Process every item and return a best-effort report. Per-item failures
    /// never propagate out of this method.
    pub async fn run(&self, items: Vec<WorkItem>) -> RunOutcome {
        let total = items.len();
        let batch_count = total.div_ceil(self.batch_size);
        let telemetry = Arc::new(TelemetryAggregator::new(total));
        let admission = Arc::new(AdmissionController::new(self.max_concurrent));
        let pipeline = Arc::new(ItemPipeline::new(
            self.providers.clone(),
            Arc::clone(&self.cache),
            Arc::clone(&telemetry),
            self.stage_timeout,
        ));

        info!(
            total_items = total,
            batch_count,
            batch_size = self.batch_size,
            max_concurrent = self.max_concurrent,
            "starting enrichment run"
        );

        let mut batches: Vec<BatchResult> = Vec::with_capacity(batch_count);
        let mut entries: Vec<ReportEntry> = Vec::new();
        let mut failed_items: Vec<WorkItem> = Vec::new();
        let mut settled = 0usize;

        let mut remaining = items.into_iter();
        for batch_index in 0..batch_count {
            let batch: Vec<WorkItem> = remaining.by_ref().take(self.batch_size).collect();
            debug!(batch_index, batch_len = batch.len(), "starting batch");

            // Fan out within the batch; the admission controller caps how
            // many pipelines make progress at once. join_all settles every
            // item before the next batch starts.
            let futures = batch.into_iter().map(|item| {
                let admission = Arc::clone(&admission);
                let pipeline = Arc::clone(&pipeline);
                async move {
                    let _permit = admission.acquire().await;
                    pipeline.process(item).await
                }
            });
            let outcomes: Vec<ItemOutcome> = join_all(futures).await;

            settled += outcomes.len();
            for outcome in &outcomes {
                if outcome.success {
                    entries.push(ReportEntry {
                        error_id: outcome.item.id.clone(),
                        file: outcome.item.file.clone(),
                        line: outcome.item.line,
                        message: outcome.item.message.clone(),
                        suggestions: outcome.item.suggestions.clone(),
                        processing_time_ms: outcome.processing_time_ms,
                    });
                } else {
                    failed_items.push(outcome.item.clone());
                }
            }
            batches.push(BatchResult::new(outcomes));

            let statistics = telemetry.snapshot();
            info!(
                batch_index,
                settled,
                total,
                fixed = statistics.fixed,
                failed = statistics.failed,
                "batch settled"
            );
            if let Some(sender) = &self.progress {
                // Best effort: a dropped receiver never affects the run.
                let _ = sender.send(ProgressEvent {
                    batch_index,
                    batch_count,
                    settled,
                    total,
                    statistics,
                });
            }
        }

        let statistics = telemetry.finish();
        info!(
            total,
            fixed = statistics.fixed,
            failed = statistics.failed,
            items_per_second = statistics.items_per_second,
            "enrichment run complete"
        );

        RunOutcome {
            report: RunReport {
                timestamp: Utc::now(),
                total_errors: total,
                processed: statistics.processed,
                statistics,
                suggestions: entries,
            },
            failed_items,
            batches,
        }
    }
}
