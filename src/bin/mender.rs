//! Mender CLI: read detected errors, enrich them, print the report.

use anyhow::{Context, Result};
use clap::Parser;
use mender::config::MenderConfig;
use mender::item::{ErrorCategory, Severity, WorkItem};
use mender::logging::init_logging;
use mender::orchestrator::{BatchOrchestrator, ProgressEvent};
use mender::provider::context7::Context7Client;
use mender::provider::ollama::{OllamaEmbeddingClient, OllamaGenerationClient};
use mender::provider::patterns::HeuristicPatternProvider;
use mender::provider::probe::probe_providers;
use mender::provider::Providers;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "mender", about = "Ranked fix suggestions for detected source errors")]
struct Cli {
    /// JSON file containing the detected errors to enrich
    #[arg(long)]
    errors: PathBuf,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override configured batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override configured concurrency cap
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Skip the heuristic pattern-matching stage
    #[arg(long)]
    disable_patterns: bool,
}

/// Input record as emitted by the error detector.
#[derive(Deserialize)]
struct DetectedError {
    file: String,
    line: u32,
    #[serde(default)]
    column: u32,
    message: String,
    #[serde(default = "default_category")]
    category: ErrorCategory,
    #[serde(default = "default_severity")]
    severity: Severity,
    #[serde(default)]
    context: String,
}

fn default_category() -> ErrorCategory {
    ErrorCategory::Unknown
}

fn default_severity() -> Severity {
    Severity::Error
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = MenderConfig::load(cli.config.as_deref())?;
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(max_concurrent) = cli.max_concurrent {
        config.max_concurrent = max_concurrent;
    }
    if cli.disable_patterns {
        config.enable_pattern_matching = false;
    }
    config.validate()?;
    init_logging(Some(&config.logging))?;

    let raw = std::fs::read_to_string(&cli.errors)
        .with_context(|| format!("reading {}", cli.errors.display()))?;
    let detected: Vec<DetectedError> =
        serde_json::from_str(&raw).context("parsing detected errors")?;
    let items: Vec<WorkItem> = detected
        .into_iter()
        .map(|e| {
            WorkItem::new(
                e.file, e.line, e.column, e.message, e.category, e.severity, e.context,
            )
        })
        .collect();
    info!(items = items.len(), "loaded detected errors");

    // Informational only; a dead backend degrades stages, it never gates.
    probe_providers(&config).await;

    let timeout = config.provider_timeout();
    let providers = Providers {
        embedding: Arc::new(OllamaEmbeddingClient::new(
            &config.ollama_base_url,
            &config.embed_model,
            timeout,
        )?),
        context: Arc::new(Context7Client::new(&config.context7_base_url, timeout)?),
        suggestion: Arc::new(OllamaGenerationClient::new(
            &config.ollama_base_url,
            &config.generation_model,
            timeout,
        )?),
        patterns: config
            .enable_pattern_matching
            .then(|| Arc::new(HeuristicPatternProvider::new()) as _),
    };

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
    let progress_task = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            info!(
                batch = event.batch_index + 1,
                of = event.batch_count,
                settled = event.settled,
                total = event.total,
                "progress"
            );
        }
    });

    let orchestrator = BatchOrchestrator::new(providers, &config)?.with_progress(progress_tx);
    let outcome = orchestrator.run(items).await;
    // Close the progress channel so the logger task drains and exits.
    drop(orchestrator);
    let _ = progress_task.await;

    if !outcome.failed_items.is_empty() {
        info!(
            failed = outcome.failed_items.len(),
            "some items failed; rerun with the same input to retry them"
        );
    }

    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    Ok(())
}
