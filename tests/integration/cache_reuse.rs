//! Embedding memoization across items and across runs.

use super::test_utils::{test_config, CountingEmbedder, StaticContext, StaticGenerator, STRUCTURED_RESPONSE};
use mender::item::{ErrorCategory, Severity, WorkItem};
use mender::orchestrator::BatchOrchestrator;
use mender::provider::Providers;
use std::sync::Arc;

fn duplicate_item() -> WorkItem {
    WorkItem::new(
        "src/dup.ts",
        7,
        2,
        "Cannot find name 'window'",
        ErrorCategory::Typescript,
        Severity::Error,
        "",
    )
}

#[tokio::test]
async fn identical_items_share_one_embedding_call() {
    let embedder = Arc::new(CountingEmbedder::new());
    let providers = Providers {
        embedding: Arc::clone(&embedder) as _,
        context: Arc::new(StaticContext),
        suggestion: Arc::new(StaticGenerator(STRUCTURED_RESPONSE)),
        patterns: None,
    };
    // Sequential processing so the second lookup sees the first insert.
    let orchestrator = BatchOrchestrator::new(providers, &test_config(1, 1)).unwrap();

    let outcome = orchestrator
        .run(vec![duplicate_item(), duplicate_item()])
        .await;

    assert_eq!(outcome.report.statistics.fixed, 2);
    assert_eq!(embedder.call_count(), 1);
    assert_eq!(orchestrator.cache().hits(), 1);
    assert_eq!(orchestrator.cache().misses(), 1);
}

#[tokio::test]
async fn cache_survives_across_runs() {
    let embedder = Arc::new(CountingEmbedder::new());
    let providers = Providers {
        embedding: Arc::clone(&embedder) as _,
        context: Arc::new(StaticContext),
        suggestion: Arc::new(StaticGenerator(STRUCTURED_RESPONSE)),
        patterns: None,
    };
    let orchestrator = BatchOrchestrator::new(providers, &test_config(2, 1)).unwrap();

    orchestrator.run(vec![duplicate_item()]).await;
    orchestrator.run(vec![duplicate_item()]).await;

    // Item ids and cache keys are deterministic, so the second run reuses
    // the first run's embedding.
    assert_eq!(embedder.call_count(), 1);
}

#[tokio::test]
async fn distinct_items_each_invoke_the_provider() {
    let embedder = Arc::new(CountingEmbedder::new());
    let providers = Providers {
        embedding: Arc::clone(&embedder) as _,
        context: Arc::new(StaticContext),
        suggestion: Arc::new(StaticGenerator(STRUCTURED_RESPONSE)),
        patterns: None,
    };
    let orchestrator = BatchOrchestrator::new(providers, &test_config(2, 1)).unwrap();

    let items: Vec<WorkItem> = (0..4)
        .map(|n| {
            WorkItem::new(
                format!("src/f{}.ts", n),
                n,
                0,
                format!("error {}", n),
                ErrorCategory::Typescript,
                Severity::Error,
                "",
            )
        })
        .collect();
    orchestrator.run(items).await;

    assert_eq!(embedder.call_count(), 4);
}
