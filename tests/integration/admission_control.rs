//! Admission bound and telemetry conservation across full runs.

use super::test_utils::{test_config, ts_item, ConcurrencyTrackingGenerator, StaticContext};
use mender::item::WorkItem;
use mender::orchestrator::BatchOrchestrator;
use mender::provider::Providers;
use std::sync::Arc;
use std::time::Duration;

use super::test_utils::CountingEmbedder;

async fn run_with_cap(max_concurrent: usize, batch_size: usize, items: usize) -> usize {
    let generator = Arc::new(ConcurrencyTrackingGenerator::new(Duration::from_millis(10)));
    let providers = Providers {
        embedding: Arc::new(CountingEmbedder::new()),
        context: Arc::new(StaticContext),
        suggestion: Arc::clone(&generator) as _,
        patterns: None,
    };
    let orchestrator =
        BatchOrchestrator::new(providers, &test_config(batch_size, max_concurrent)).unwrap();
    let work: Vec<WorkItem> = (0..items).map(ts_item).collect();
    let outcome = orchestrator.run(work).await;
    assert_eq!(outcome.report.statistics.processed, items);
    generator.peak()
}

#[tokio::test]
async fn in_flight_pipelines_never_exceed_cap_of_one() {
    let peak = run_with_cap(1, 6, 12).await;
    assert_eq!(peak, 1);
}

#[tokio::test]
async fn in_flight_pipelines_never_exceed_cap_of_three() {
    let peak = run_with_cap(3, 8, 16).await;
    assert!(peak <= 3, "peak concurrency {} exceeded cap 3", peak);
}

#[tokio::test]
async fn cap_larger_than_batch_is_bounded_by_batch() {
    let peak = run_with_cap(10, 4, 8).await;
    assert!(peak <= 4);
}

#[tokio::test]
async fn fixed_plus_failed_equals_total() {
    use super::test_utils::{queryless_item, PoisonableEmbedder, PoisonableGenerator};

    let providers = Providers {
        embedding: Arc::new(PoisonableEmbedder {
            marker: "poison".to_string(),
        }),
        context: Arc::new(StaticContext),
        suggestion: Arc::new(PoisonableGenerator {
            marker: "poison".to_string(),
        }),
        patterns: None,
    };
    let orchestrator = BatchOrchestrator::new(providers, &test_config(4, 2)).unwrap();

    let items: Vec<WorkItem> = (0..10)
        .map(|n| {
            if n % 3 == 0 {
                queryless_item(n, "poison failure")
            } else {
                queryless_item(n, "ordinary failure")
            }
        })
        .collect();

    let outcome = orchestrator.run(items).await;
    let stats = &outcome.report.statistics;
    assert_eq!(stats.total_items, 10);
    assert_eq!(stats.fixed + stats.failed, stats.total_items);
    assert_eq!(stats.failed, 4); // items 0, 3, 6, 9
    assert_eq!(outcome.failed_items.len(), 4);
    assert_eq!(stats.queued, 0);
}
