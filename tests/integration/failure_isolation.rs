//! Partial-failure isolation: one poisoned item never drags down siblings.

use super::test_utils::{queryless_item, test_config, PoisonableEmbedder, PoisonableGenerator, StaticContext};
use mender::item::{ItemStatus, WorkItem};
use mender::orchestrator::BatchOrchestrator;
use mender::provider::Providers;
use std::sync::Arc;

#[tokio::test]
async fn poisoned_item_fails_alone() {
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
    let orchestrator = BatchOrchestrator::new(providers, &test_config(5, 3)).unwrap();

    // Item 7 of 12 fails on every provider invocation.
    let items: Vec<WorkItem> = (0..12)
        .map(|n| {
            if n == 6 {
                queryless_item(n, "poison: unrecoverable parse wreck")
            } else {
                queryless_item(n, "recoverable shape mismatch")
            }
        })
        .collect();
    let poisoned_id = items[6].id.clone();

    let outcome = orchestrator.run(items).await;

    assert_eq!(outcome.report.statistics.fixed, 11);
    assert_eq!(outcome.report.statistics.failed, 1);
    assert_eq!(outcome.failed_items.len(), 1);

    let failed = &outcome.failed_items[0];
    assert_eq!(failed.id, poisoned_id);
    assert_eq!(failed.status, ItemStatus::Failed);
    assert!(failed.attempts >= 1);

    // Every sibling reached processed, in spite of sharing batches with the
    // poisoned item.
    for batch in &outcome.batches {
        for item_outcome in batch.outcomes() {
            if item_outcome.item.id != poisoned_id {
                assert!(item_outcome.success);
                assert_eq!(item_outcome.item.status, ItemStatus::Processed);
            }
        }
    }

    // The report carries successes only.
    assert_eq!(outcome.report.suggestions.len(), 11);
    assert!(outcome
        .report
        .suggestions
        .iter()
        .all(|entry| entry.error_id != poisoned_id));
}

#[tokio::test]
async fn failed_items_are_returned_for_caller_resubmission() {
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

    let items: Vec<WorkItem> = (0..4).map(|n| queryless_item(n, "poison")).collect();
    let outcome = orchestrator.run(items).await;

    // No implicit retry: each item was attempted exactly once.
    assert_eq!(outcome.failed_items.len(), 4);
    assert!(outcome.failed_items.iter().all(|i| i.attempts == 1));
}
