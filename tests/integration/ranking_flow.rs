//! Ranking semantics end to end: merged provider candidates, automated bias,
//! and the five-suggestion cap.

use super::test_utils::{test_config, CountingEmbedder, StaticContext, StaticGenerator};
use async_trait::async_trait;
use mender::error::PipelineError;
use mender::item::{ErrorCategory, Severity, Suggestion, SuggestionCategory, WorkItem};
use mender::orchestrator::BatchOrchestrator;
use mender::provider::{PatternProvider, Providers};
use mender::ranker::rank;
use std::sync::Arc;

fn candidate(title: &str, confidence: f32, automated: bool) -> Suggestion {
    Suggestion {
        title: title.to_string(),
        description: String::new(),
        code: None,
        confidence,
        category: SuggestionCategory::General,
        automated,
    }
}

#[test]
fn automated_bias_beats_raw_confidence() {
    let ranked = rank(vec![
        candidate("automated", 0.9, true),
        candidate("manual", 0.95, false),
        candidate("weak", 0.2, true),
    ]);

    // The 0.2 candidate is dropped; 0.9 automated (score 1.4) outranks
    // 0.95 manual (score 0.95).
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].title, "automated");
    assert_eq!(ranked[1].title, "manual");
}

struct ManyPatterns;

#[async_trait]
impl PatternProvider for ManyPatterns {
    async fn analyze(&self, _item: &WorkItem) -> Result<Vec<Suggestion>, PipelineError> {
        Ok((0..6)
            .map(|i| candidate(&format!("pattern-{}", i), 0.4 + i as f32 * 0.05, true))
            .collect())
    }
}

const GENERATED: &str = r#"{"suggestions": [
    {"title": "gen-strong", "description": "", "confidence": 0.95, "automated": false},
    {"title": "gen-weak", "description": "", "confidence": 0.1, "automated": false}
]}"#;

#[tokio::test]
async fn merged_candidates_are_capped_at_five() {
    let providers = Providers {
        embedding: Arc::new(CountingEmbedder::new()),
        context: Arc::new(StaticContext),
        suggestion: Arc::new(StaticGenerator(GENERATED)),
        patterns: Some(Arc::new(ManyPatterns)),
    };
    let orchestrator = BatchOrchestrator::new(providers, &test_config(2, 2)).unwrap();

    let item = WorkItem::new(
        "src/app.ts",
        1,
        1,
        "Type mismatch",
        ErrorCategory::Typescript,
        Severity::Error,
        "",
    );
    let outcome = orchestrator.run(vec![item]).await;

    let processed = &outcome.batches[0].outcomes()[0].item;
    assert_eq!(processed.suggestions.len(), 5);
    // gen-weak (0.1) was filtered; every automated pattern scores over the
    // 0.95 manual generation, so the strongest patterns lead.
    assert!(processed.suggestions.iter().all(|s| s.confidence > 0.3));
    assert_eq!(processed.suggestions[0].title, "pattern-5");
    assert!(processed
        .suggestions
        .iter()
        .any(|s| s.title == "gen-strong"));
}

#[tokio::test]
async fn disabled_pattern_stage_contributes_nothing() {
    let providers = Providers {
        embedding: Arc::new(CountingEmbedder::new()),
        context: Arc::new(StaticContext),
        suggestion: Arc::new(StaticGenerator(GENERATED)),
        patterns: None,
    };
    let orchestrator = BatchOrchestrator::new(providers, &test_config(2, 2)).unwrap();

    let item = WorkItem::new(
        "src/app.ts",
        1,
        1,
        "Type mismatch",
        ErrorCategory::Typescript,
        Severity::Error,
        "",
    );
    let outcome = orchestrator.run(vec![item]).await;

    let processed = &outcome.batches[0].outcomes()[0].item;
    assert_eq!(processed.suggestions.len(), 1);
    assert_eq!(processed.suggestions[0].title, "gen-strong");
}
