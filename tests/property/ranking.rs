//! Property-based tests for ranking invariants.

use mender::item::{Suggestion, SuggestionCategory};
use mender::ranker::{rank, AUTOMATED_BONUS, MAX_SUGGESTIONS, MIN_CONFIDENCE};
use proptest::prelude::*;

fn arb_suggestion() -> impl Strategy<Value = Suggestion> {
    (
        proptest::option::weighted(0.9, "[a-z]{1,12}"),
        0.0f32..=1.0f32,
        any::<bool>(),
    )
        .prop_map(|(title, confidence, automated)| Suggestion {
            title: title.unwrap_or_default(),
            description: String::new(),
            code: None,
            confidence,
            category: SuggestionCategory::General,
            automated,
        })
}

fn score(s: &Suggestion) -> f32 {
    s.confidence + if s.automated { AUTOMATED_BONUS } else { 0.0 }
}

#[test]
fn ranking_invariants_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::vec(arb_suggestion(), 0..20),
            |candidates| {
                let eligible = candidates
                    .iter()
                    .filter(|s| !s.title.trim().is_empty() && s.confidence > MIN_CONFIDENCE)
                    .count();
                let ranked = rank(candidates);

                // Never more than the cap, never fewer than the eligible
                // count allows.
                assert!(ranked.len() <= MAX_SUGGESTIONS);
                assert_eq!(ranked.len(), eligible.min(MAX_SUGGESTIONS));

                // Every survivor passed the filter.
                for s in &ranked {
                    assert!(!s.title.trim().is_empty());
                    assert!(s.confidence > MIN_CONFIDENCE);
                }

                // Scores are non-increasing.
                for pair in ranked.windows(2) {
                    assert!(score(&pair[0]) >= score(&pair[1]));
                }
                Ok(())
            },
        )
        .unwrap();
}

#[test]
fn ranking_is_stable_for_equal_scores_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0.31f32..=1.0f32, 1usize..=5), |(confidence, count)| {
            let candidates: Vec<Suggestion> = (0..count)
                .map(|i| Suggestion {
                    title: format!("s{}", i),
                    description: String::new(),
                    code: None,
                    confidence,
                    category: SuggestionCategory::General,
                    automated: false,
                })
                .collect();

            let ranked = rank(candidates);
            let titles: Vec<&str> = ranked.iter().map(|s| s.title.as_str()).collect();
            let expected: Vec<String> = (0..count).map(|i| format!("s{}", i)).collect();
            assert_eq!(titles, expected.iter().map(String::as_str).collect::<Vec<_>>());
            Ok(())
        })
        .unwrap();
}
