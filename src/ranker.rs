//! Suggestion ranking.
//!
//! Deterministic filter/score/sort over heterogeneous candidate suggestions
//! merged from the generative and pattern-matching providers.

use crate::item::Suggestion;

/// Candidates at or below this confidence are dropped before ranking.
pub const MIN_CONFIDENCE: f32 = 0.3;

/// Score bonus for suggestions that can be applied without review.
///
/// The bonus deliberately lets a lower-confidence automated suggestion
/// outrank a higher-confidence manual one (0.9 + 0.5 beats 0.95): automatable
/// fixes are preferred.
pub const AUTOMATED_BONUS: f32 = 0.5;

/// Maximum suggestions retained per item.
pub const MAX_SUGGESTIONS: usize = 5;

fn score(suggestion: &Suggestion) -> f32 {
    let bonus = if suggestion.automated {
        AUTOMATED_BONUS
    } else {
        0.0
    };
    suggestion.confidence + bonus
}

/// Filter, score, and order candidates, keeping the top five.
///
/// Ties keep arrival order (stable sort), so earlier providers win on equal
/// score.
pub fn rank(candidates: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut ranked: Vec<Suggestion> = candidates
        .into_iter()
        .filter(|s| !s.title.trim().is_empty() && s.confidence > MIN_CONFIDENCE)
        .collect();

    ranked.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(MAX_SUGGESTIONS);
    ranked
}
