//! Heuristic pattern-matching provider.
//!
//! Local rule table keyed on common TypeScript and Svelte error shapes. No
//! network involved; the whole stage is bypassed when disabled in config.

use crate::error::PipelineError;
use crate::item::{Suggestion, SuggestionCategory, WorkItem};
use crate::provider::PatternProvider;
use async_trait::async_trait;

struct PatternRule {
    needle: &'static str,
    title: &'static str,
    description: &'static str,
    code: Option<&'static str>,
    confidence: f32,
    category: SuggestionCategory,
    automated: bool,
}

const RULES: &[PatternRule] = &[
    PatternRule {
        needle: "cannot find module",
        title: "Install or re-export the missing module",
        description: "The import target is not resolvable. Check the package is \
                      installed and the path (including casing) matches the file on disk.",
        code: None,
        confidence: 0.75,
        category: SuggestionCategory::QuickFix,
        automated: false,
    },
    PatternRule {
        needle: "does not exist on type",
        title: "Add the missing property to the type",
        description: "The accessed member is absent from the declared type. Extend the \
                      interface or narrow the value before the access.",
        code: None,
        confidence: 0.6,
        category: SuggestionCategory::QuickFix,
        automated: false,
    },
    PatternRule {
        needle: "implicitly has an 'any' type",
        title: "Add an explicit type annotation",
        description: "Annotate the binding so strict mode stops inferring `any`.",
        code: Some(": unknown"),
        confidence: 0.8,
        category: SuggestionCategory::QuickFix,
        automated: true,
    },
    PatternRule {
        needle: "$:",
        title: "Migrate reactive statement to runes",
        description: "Legacy `$:` reactive statements should become `$derived` or \
                      `$effect` under Svelte 5 runes mode.",
        code: Some("let value = $derived(expression);"),
        confidence: 0.85,
        category: SuggestionCategory::Migration,
        automated: true,
    },
    PatternRule {
        needle: "export let",
        title: "Migrate component props to $props()",
        description: "Svelte 5 replaces `export let` props with destructured `$props()`.",
        code: Some("let { value } = $props();"),
        confidence: 0.85,
        category: SuggestionCategory::Migration,
        automated: true,
    },
    PatternRule {
        needle: "is declared but its value is never read",
        title: "Remove the unused declaration",
        description: "Delete the binding or prefix it with an underscore if it is \
                      intentionally unused.",
        code: None,
        confidence: 0.9,
        category: SuggestionCategory::QuickFix,
        automated: true,
    },
];

/// Rule-table matcher over the item message.
pub struct HeuristicPatternProvider;

impl HeuristicPatternProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeuristicPatternProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatternProvider for HeuristicPatternProvider {
    async fn analyze(&self, item: &WorkItem) -> Result<Vec<Suggestion>, PipelineError> {
        let message = item.message.to_lowercase();
        let suggestions = RULES
            .iter()
            .filter(|rule| message.contains(&rule.needle.to_lowercase()))
            .map(|rule| Suggestion {
                title: rule.title.to_string(),
                description: rule.description.to_string(),
                code: rule.code.map(str::to_string),
                confidence: rule.confidence,
                category: rule.category,
                automated: rule.automated,
            })
            .collect();
        Ok(suggestions)
    }
}
