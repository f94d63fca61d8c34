//! Resolve free-text grocery phrases to catalog product names
//!
//! The remote model is asked first, in one batched call. If no backend is
//! configured, or the call fails in any way, every phrase is resolved by
//! deterministic keyword overlap instead. The outcome records which path ran.

use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient};
use crate::models::{FallbackReason, MatchSource, Resolution};

/// Resolutions for a batch of phrases plus their provenance
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// One entry per input phrase, in input order
    pub resolutions: Vec<Resolution>,
    pub source: MatchSource,
}

/// Phrase-to-product matcher
#[derive(Clone, Default)]
pub struct TextMatcher {
    ai: Option<AIClient>,
}

impl TextMatcher {
    pub fn new(ai: Option<AIClient>) -> Self {
        Self { ai }
    }

    /// Matcher that only ever uses keyword matching
    pub fn keyword_only() -> Self {
        Self { ai: None }
    }

    pub fn ai(&self) -> Option<&AIClient> {
        self.ai.as_ref()
    }

    /// Resolve every phrase to zero or one catalog product name
    ///
    /// Never fails: remote errors degrade to the keyword fallback.
    pub async fn resolve(&self, phrases: &[String], catalog_names: &[String]) -> MatchOutcome {
        if catalog_names.is_empty() {
            return MatchOutcome {
                resolutions: phrases.iter().map(Resolution::unmatched).collect(),
                source: MatchSource::Fallback {
                    reason: FallbackReason::EmptyCatalog,
                },
            };
        }

        let Some(ai) = self.ai.as_ref() else {
            return keyword_outcome(phrases, catalog_names, FallbackReason::NotConfigured);
        };

        match ai.match_products(phrases, catalog_names).await {
            Ok(resolutions) => {
                debug!(
                    model = ai.model(),
                    matched = resolutions.iter().filter(|r| r.product_name.is_some()).count(),
                    "Remote product matching succeeded"
                );
                MatchOutcome {
                    resolutions,
                    source: MatchSource::Remote {
                        model: ai.model().to_string(),
                    },
                }
            }
            Err(e) => {
                warn!(
                    model = ai.model(),
                    "Remote product matching failed, using keyword fallback: {}", e
                );
                keyword_outcome(
                    phrases,
                    catalog_names,
                    FallbackReason::RemoteFailed(e.to_string()),
                )
            }
        }
    }
}

fn keyword_outcome(
    phrases: &[String],
    catalog_names: &[String],
    reason: FallbackReason,
) -> MatchOutcome {
    let resolutions = phrases
        .iter()
        .map(|phrase| Resolution::new(phrase.clone(), keyword_match(phrase, catalog_names)))
        .collect();

    MatchOutcome {
        resolutions,
        source: MatchSource::Fallback { reason },
    }
}

/// Best catalog name for a phrase by keyword overlap
///
/// Each catalog name scores one point per whitespace-separated phrase token
/// that appears in it as a substring, ignoring case. The highest score wins;
/// on a tie the earlier catalog entry is kept. A best score of zero is no match.
pub fn keyword_match(phrase: &str, catalog_names: &[String]) -> Option<String> {
    let phrase = phrase.to_lowercase();
    let tokens: Vec<&str> = phrase.split_whitespace().collect();

    let mut best: Option<&String> = None;
    let mut best_score = 0;
    for name in catalog_names {
        let lower = name.to_lowercase();
        let score = tokens.iter().filter(|t| lower.contains(*t)).count();
        if score > best_score {
            best_score = score;
            best = Some(name);
        }
    }

    best.cloned()
}
