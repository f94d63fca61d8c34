//! Grocer Core Library
//!
//! Shared functionality for the Goose Grocer price comparison tool:
//! - Catalog access over SQLite (seed loading, search)
//! - Item matching via a remote model with a deterministic keyword fallback
//! - Meal expansion into ingredient lists
//! - Weekly plans, meal prep costing and a saved recipe book
//! - Per-store price aggregation and comparison reports
//! - Flyer ingestion through vision models
//! - Pluggable AI backends (Gemini, Ollama, OpenAI-compatible servers)
//! - Prompt library and per-task AI configuration

pub mod aggregator;
pub mod ai;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod db;
pub mod error;
pub mod expander;
pub mod flyer;
pub mod matcher;
pub mod models;
pub mod plan;
pub mod prompts;
pub mod report;

/// Test utilities including a mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregator::aggregate;
pub use ai::{
    AIBackend, AIClient, FlyerDeal, GeminiBackend, MockBackend, OllamaBackend,
    OpenAICompatibleBackend,
};
pub use catalog::{Catalog, StaticCatalog};
pub use compare::PriceComparer;
pub use config::{AiConfig, TaskConfig, TaskType};
pub use db::Database;
pub use error::{Error, Result};
pub use expander::MealExpander;
pub use flyer::{content_hash, FlyerIngester, IngestOutcome, SaveSummary};
pub use matcher::{keyword_match, MatchOutcome, TextMatcher};
pub use models::*;
pub use plan::{merge_ingredients, split_cost, GYM_PREP_STAPLES};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use report::format_results_text;
