//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `ai` - AI backend diagnostics
//! - `catalog` - Catalog and flyer deal listings
//! - `compare` - Grocery list and meal comparisons
//! - `core` - Core commands (init, seed) and shared utilities (open_db)
//! - `flyer` - Flyer image ingestion
//! - `plan` - Weekly plans and meal prep
//! - `prompts` - Prompt library management commands
//! - `recipes` - Saved recipe book

pub mod ai;
pub mod catalog;
pub mod compare;
pub mod core;
pub mod flyer;
pub mod plan;
pub mod prompts;
pub mod recipes;

// Re-export command functions for main.rs
pub use ai::*;
pub use catalog::*;
pub use compare::*;
pub use core::*;
pub use flyer::*;
pub use plan::*;
pub use prompts::*;
pub use recipes::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
