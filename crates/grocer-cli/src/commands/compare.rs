//! Comparison command implementations (compare, meal)

use std::path::Path;

use anyhow::{Context, Result};
use grocer_core::db::Database;
use grocer_core::models::NewRecipe;
use grocer_core::{format_results_text, AIClient, ComparisonResult, PriceComparer};

/// Split free text into items on commas and newlines
pub fn parse_item_list(text: &str) -> Vec<String> {
    text.split(|c: char| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Gather items from positional arguments and an optional list file
pub fn collect_items(args: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut items: Vec<String> = args.iter().flat_map(|a| parse_item_list(a)).collect();

    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read item list {}", path.display()))?;
        items.extend(parse_item_list(&text));
    }

    Ok(items)
}

pub(crate) fn print_match_source(result: &ComparisonResult) {
    if result.match_source.is_remote() {
        println!("🤖 Matched with {}", result.match_source);
    } else {
        println!("🔤 Matched with {}", result.match_source);
    }
}

pub async fn cmd_compare(
    db: &Database,
    items: &[String],
    ai: Option<AIClient>,
    json: bool,
) -> Result<()> {
    let comparer = PriceComparer::new(db, ai);
    if !json && !comparer.has_ai() {
        println!("   💡 Tip: Set GEMINI_API_KEY for AI item matching");
    }

    let result = comparer
        .compare(items)
        .await
        .context("Failed to compare prices")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_match_source(&result);
    println!("{}", format_results_text(&result));
    Ok(())
}

pub async fn cmd_meal(
    db: &Database,
    description: &str,
    ai: Option<AIClient>,
    save: bool,
    json: bool,
) -> Result<()> {
    let comparer = PriceComparer::new(db, ai);
    if !comparer.has_ai() {
        anyhow::bail!("Meal planning needs an AI backend. Set GEMINI_API_KEY in .env");
    }

    if !json {
        println!("🍽️  Figuring out ingredients for \"{}\"...", description.trim());
    }

    let meal = comparer
        .compare_meal(description)
        .await
        .context("Failed to plan meal")?;

    if save {
        let id = save_to_recipe_book(db, description, &meal.ingredients)?;
        if !json {
            println!("📖 Saved to recipe book as #{}", id);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
        return Ok(());
    }

    println!("\n🧾 Ingredients: {}", meal.ingredients.join(", "));
    print_match_source(&meal.comparison);
    println!("{}", format_results_text(&meal.comparison));
    Ok(())
}

/// Store AI-expanded ingredients in the recipe book under `title`
pub(crate) fn save_to_recipe_book(db: &Database, title: &str, ingredients: &[String]) -> Result<i64> {
    db.save_recipe(&NewRecipe {
        title: title.to_string(),
        ingredients: ingredients.to_vec(),
        instructions: None,
    })
    .context("Failed to save recipe")
}
