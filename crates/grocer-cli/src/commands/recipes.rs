//! Recipe book commands

use anyhow::{Context, Result};
use grocer_core::db::Database;
use grocer_core::models::NewRecipe;
use grocer_core::{format_results_text, AIClient, PriceComparer};

use super::compare::{parse_item_list, print_match_source};
use super::truncate;

pub fn cmd_recipes_list(db: &Database) -> Result<()> {
    let recipes = db.get_saved_recipes()?;
    if recipes.is_empty() {
        println!("No saved recipes. Try: grocer meal \"tacos\" --save");
        return Ok(());
    }

    println!("{:<5} {:<32} {:<11} INGREDIENTS", "ID", "TITLE", "SAVED");
    println!("{}", "-".repeat(80));
    for recipe in &recipes {
        println!(
            "{:<5} {:<32} {:<11} {}",
            recipe.id,
            truncate(&recipe.title, 32),
            recipe.created_at.format("%Y-%m-%d"),
            truncate(&recipe.ingredients.join(", "), 40)
        );
    }
    println!("\n{} recipe(s)", recipes.len());
    Ok(())
}

pub fn cmd_recipes_save(
    db: &Database,
    title: &str,
    ingredients: &[String],
    instructions: Option<&str>,
) -> Result<()> {
    let ingredients: Vec<String> = ingredients.iter().flat_map(|i| parse_item_list(i)).collect();
    let id = db
        .save_recipe(&NewRecipe {
            title: title.to_string(),
            ingredients,
            instructions: instructions.map(String::from),
        })
        .context("Failed to save recipe")?;

    println!("📖 Saved \"{}\" as #{}", title.trim(), id);
    Ok(())
}

pub async fn cmd_recipes_check(
    db: &Database,
    id: i64,
    ai: Option<AIClient>,
    json: bool,
) -> Result<()> {
    let recipe = db
        .get_recipe(id)?
        .with_context(|| format!("No saved recipe with id {}", id))?;

    let comparer = PriceComparer::new(db, ai);
    let result = comparer
        .check_recipe(&recipe)
        .await
        .context("Failed to price recipe")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("📖 {} (saved {})", recipe.title, recipe.created_at.format("%Y-%m-%d"));
    if let Some(ref instructions) = recipe.instructions {
        println!("   {}", instructions);
    }
    print_match_source(&result);
    println!("{}", format_results_text(&result));
    Ok(())
}

pub fn cmd_recipes_remove(db: &Database, id: i64) -> Result<()> {
    if !db.delete_recipe(id)? {
        anyhow::bail!("No saved recipe with id {}", id);
    }
    println!("🗑️  Removed recipe #{}", id);
    Ok(())
}
