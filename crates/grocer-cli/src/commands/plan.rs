//! Planning command implementations (week, prep gym, prep batch)

use std::path::Path;

use anyhow::{Context, Result};
use grocer_core::db::Database;
use grocer_core::{format_results_text, AIClient, PriceComparer};

use super::compare::{print_match_source, save_to_recipe_book};

/// Gather meals from positional arguments and an optional file, one meal per line
///
/// Meals are not split on commas, so "rice, beans and salsa" stays one meal.
pub fn collect_meals(args: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut meals: Vec<String> = args
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect();

    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read meal list {}", path.display()))?;
        meals.extend(
            text.lines()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from),
        );
    }

    Ok(meals)
}

pub async fn cmd_week(
    db: &Database,
    meals: &[String],
    ai: Option<AIClient>,
    json: bool,
) -> Result<()> {
    let comparer = PriceComparer::new(db, ai);
    if !comparer.has_ai() {
        anyhow::bail!("Weekly planning needs an AI backend. Set GEMINI_API_KEY in .env");
    }

    if !json {
        println!("📅 Planning {} meal(s)...", meals.len());
    }

    let plan = comparer
        .compare_meals(meals)
        .await
        .context("Failed to plan the week")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    for meal in &plan.unexpanded {
        println!("   ⚠️  Could not work out ingredients for \"{}\"", meal);
    }
    println!(
        "\n🧾 Master list ({} items): {}",
        plan.ingredients.len(),
        plan.ingredients.join(", ")
    );
    print_match_source(&plan.comparison);
    println!("{}", format_results_text(&plan.comparison));
    Ok(())
}

pub async fn cmd_prep_gym(
    db: &Database,
    days: u32,
    meals_per_day: u32,
    ai: Option<AIClient>,
    json: bool,
) -> Result<()> {
    let comparer = PriceComparer::new(db, ai);
    let plan = comparer
        .gym_prep(days, meals_per_day)
        .await
        .context("Failed to cost meal prep")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "💪 Gym prep: {} days × {} meals\n",
        plan.days, plan.meals_per_day
    );
    print_match_source(&plan.comparison);
    println!("{}", format_results_text(&plan.comparison));
    println!("   Per day:  ${:.2}", plan.cost_per_day);
    println!("   Per meal: ${:.2}", plan.cost_per_meal);
    Ok(())
}

pub async fn cmd_prep_batch(
    db: &Database,
    recipe: &str,
    servings: u32,
    ai: Option<AIClient>,
    save: bool,
    json: bool,
) -> Result<()> {
    let comparer = PriceComparer::new(db, ai);
    if !comparer.has_ai() {
        anyhow::bail!("Batch cooking needs an AI backend. Set GEMINI_API_KEY in .env");
    }

    if !json {
        println!("🍲 Scaling \"{}\" to {} servings...", recipe.trim(), servings);
    }

    let plan = comparer
        .batch_cook(recipe, servings)
        .await
        .context("Failed to plan batch cook")?;

    if save {
        let id = save_to_recipe_book(db, &plan.recipe, &plan.ingredients)?;
        if !json {
            println!("📖 Saved to recipe book as #{}", id);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("\n🧾 Ingredients: {}", plan.ingredients.join(", "));
    print_match_source(&plan.comparison);
    println!("{}", format_results_text(&plan.comparison));
    println!("   Per serving: ${:.2}", plan.cost_per_serving);
    Ok(())
}
