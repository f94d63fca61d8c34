//! Helpers for multi-meal planning
//!
//! Weekly plans merge the ingredients of several meals into one master list.
//! Meal prep and batch cooking spread the cheapest basket total over days,
//! meals or servings.

use std::collections::HashSet;

use crate::aggregator::round_cents;

/// High-protein staples priced by gym meal prep
pub const GYM_PREP_STAPLES: [&str; 9] = [
    "chicken breast",
    "brown rice",
    "broccoli",
    "eggs",
    "oats",
    "protein powder",
    "sweet potato",
    "greek yogurt",
    "spinach",
];

/// Merge ingredient lists, keeping the first spelling of each ingredient
///
/// Entries are trimmed, blanks are dropped and duplicates are detected
/// ignoring case. Order is first appearance across all lists.
pub fn merge_ingredients<I>(lists: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for ingredient in lists.into_iter().flatten() {
        let ingredient = ingredient.trim();
        if ingredient.is_empty() {
            continue;
        }
        if seen.insert(ingredient.to_lowercase()) {
            merged.push(ingredient.to_string());
        }
    }
    merged
}

/// Share of `total` per portion, rounded to cents; None for zero portions
pub fn split_cost(total: f64, portions: u32) -> Option<f64> {
    if portions == 0 {
        return None;
    }
    Some(round_cents(total / f64::from(portions)))
}

/// The batch-cooking request sent to the meal expander
pub fn batch_description(recipe: &str, servings: u32) -> String {
    format!("{} for {} servings", recipe.trim(), servings)
}
