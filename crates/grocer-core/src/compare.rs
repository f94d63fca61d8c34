//! Comparison orchestrator
//!
//! Ties the catalog, matcher, expander and aggregator together. Holds no
//! state between calls: every comparison reads the catalog fresh.

use tracing::info;

use crate::aggregator::aggregate;
use crate::ai::AIClient;
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::expander::MealExpander;
use crate::matcher::TextMatcher;
use crate::models::{BatchPlan, ComparisonResult, MealComparison, PrepPlan, Recipe, WeeklyPlan};
use crate::plan::{batch_description, merge_ingredients, split_cost, GYM_PREP_STAPLES};

/// Compares grocery lists across stores
pub struct PriceComparer<C: Catalog> {
    catalog: C,
    matcher: TextMatcher,
    expander: MealExpander,
}

impl<C: Catalog> PriceComparer<C> {
    /// Create a comparer; with `ai` set to None only keyword matching is used
    pub fn new(catalog: C, ai: Option<AIClient>) -> Self {
        Self {
            catalog,
            matcher: TextMatcher::new(ai.clone()),
            expander: MealExpander::new(ai),
        }
    }

    /// Create a comparer with the AI backend selected by environment variables
    pub fn from_env(catalog: C) -> Self {
        Self::new(catalog, AIClient::from_env())
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Whether a remote AI backend is configured
    pub fn has_ai(&self) -> bool {
        self.matcher.ai().is_some()
    }

    /// Compare the cost of a grocery list at every store
    ///
    /// Phrases are trimmed and blank ones dropped; a list with nothing left is
    /// rejected. Matching failures degrade to the keyword fallback and never
    /// surface here; catalog read errors do.
    pub async fn compare(&self, phrases: &[String]) -> Result<ComparisonResult> {
        let phrases: Vec<String> = phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();

        if phrases.is_empty() {
            return Err(Error::InvalidInput("grocery list is empty".into()));
        }

        let products = self.catalog.fetch_all_products()?;
        let catalog_names: Vec<String> = products.iter().map(|p| p.product_name.clone()).collect();

        let outcome = self.matcher.resolve(&phrases, &catalog_names).await;
        let result = aggregate(&outcome.resolutions, &products, outcome.source);

        info!(
            matched = result.items_matched,
            total = result.items_total,
            cheapest = %result.cheapest_store,
            source = %result.match_source,
            "Compared grocery list"
        );
        Ok(result)
    }

    /// Ingredient phrases for a meal (empty if it could not be expanded)
    pub async fn expand_meal(&self, description: &str) -> Vec<String> {
        self.expander.expand(description).await
    }

    /// Expand a meal into ingredients, then compare them
    pub async fn compare_meal(&self, description: &str) -> Result<MealComparison> {
        let ingredients = self.expand_meal(description).await;
        if ingredients.is_empty() {
            return Err(Error::InvalidInput(format!(
                "could not interpret meal \"{}\"",
                description.trim()
            )));
        }

        let comparison = self.compare(&ingredients).await?;
        Ok(MealComparison {
            meal: description.trim().to_string(),
            ingredients,
            comparison,
        })
    }

    /// Expand several meals and price their combined shopping list
    ///
    /// Ingredients shared between meals are listed once. Meals that cannot
    /// be expanded are reported in `unexpanded`; the plan fails only when
    /// none of them can.
    pub async fn compare_meals(&self, meals: &[String]) -> Result<WeeklyPlan> {
        let meals: Vec<String> = meals
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();
        if meals.is_empty() {
            return Err(Error::InvalidInput("no meals to plan".into()));
        }

        let mut lists = Vec::with_capacity(meals.len());
        let mut unexpanded = Vec::new();
        for meal in &meals {
            let ingredients = self.expand_meal(meal).await;
            if ingredients.is_empty() {
                unexpanded.push(meal.clone());
            }
            lists.push(ingredients);
        }

        let ingredients = merge_ingredients(lists);
        if ingredients.is_empty() {
            return Err(Error::InvalidInput(
                "could not interpret any of the meals".into(),
            ));
        }

        let comparison = self.compare(&ingredients).await?;
        info!(
            meals = meals.len(),
            unexpanded = unexpanded.len(),
            ingredients = ingredients.len(),
            "Planned meals"
        );
        Ok(WeeklyPlan {
            meals,
            unexpanded,
            ingredients,
            comparison,
        })
    }

    /// Price the gym staples and spread the cheapest total over the plan
    pub async fn gym_prep(&self, days: u32, meals_per_day: u32) -> Result<PrepPlan> {
        if days == 0 || meals_per_day == 0 {
            return Err(Error::InvalidInput(
                "days and meals per day must be at least 1".into(),
            ));
        }
        let total_meals = days
            .checked_mul(meals_per_day)
            .ok_or_else(|| Error::InvalidInput("too many meals to plan".into()))?;

        let items: Vec<String> = GYM_PREP_STAPLES.iter().map(|s| s.to_string()).collect();
        let comparison = self.compare(&items).await?;
        let total = comparison.cheapest_total;

        Ok(PrepPlan {
            days,
            meals_per_day,
            items,
            cost_per_day: split_cost(total, days).unwrap_or_default(),
            cost_per_meal: split_cost(total, total_meals).unwrap_or_default(),
            comparison,
        })
    }

    /// Expand a recipe scaled to `servings` and price it
    pub async fn batch_cook(&self, recipe: &str, servings: u32) -> Result<BatchPlan> {
        let recipe = recipe.trim();
        if recipe.is_empty() {
            return Err(Error::InvalidInput("recipe name is empty".into()));
        }
        if servings == 0 {
            return Err(Error::InvalidInput("servings must be at least 1".into()));
        }

        let ingredients = self
            .expand_meal(&batch_description(recipe, servings))
            .await;
        if ingredients.is_empty() {
            return Err(Error::InvalidInput(format!(
                "could not interpret recipe \"{}\"",
                recipe
            )));
        }

        let comparison = self.compare(&ingredients).await?;
        Ok(BatchPlan {
            recipe: recipe.to_string(),
            servings,
            ingredients,
            cost_per_serving: split_cost(comparison.cheapest_total, servings).unwrap_or_default(),
            comparison,
        })
    }

    /// Price a saved recipe's ingredients at today's catalog prices
    pub async fn check_recipe(&self, recipe: &Recipe) -> Result<ComparisonResult> {
        self.compare(&recipe.ingredients).await
    }
}
