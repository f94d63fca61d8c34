//! Recipe book operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewRecipe, Recipe};

/// Trimmed, non-blank ingredient lines
///
/// Ingredients are stored newline-separated, so embedded newlines split an
/// entry into several.
fn normalize_ingredients(ingredients: &[String]) -> Vec<String> {
    ingredients
        .iter()
        .flat_map(|i| i.lines())
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .map(String::from)
        .collect()
}

impl Database {
    /// Save a recipe, returning its ID
    pub fn save_recipe(&self, recipe: &NewRecipe) -> Result<i64> {
        let title = recipe.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("recipe title is empty".into()));
        }
        let ingredients = normalize_ingredients(&recipe.ingredients);
        if ingredients.is_empty() {
            return Err(Error::InvalidInput(format!(
                "recipe \"{}\" has no ingredients",
                title
            )));
        }
        let instructions = recipe
            .instructions
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty());

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO recipes (title, ingredients, instructions) VALUES (?, ?, ?)",
            params![title, ingredients.join("\n"), instructions],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// All saved recipes, newest first
    pub fn get_saved_recipes(&self) -> Result<Vec<Recipe>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, title, ingredients, instructions, created_at
            FROM recipes
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let recipes = stmt
            .query_map([], |row| Self::row_to_recipe(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        let conn = self.conn()?;
        let recipe = conn
            .query_row(
                "SELECT id, title, ingredients, instructions, created_at FROM recipes WHERE id = ?",
                params![id],
                |row| Self::row_to_recipe(row),
            )
            .optional()?;
        Ok(recipe)
    }

    /// Delete a recipe; returns false if it did not exist
    pub fn delete_recipe(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM recipes WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    fn row_to_recipe(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        let ingredients: String = row.get(2)?;
        let created_at_str: String = row.get(4)?;
        Ok(Recipe {
            id: row.get(0)?,
            title: row.get(1)?,
            ingredients: ingredients.lines().map(String::from).collect(),
            instructions: row.get(3)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
