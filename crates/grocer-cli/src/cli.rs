//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Goose Grocer - Find the cheapest store for your grocery list
#[derive(Parser)]
#[command(name = "grocer")]
#[command(about = "Compare grocery prices across Canadian chains", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "grocer.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and load the built-in price table
    Init {
        /// Create the schema only, without seed prices
        #[arg(long)]
        no_seed: bool,
    },

    /// Replace the catalog with a seed price CSV
    Seed {
        /// CSV file (defaults to the built-in price table)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Compare the cost of a grocery list at every store
    Compare {
        /// Items to buy (comma-separated values are split)
        items: Vec<String>,

        /// Read items from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Expand a meal into ingredients and compare their cost
    Meal {
        /// Meal description, e.g. "tacos for 4 people"
        description: String,

        /// Save the meal and its ingredients to the recipe book
        #[arg(long)]
        save: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Plan several meals and price one combined shopping list
    Week {
        /// One meal per argument, e.g. "tacos" "spaghetti bolognese"
        meals: Vec<String>,

        /// Read meals from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cost out bulk meal prep
    Prep {
        #[command(subcommand)]
        action: PrepAction,
    },

    /// Manage the saved recipe book
    Recipes {
        #[command(subcommand)]
        action: Option<RecipesAction>,
    },

    /// List catalog products
    Products {
        /// Only show products whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List promotional deals ingested from flyers
    Deals {
        /// Only show deals for this store
        #[arg(short, long)]
        store: Option<String>,
    },

    /// Read deals from a flyer image and save them
    Flyer {
        /// Flyer image (JPEG, PNG, WebP)
        image: PathBuf,

        /// Store the flyer belongs to
        #[arg(short, long)]
        store: String,

        /// Print the extracted deals without saving them
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage AI prompts (list, show, customize)
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Check the configured AI backend
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., match_products)
        id: String,
    },

    /// Show the path to the prompts override directory
    Path,
}

#[derive(Subcommand)]
pub enum PrepAction {
    /// Price the high-protein staples and split the cost per day and meal
    Gym {
        /// Number of days to prep for
        #[arg(long, default_value = "5")]
        days: u32,

        /// Meals eaten per day
        #[arg(long, default_value = "3")]
        meals_per_day: u32,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scale a recipe to a number of servings and price it
    Batch {
        /// Recipe name, e.g. "vegetarian chili"
        recipe: String,

        /// Number of servings to cook
        #[arg(short, long, default_value = "8")]
        servings: u32,

        /// Save the recipe and its ingredients to the recipe book
        #[arg(long)]
        save: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum RecipesAction {
    /// List saved recipes
    List,

    /// Save a recipe by hand
    Save {
        /// Recipe title
        title: String,

        /// Ingredients (comma-separated values are split)
        #[arg(required = true)]
        ingredients: Vec<String>,

        /// Cooking instructions
        #[arg(short, long)]
        instructions: Option<String>,
    },

    /// Compare a saved recipe at today's prices
    Check {
        /// Recipe ID (from `grocer recipes list`)
        id: i64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a saved recipe
    Remove {
        /// Recipe ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Test the AI connection and run a sample match and meal expansion
    Test {
        /// Model to use instead of the configured one
        #[arg(long)]
        model: Option<String>,
    },
}
