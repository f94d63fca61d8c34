//! Grocer CLI - Grocery price comparison
//!
//! Usage:
//!   grocer init                          Create the database and load seed prices
//!   grocer compare milk eggs bread       Find the cheapest store for a list
//!   grocer meal "tacos for 4 people"     Price the ingredients of a meal
//!   grocer week tacos "beef stew"        Price a combined list for several meals
//!   grocer prep gym --days 5             Cost out a week of meal prep
//!   grocer flyer week42.jpg --store X    Save deals read off a flyer

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use grocer_core::AIClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    // API keys usually live in .env next to the database
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init { no_seed } => commands::cmd_init(&cli.db, no_seed),
        Commands::Seed { file } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_seed(&db, file.as_deref())
        }
        Commands::Compare { items, file, json } => {
            let db = commands::open_db(&cli.db)?;
            let items = commands::collect_items(&items, file.as_deref())?;
            commands::cmd_compare(&db, &items, AIClient::from_env(), json).await
        }
        Commands::Meal {
            description,
            save,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_meal(&db, &description, AIClient::from_env(), save, json).await
        }
        Commands::Week { meals, file, json } => {
            let db = commands::open_db(&cli.db)?;
            let meals = commands::collect_meals(&meals, file.as_deref())?;
            commands::cmd_week(&db, &meals, AIClient::from_env(), json).await
        }
        Commands::Prep { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                PrepAction::Gym {
                    days,
                    meals_per_day,
                    json,
                } => {
                    commands::cmd_prep_gym(&db, days, meals_per_day, AIClient::from_env(), json)
                        .await
                }
                PrepAction::Batch {
                    recipe,
                    servings,
                    save,
                    json,
                } => {
                    commands::cmd_prep_batch(
                        &db,
                        &recipe,
                        servings,
                        AIClient::from_env(),
                        save,
                        json,
                    )
                    .await
                }
            }
        }
        Commands::Recipes { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(RecipesAction::List) => commands::cmd_recipes_list(&db),
                Some(RecipesAction::Save {
                    title,
                    ingredients,
                    instructions,
                }) => commands::cmd_recipes_save(&db, &title, &ingredients, instructions.as_deref()),
                Some(RecipesAction::Check { id, json }) => {
                    commands::cmd_recipes_check(&db, id, AIClient::from_env(), json).await
                }
                Some(RecipesAction::Remove { id }) => commands::cmd_recipes_remove(&db, id),
            }
        }
        Commands::Products { search } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_products(&db, search.as_deref())
        }
        Commands::Deals { store } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_deals(&db, store.as_deref())
        }
        Commands::Flyer {
            image,
            store,
            dry_run,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_flyer(&db, &image, &store, dry_run, AIClient::from_env()).await
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { id }) => commands::cmd_prompts_show(&id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Ai { action } => match action {
            AiAction::Test { model } => commands::cmd_ai_test(model.as_deref()).await,
        },
    }
}
