//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_seed` - Reload the catalog from a seed CSV

use std::path::Path;

use anyhow::{Context, Result};
use grocer_core::db::Database;

/// Open (or create) the database at `db_path`
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path, no_seed: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;

    if no_seed {
        println!("   Skipped seed prices (--no-seed)");
    } else {
        let count = db
            .seed_default_catalog()
            .context("Failed to load seed prices")?;
        println!("   Loaded {} products from the built-in price table", count);
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Compare a list: grocer compare milk eggs bread");
    println!("  2. Plan a meal: grocer meal \"tacos for 4 people\"");
    println!("  3. Set GEMINI_API_KEY in .env for smarter matching");

    Ok(())
}

/// Replace the catalog with a seed CSV (or the built-in table)
pub fn cmd_seed(db: &Database, file: Option<&Path>) -> Result<()> {
    let count = match file {
        Some(path) => {
            println!("📥 Loading prices from {}...", path.display());
            db.load_seed_file(path)
                .with_context(|| format!("Failed to load seed file {}", path.display()))?
        }
        None => {
            println!("📥 Loading the built-in price table...");
            db.seed_default_catalog()
                .context("Failed to load seed prices")?
        }
    };

    println!("✅ Loaded {} products into the database!", count);
    Ok(())
}
