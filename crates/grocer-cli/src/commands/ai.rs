//! AI backend diagnostics

use anyhow::Result;
use grocer_core::ai::{AIBackend, AIClient};

const SAMPLE_CATALOG: [&str; 5] = [
    "2% Milk 4L",
    "Large Eggs 12pk",
    "White Bread Loaf",
    "Bananas",
    "Lean Ground Beef",
];

/// Test the configured AI backend end to end
pub async fn cmd_ai_test(model: Option<&str>) -> Result<()> {
    println!("🔍 Testing AI backend...\n");

    let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());
    println!("  AI_BACKEND: {}", backend);
    for var in ["GEMINI_API_KEY", "OLLAMA_HOST", "OPENAI_COMPATIBLE_HOST"] {
        let state = if std::env::var(var).is_ok() {
            "set"
        } else {
            "not set"
        };
        println!("  {}: {}", var, state);
    }
    println!();

    let Some(client) = AIClient::from_env() else {
        println!("⚠️  No AI backend configured");
        println!("\nTo set one up:");
        println!("  1. Get a key from https://aistudio.google.com/apikey");
        println!("  2. Add GEMINI_API_KEY=<key> to .env");
        println!("  3. Or set AI_BACKEND=ollama with OLLAMA_HOST for a local model");
        println!("\nComparisons still work with keyword matching.");
        return Ok(());
    };
    let client = match model {
        Some(m) => client.with_model(m),
        None => client,
    };

    println!(
        "  Backend: {} ({} at {})\n",
        client.backend_name(),
        client.model(),
        client.host()
    );

    print!("Checking availability... ");
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!("\n⚠️  Could not reach {}", client.host());
        return Ok(());
    }

    println!("\n📋 Testing item matching...\n");
    let phrases: Vec<String> = ["milk", "eggs", "bread", "caviar"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let catalog: Vec<String> = SAMPLE_CATALOG.iter().map(|s| s.to_string()).collect();

    match client.match_products(&phrases, &catalog).await {
        Ok(resolutions) => {
            for r in resolutions {
                match r.product_name {
                    Some(name) => println!("  \"{}\" → {}", r.phrase, name),
                    None => println!("  \"{}\" → (no match)", r.phrase),
                }
            }
        }
        Err(e) => println!("  ❌ Error: {}", e),
    }

    println!("\n🍽️  Testing meal expansion...\n");
    match client.expand_meal("spaghetti dinner for 4").await {
        Ok(ingredients) => println!("  spaghetti dinner for 4 → {}", ingredients.join(", ")),
        Err(e) => println!("  ❌ Error: {}", e),
    }

    println!("\n✅ AI test complete");
    Ok(())
}
