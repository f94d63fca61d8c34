//! Flyer ingestion command

use std::path::Path;

use anyhow::{Context, Result};
use grocer_core::ai::FlyerDeal;
use grocer_core::db::Database;
use grocer_core::flyer::{content_hash, FlyerIngester, IngestOutcome};
use grocer_core::AIClient;

fn print_deals(deals: &[FlyerDeal]) {
    for deal in deals {
        let regular = deal
            .regular_price
            .map(|p| format!(" (reg ${:.2})", p))
            .unwrap_or_default();
        let unit = deal
            .unit
            .as_deref()
            .map(|u| format!(" {}", u))
            .unwrap_or_default();
        println!(
            "   {} ${:.2}{}{}",
            deal.product_name, deal.sale_price, unit, regular
        );
    }
}

pub async fn cmd_flyer(
    db: &Database,
    image: &Path,
    store: &str,
    dry_run: bool,
    ai: Option<AIClient>,
) -> Result<()> {
    let bytes = std::fs::read(image)
        .with_context(|| format!("Failed to read flyer image {}", image.display()))?;
    let flyer_source = image
        .file_name()
        .map(|name| name.to_string_lossy().to_string());

    let ingester = FlyerIngester::new(db, ai);
    println!("🔍 Reading {} flyer {}...", store, image.display());

    if dry_run {
        let deals = ingester
            .scan(&bytes, store)
            .await
            .context("Failed to scan flyer")?;
        println!("📋 Found {} deal(s) (dry run, nothing saved):", deals.len());
        print_deals(&deals);
        return Ok(());
    }

    match ingester
        .ingest(&bytes, store, flyer_source.as_deref())
        .await
        .context("Failed to ingest flyer")?
    {
        IngestOutcome::Duplicate { source_hash } => {
            println!(
                "⏭️  This flyer was already ingested (sha256 {}), nothing to do",
                &source_hash[..12]
            );
        }
        IngestOutcome::Ingested { deals, summary } => {
            print_deals(&deals);
            println!(
                "✅ Saved {}/{} deals to the database (image {})",
                summary.saved,
                summary.total(),
                &content_hash(&bytes)[..12]
            );
        }
    }

    Ok(())
}
