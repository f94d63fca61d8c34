//! Catalog listing commands (products, deals)

use anyhow::Result;
use grocer_core::db::Database;
use grocer_core::models::Store;

use super::truncate;

pub fn cmd_products(db: &Database, search: Option<&str>) -> Result<()> {
    let products = match search {
        Some(query) => db.search_products(query)?,
        None => db.fetch_all_products()?,
    };

    if products.is_empty() {
        match search {
            Some(query) => println!("No products matching \"{}\".", query),
            None => println!("No products yet. Run: grocer init"),
        }
        return Ok(());
    }

    print!("{:<36} {:<10}", "PRODUCT", "CATEGORY");
    for store in Store::ALL {
        print!(" {:>11}", store.display_name());
    }
    println!();
    println!("{}", "-".repeat(47 + 12 * Store::COUNT));

    for product in &products {
        print!(
            "{:<36} {:<10}",
            truncate(&product.product_name, 36),
            truncate(&product.category, 10)
        );
        for store in Store::ALL {
            match product.prices.get(store) {
                Some(price) => print!(" {:>11}", format!("${:.2}", price)),
                None => print!(" {:>11}", "-"),
            }
        }
        println!();
    }

    println!("\n{} product(s)", products.len());
    Ok(())
}

pub fn cmd_deals(db: &Database, store: Option<&str>) -> Result<()> {
    let wanted = store.map(grocer_core::flyer::normalize_store);
    let deals: Vec<_> = db
        .get_flyer_deals()?
        .into_iter()
        .filter(|d| {
            wanted
                .as_deref()
                .map_or(true, |w| d.store.eq_ignore_ascii_case(w))
        })
        .collect();

    if deals.is_empty() {
        println!("No flyer deals yet. Run: grocer flyer <image> --store <store>");
        return Ok(());
    }

    println!(
        "{:<40} {:<12} {:>8} {:>8}  {:<10}",
        "PRODUCT", "STORE", "SALE", "REG", "UNIT"
    );
    println!("{}", "-".repeat(84));

    for deal in &deals {
        let regular = deal
            .regular_price
            .map(|p| format!("${:.2}", p))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<40} {:<12} {:>8} {:>8}  {:<10}",
            truncate(&deal.product_name, 40),
            truncate(&deal.store, 12),
            format!("${:.2}", deal.sale_price),
            regular,
            deal.unit.as_deref().unwrap_or("-")
        );
    }

    println!("\n{} deal(s)", deals.len());
    Ok(())
}
