//! Catalog product operations

use std::io::Read;
use std::path::Path;

use rusqlite::params;
use serde::Deserialize;
use tracing::info;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{NewProduct, Product, ProductSource, Store, StorePrices};

/// Seed price table shipped with the binary
pub const SEED_CSV: &str = include_str!("../../../../data/seed_prices.csv");

const PRODUCT_COLUMNS: &str = "id, product_name, category, brand, unit, no_frills_price, \
     food_basics_price, walmart_price, freshco_price, loblaws_price, source";

/// One row of the seed CSV
#[derive(Debug, Deserialize)]
struct SeedRow {
    product_name: String,
    category: String,
    brand: Option<String>,
    unit: Option<String>,
    no_frills_price: Option<f64>,
    food_basics_price: Option<f64>,
    walmart_price: Option<f64>,
    freshco_price: Option<f64>,
    loblaws_price: Option<f64>,
}

impl SeedRow {
    fn into_new_product(self, line: usize) -> Result<NewProduct> {
        let name = self.product_name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData(format!(
                "Seed row {} has no product name",
                line
            )));
        }

        let mut prices = StorePrices::new();
        for (store, price) in [
            (Store::NoFrills, self.no_frills_price),
            (Store::FoodBasics, self.food_basics_price),
            (Store::Walmart, self.walmart_price),
            (Store::FreshCo, self.freshco_price),
            (Store::Loblaws, self.loblaws_price),
        ] {
            if let Some(p) = price {
                if !p.is_finite() || p < 0.0 {
                    return Err(Error::InvalidData(format!(
                        "Seed row {} has invalid {} price {}",
                        line,
                        store.display_name(),
                        p
                    )));
                }
            }
            prices.set(store, price);
        }

        Ok(NewProduct {
            product_name: name.to_string(),
            category: self.category.trim().to_string(),
            brand: non_blank(self.brand),
            unit: non_blank(self.unit),
            prices,
            source: ProductSource::Seed,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Database {
    /// All products in insertion order
    pub fn fetch_all_products(&self) -> Result<Vec<Product>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM products ORDER BY id",
            PRODUCT_COLUMNS
        ))?;

        let products = stmt
            .query_map([], |row| Self::row_to_product(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(products)
    }

    /// Products whose name contains `query` (case-insensitive for ASCII)
    pub fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        let conn = self.conn()?;
        let pattern = format!("%{}%", escape_like(query.trim()));
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM products WHERE product_name LIKE ? ESCAPE '\\' ORDER BY id",
            PRODUCT_COLUMNS
        ))?;

        let products = stmt
            .query_map(params![pattern], |row| Self::row_to_product(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(products)
    }

    /// Insert a product, returning its ID
    pub fn insert_product(&self, product: &NewProduct) -> Result<i64> {
        let conn = self.conn()?;
        insert_product_row(&conn, product)?;
        Ok(conn.last_insert_rowid())
    }

    /// Number of products in the catalog
    pub fn product_count(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Replace the catalog with the rows of a seed CSV
    ///
    /// Runs in one transaction: a malformed row leaves the existing catalog
    /// untouched. Returns the number of products loaded.
    pub fn load_seed_csv<R: Read>(&self, reader: R) -> Result<usize> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut products = Vec::new();
        for (i, row) in csv_reader.deserialize::<SeedRow>().enumerate() {
            // Line 1 is the header
            products.push(row?.into_new_product(i + 2)?);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM products", [])?;
        for product in &products {
            insert_product_row(&tx, product)?;
        }
        tx.commit()?;

        info!(count = products.len(), "Loaded seed catalog");
        Ok(products.len())
    }

    /// Replace the catalog with a seed CSV file on disk
    pub fn load_seed_file(&self, path: &Path) -> Result<usize> {
        let file = std::fs::File::open(path)?;
        self.load_seed_csv(file)
    }

    /// Replace the catalog with the built-in seed table
    pub fn seed_default_catalog(&self) -> Result<usize> {
        self.load_seed_csv(SEED_CSV.as_bytes())
    }

    pub(crate) fn row_to_product(row: &rusqlite::Row) -> rusqlite::Result<Product> {
        let mut prices = StorePrices::new();
        for (offset, store) in Store::ALL.iter().enumerate() {
            prices.set(*store, row.get(5 + offset)?);
        }

        let source_str: String = row.get(10)?;
        Ok(Product {
            id: row.get(0)?,
            product_name: row.get(1)?,
            category: row.get(2)?,
            brand: row.get(3)?,
            unit: row.get(4)?,
            prices,
            source: source_str.parse().unwrap_or_default(),
        })
    }
}

fn insert_product_row(conn: &rusqlite::Connection, product: &NewProduct) -> Result<()> {
    let p = &product.prices;
    conn.execute(
        r#"
        INSERT INTO products (product_name, category, brand, unit, no_frills_price,
            food_basics_price, walmart_price, freshco_price, loblaws_price, source)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            product.product_name,
            product.category,
            product.brand,
            product.unit,
            p.get(Store::NoFrills),
            p.get(Store::FoodBasics),
            p.get(Store::Walmart),
            p.get(Store::FreshCo),
            p.get(Store::Loblaws),
            product.source.as_str(),
        ],
    )?;
    Ok(())
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
