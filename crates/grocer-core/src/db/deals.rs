//! Flyer deal operations

use rusqlite::{params, OptionalExtension};

use super::{parse_date, parse_datetime, Database};
use crate::error::Result;
use crate::models::{NewFlyerDeal, PromotionalDeal};

impl Database {
    /// Append a flyer deal, returning its ID
    pub fn add_flyer_deal(&self, deal: &NewFlyerDeal) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO flyer_deals (product_name, store, sale_price, regular_price, unit, brand,
                start_date, end_date, flyer_source, source_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                deal.product_name,
                deal.store,
                deal.sale_price,
                deal.regular_price,
                deal.unit,
                deal.brand,
                deal.start_date.map(|d| d.to_string()),
                deal.end_date.map(|d| d.to_string()),
                deal.flyer_source,
                deal.source_hash,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// All flyer deals, newest first
    pub fn get_flyer_deals(&self) -> Result<Vec<PromotionalDeal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, product_name, store, sale_price, regular_price, unit, brand,
                   start_date, end_date, flyer_source, source_hash, created_at
            FROM flyer_deals
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let deals = stmt
            .query_map([], |row| Self::row_to_deal(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(deals)
    }

    /// Whether deals from a flyer image with this content hash were already saved
    pub fn flyer_already_ingested(&self, source_hash: &str) -> Result<bool> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM flyer_deals WHERE source_hash = ? LIMIT 1",
                params![source_hash],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn row_to_deal(row: &rusqlite::Row) -> rusqlite::Result<PromotionalDeal> {
        let created_at_str: String = row.get(11)?;
        Ok(PromotionalDeal {
            id: row.get(0)?,
            product_name: row.get(1)?,
            store: row.get(2)?,
            sale_price: row.get(3)?,
            regular_price: row.get(4)?,
            unit: row.get(5)?,
            brand: row.get(6)?,
            start_date: parse_date(row.get(7)?),
            end_date: parse_date(row.get(8)?),
            flyer_source: row.get(9)?,
            source_hash: row.get(10)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
