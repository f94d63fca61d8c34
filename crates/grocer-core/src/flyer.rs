//! Flyer ingestion: image → vision model → promotional deals
//!
//! Images are identified by the SHA-256 of their bytes. An image whose hash
//! is already recorded is reported as a duplicate before any model call.

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::ai::{AIBackend, AIClient, FlyerDeal};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{NewFlyerDeal, Store};

/// Counts from saving a batch of deals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub saved: usize,
    pub skipped: usize,
}

impl SaveSummary {
    pub fn total(&self) -> usize {
        self.saved + self.skipped
    }
}

/// Result of ingesting one flyer image
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// Deals from an image with the same content were saved before
    Duplicate { source_hash: String },
    /// The image was scanned and its deals saved
    Ingested {
        deals: Vec<FlyerDeal>,
        summary: SaveSummary,
    },
}

/// SHA-256 of an image, hex encoded
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Canonical store name for a flyer: the display name for a known chain,
/// otherwise the trimmed input
pub fn normalize_store(store: &str) -> String {
    store
        .parse::<Store>()
        .map(|s| s.display_name().to_string())
        .unwrap_or_else(|_| store.trim().to_string())
}

/// Reads flyer images and records their deals
pub struct FlyerIngester<'a> {
    db: &'a Database,
    ai: Option<AIClient>,
}

impl<'a> FlyerIngester<'a> {
    pub fn new(db: &'a Database, ai: Option<AIClient>) -> Self {
        Self { db, ai }
    }

    /// Extract deals from a flyer image without saving them
    pub async fn scan(&self, image: &[u8], store: &str) -> Result<Vec<FlyerDeal>> {
        let Some(ai) = self.ai.as_ref() else {
            return Err(Error::NotConfigured(
                "flyer scanning needs an AI backend (set GEMINI_API_KEY or AI_BACKEND)".into(),
            ));
        };
        if image.is_empty() {
            return Err(Error::InvalidInput("flyer image is empty".into()));
        }

        let deals = ai.parse_flyer(image, &normalize_store(store)).await?;
        info!(store, count = deals.len(), model = ai.model(), "Scanned flyer");
        Ok(deals)
    }

    /// Save extracted deals; unusable deals are skipped and counted
    pub fn save(
        &self,
        deals: &[FlyerDeal],
        store: &str,
        flyer_source: Option<&str>,
        source_hash: Option<&str>,
    ) -> Result<SaveSummary> {
        let store = normalize_store(store);
        let mut summary = SaveSummary::default();

        for deal in deals {
            if !deal.is_valid() {
                warn!(product = %deal.product_name, "Skipping invalid flyer deal");
                summary.skipped += 1;
                continue;
            }

            self.db.add_flyer_deal(&NewFlyerDeal {
                product_name: deal.product_name.trim().to_string(),
                store: store.clone(),
                sale_price: deal.sale_price,
                regular_price: deal.regular_price,
                unit: deal.unit.clone(),
                brand: deal.brand.clone(),
                flyer_source: flyer_source.map(String::from),
                source_hash: source_hash.map(String::from),
                ..Default::default()
            })?;
            summary.saved += 1;
        }

        info!(
            store = %store,
            saved = summary.saved,
            total = summary.total(),
            "Saved flyer deals"
        );
        Ok(summary)
    }

    /// Scan and save a flyer image unless the same image was ingested before
    pub async fn ingest(
        &self,
        image: &[u8],
        store: &str,
        flyer_source: Option<&str>,
    ) -> Result<IngestOutcome> {
        let source_hash = content_hash(image);
        if self.db.flyer_already_ingested(&source_hash)? {
            info!(hash = %source_hash, "Flyer already ingested, skipping");
            return Ok(IngestOutcome::Duplicate { source_hash });
        }

        let deals = self.scan(image, store).await?;
        let summary = self.save(&deals, store, flyer_source, Some(&source_hash))?;
        Ok(IngestOutcome::Ingested { deals, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_normalize_store() {
        assert_eq!(normalize_store("nofrills"), "No Frills");
        assert_eq!(normalize_store("food_basics"), "Food Basics");
        assert_eq!(normalize_store(" Costco "), "Costco");
    }

    #[tokio::test]
    async fn test_scan_without_ai() {
        let db = Database::in_memory().unwrap();
        let ingester = FlyerIngester::new(&db, None);
        assert!(matches!(
            ingester.scan(b"image", "Walmart").await,
            Err(Error::NotConfigured(_))
        ));
    }

    #[test]
    fn test_save_skips_invalid() {
        let db = Database::in_memory().unwrap();
        let ingester = FlyerIngester::new(&db, None);
        let deals = vec![
            FlyerDeal {
                product_name: "Bananas".to_string(),
                sale_price: 0.59,
                regular_price: None,
                unit: Some("per lb".to_string()),
                brand: None,
            },
            FlyerDeal {
                product_name: "Free Gift".to_string(),
                sale_price: 0.0,
                regular_price: None,
                unit: None,
                brand: None,
            },
        ];

        let summary = ingester
            .save(&deals, "freshco", Some("flyer.png"), None)
            .unwrap();
        assert_eq!(summary, SaveSummary { saved: 1, skipped: 1 });

        let stored = db.get_flyer_deals().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].store, "FreshCo");
        assert_eq!(stored[0].flyer_source.as_deref(), Some("flyer.png"));
    }

    #[tokio::test]
    async fn test_ingest_detects_duplicate_before_ai_call() {
        let db = Database::in_memory().unwrap();
        let mock = MockBackend::new();
        let ingester = FlyerIngester::new(&db, Some(AIClient::Mock(mock.clone())));

        let first = ingester
            .ingest(b"flyer-bytes", "Loblaws", Some("week42.jpg"))
            .await
            .unwrap();
        match first {
            IngestOutcome::Ingested { summary, .. } => assert_eq!(summary.saved, 2),
            other => panic!("expected ingested, got {:?}", other),
        }

        let second = ingester
            .ingest(b"flyer-bytes", "Loblaws", Some("week42-copy.jpg"))
            .await
            .unwrap();
        assert!(matches!(second, IngestOutcome::Duplicate { .. }));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(db.get_flyer_deals().unwrap().len(), 2);
    }
}
