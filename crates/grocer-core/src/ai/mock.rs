//! Mock backend for testing
//!
//! Provides predictable responses for all AI operations. Raw replies can be
//! scripted per operation; they go through the same decoding as real model
//! output, so malformed-response handling can be exercised without a server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Resolution;

use super::parsing::{parse_flyer_deals, parse_ingredients, parse_product_matches};
use super::render::unique_phrases;
use super::types::FlyerDeal;
use super::AIBackend;

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Every generation call fails as if the service were unreachable
    failing: bool,
    match_reply: Option<String>,
    meal_reply: Option<String>,
    flyer_reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self::default()
    }

    /// Create a mock whose generation calls all fail
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Return this raw text for product matching
    pub fn with_match_reply(mut self, raw: impl Into<String>) -> Self {
        self.match_reply = Some(raw.into());
        self
    }

    /// Return this raw text for meal expansion
    pub fn with_meal_reply(mut self, raw: impl Into<String>) -> Self {
        self.meal_reply = Some(raw.into());
        self
    }

    /// Return this raw text for flyer parsing
    pub fn with_flyer_reply(mut self, raw: impl Into<String>) -> Self {
        self.flyer_reply = Some(raw.into());
        self
    }

    /// Create a new instance with a different model (no-op for mock)
    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }

    /// Number of generation calls made (shared between clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::InvalidData("Mock AI backend is failing".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn match_products(
        &self,
        phrases: &[String],
        catalog_names: &[String],
    ) -> Result<Vec<Resolution>> {
        self.begin_call()?;
        if let Some(ref raw) = self.match_reply {
            return parse_product_matches(raw, phrases);
        }

        // First catalog name containing the phrase, ignoring case
        let resolved: Vec<(&str, Option<&String>)> = unique_phrases(phrases)
            .into_iter()
            .map(|phrase| {
                let needle = phrase.to_lowercase();
                let found = catalog_names
                    .iter()
                    .find(|name| name.to_lowercase().contains(&needle));
                (phrase, found)
            })
            .collect();

        Ok(phrases
            .iter()
            .map(|phrase| {
                let name = resolved
                    .iter()
                    .find(|(p, _)| *p == phrase.as_str())
                    .and_then(|(_, name)| name.cloned());
                Resolution::new(phrase.clone(), name)
            })
            .collect())
    }

    async fn expand_meal(&self, _description: &str) -> Result<Vec<String>> {
        self.begin_call()?;
        if let Some(ref raw) = self.meal_reply {
            return parse_ingredients(raw);
        }

        Ok(vec![
            "ground beef".to_string(),
            "taco shells".to_string(),
            "cheddar cheese".to_string(),
            "lettuce".to_string(),
            "tomatoes".to_string(),
        ])
    }

    async fn parse_flyer(&self, _image_data: &[u8], _store: &str) -> Result<Vec<FlyerDeal>> {
        self.begin_call()?;
        if let Some(ref raw) = self.flyer_reply {
            return parse_flyer_deals(raw);
        }

        Ok(vec![
            FlyerDeal {
                product_name: "Chicken Breast Boneless Skinless".to_string(),
                sale_price: 4.98,
                regular_price: Some(6.99),
                unit: Some("per lb".to_string()),
                brand: None,
            },
            FlyerDeal {
                product_name: "Large Eggs 12pk".to_string(),
                sale_price: 3.49,
                regular_price: Some(4.29),
                unit: Some("each".to_string()),
                brand: Some("Burnbrae".to_string()),
            },
        ])
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_mock_match_products_by_substring() {
        let mock = MockBackend::new();
        let catalog = strings(&["2% Milk 4L", "Large Eggs 12pk"]);
        let result = mock
            .match_products(&strings(&["eggs", "caviar", "eggs"]), &catalog)
            .await
            .unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].product_name.as_deref(), Some("Large Eggs 12pk"));
        assert_eq!(result[1].product_name, None);
        assert_eq!(result[2].product_name.as_deref(), Some("Large Eggs 12pk"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_scripted_reply_is_decoded() {
        let mock = MockBackend::new().with_match_reply("not json at all");
        let result = mock
            .match_products(&strings(&["milk"]), &strings(&["2% Milk 4L"]))
            .await;
        assert!(result.is_err());

        let mock = MockBackend::new().with_meal_reply("```json\n[\"pasta\", \"sauce\"]\n```");
        assert_eq!(
            mock.expand_meal("spaghetti").await.unwrap(),
            vec!["pasta", "sauce"]
        );
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let mock = MockBackend::failing();
        assert!(mock.expand_meal("tacos").await.is_err());
        assert!(mock.parse_flyer(b"img", "Walmart").await.is_err());
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        assert!(MockBackend::new().health_check().await);
        assert!(!MockBackend::unhealthy().health_check().await);
    }
}
