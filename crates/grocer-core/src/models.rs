//! Domain models for Grocer

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Supported grocery chains, in the fixed comparison order
///
/// The order matters: every tie (cheapest store for an item, cheapest or most
/// expensive overall) resolves to the store that comes first here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Store {
    #[serde(rename = "No Frills")]
    NoFrills,
    #[serde(rename = "Food Basics")]
    FoodBasics,
    #[serde(rename = "Walmart")]
    Walmart,
    #[serde(rename = "FreshCo")]
    FreshCo,
    #[serde(rename = "Loblaws")]
    Loblaws,
}

impl Store {
    pub const COUNT: usize = 5;

    /// All stores in comparison order
    pub const ALL: [Store; Store::COUNT] = [
        Self::NoFrills,
        Self::FoodBasics,
        Self::Walmart,
        Self::FreshCo,
        Self::Loblaws,
    ];

    /// Stable key used in config and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFrills => "no_frills",
            Self::FoodBasics => "food_basics",
            Self::Walmart => "walmart",
            Self::FreshCo => "freshco",
            Self::Loblaws => "loblaws",
        }
    }

    /// Human-readable chain name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NoFrills => "No Frills",
            Self::FoodBasics => "Food Basics",
            Self::Walmart => "Walmart",
            Self::FreshCo => "FreshCo",
            Self::Loblaws => "Loblaws",
        }
    }

    /// Price column in the `products` table and the seed CSV
    pub fn price_column(&self) -> &'static str {
        match self {
            Self::NoFrills => "no_frills_price",
            Self::FoodBasics => "food_basics_price",
            Self::Walmart => "walmart_price",
            Self::FreshCo => "freshco_price",
            Self::Loblaws => "loblaws_price",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::NoFrills => 0,
            Self::FoodBasics => 1,
            Self::Walmart => 2,
            Self::FreshCo => 3,
            Self::Loblaws => 4,
        }
    }
}

impl std::str::FromStr for Store {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "nofrills" => Ok(Self::NoFrills),
            "foodbasics" => Ok(Self::FoodBasics),
            "walmart" => Ok(Self::Walmart),
            "freshco" => Ok(Self::FreshCo),
            "loblaws" => Ok(Self::Loblaws),
            _ => Err(format!("Unknown store: {}", s)),
        }
    }
}

impl std::fmt::Display for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One optional price per store
///
/// Serializes as a map of store name to price, omitting stores without a price.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StorePrices([Option<f64>; Store::COUNT]);

impl StorePrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, store: Store) -> Option<f64> {
        self.0[store.index()]
    }

    pub fn set(&mut self, store: Store, price: Option<f64>) {
        self.0[store.index()] = price;
    }

    /// Builder-style setter, handy in tests and seed code
    pub fn with(mut self, store: Store, price: f64) -> Self {
        self.set(store, Some(price));
        self
    }

    /// Present prices in store order
    pub fn iter(&self) -> impl Iterator<Item = (Store, f64)> + '_ {
        Store::ALL
            .iter()
            .filter_map(move |&store| self.get(store).map(|price| (store, price)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Lowest present price; ties go to the earlier store
    pub fn cheapest(&self) -> Option<StorePrice> {
        let mut best: Option<StorePrice> = None;
        for (store, price) in self.iter() {
            match best {
                Some(ref b) if price >= b.price => {}
                _ => best = Some(StorePrice { store, price }),
            }
        }
        best
    }
}

impl Serialize for StorePrices {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let present: Vec<(Store, f64)> = self.iter().collect();
        let mut map = serializer.serialize_map(Some(present.len()))?;
        for (store, price) in present {
            map.serialize_entry(store.display_name(), &price)?;
        }
        map.end()
    }
}

/// Basket total per store; every store always has a value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StoreTotals([f64; Store::COUNT]);

impl StoreTotals {
    pub fn get(&self, store: Store) -> f64 {
        self.0[store.index()]
    }

    pub fn add(&mut self, store: Store, amount: f64) {
        self.0[store.index()] += amount;
    }

    /// All totals in store order
    pub fn iter(&self) -> impl Iterator<Item = (Store, f64)> + '_ {
        Store::ALL.iter().map(move |&store| (store, self.get(store)))
    }

    /// Store with the lowest total; ties go to the earlier store
    pub fn min(&self) -> StorePrice {
        self.iter().fold(
            StorePrice {
                store: Store::ALL[0],
                price: self.get(Store::ALL[0]),
            },
            |best, (store, total)| {
                if total < best.price {
                    StorePrice {
                        store,
                        price: total,
                    }
                } else {
                    best
                }
            },
        )
    }

    /// Store with the highest total; ties go to the earlier store
    pub fn max(&self) -> StorePrice {
        self.iter().fold(
            StorePrice {
                store: Store::ALL[0],
                price: self.get(Store::ALL[0]),
            },
            |best, (store, total)| {
                if total > best.price {
                    StorePrice {
                        store,
                        price: total,
                    }
                } else {
                    best
                }
            },
        )
    }
}

impl Serialize for StoreTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Store::COUNT))?;
        for (store, total) in self.iter() {
            map.serialize_entry(store.display_name(), &total)?;
        }
        map.end()
    }
}

/// A price at a specific store
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorePrice {
    pub store: Store,
    pub price: f64,
}

/// Where a product row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductSource {
    /// Loaded from the seed price table
    Seed,
    /// Entered by hand
    #[default]
    Manual,
}

impl ProductSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Manual => "manual",
        }
    }
}

impl std::str::FromStr for ProductSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "seed" => Ok(Self::Seed),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("Unknown product source: {}", s)),
        }
    }
}

impl std::fmt::Display for ProductSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A canonical catalog product with its per-store prices
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    /// Join key between matcher output and the catalog
    pub product_name: String,
    pub category: String,
    pub brand: Option<String>,
    pub unit: Option<String>,
    pub prices: StorePrices,
    pub source: ProductSource,
}

/// A product to insert
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_name: String,
    pub category: String,
    pub brand: Option<String>,
    pub unit: Option<String>,
    pub prices: StorePrices,
    pub source: ProductSource,
}

/// A promotional price captured from a store flyer
#[derive(Debug, Clone, Serialize)]
pub struct PromotionalDeal {
    pub id: i64,
    pub product_name: String,
    /// Store name as supplied at ingestion time
    pub store: String,
    pub sale_price: f64,
    pub regular_price: Option<f64>,
    pub unit: Option<String>,
    pub brand: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// File name of the flyer image
    pub flyer_source: Option<String>,
    /// SHA-256 of the flyer image
    pub source_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A promotional deal to insert
#[derive(Debug, Clone, Default)]
pub struct NewFlyerDeal {
    pub product_name: String,
    pub store: String,
    pub sale_price: f64,
    pub regular_price: Option<f64>,
    pub unit: Option<String>,
    pub brand: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub flyer_source: Option<String>,
    pub source_hash: Option<String>,
}

/// A requested phrase and the catalog product name it resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub phrase: String,
    pub product_name: Option<String>,
}

impl Resolution {
    pub fn new(phrase: impl Into<String>, product_name: Option<String>) -> Self {
        Self {
            phrase: phrase.into(),
            product_name,
        }
    }

    pub fn unmatched(phrase: impl Into<String>) -> Self {
        Self::new(phrase, None)
    }
}

/// Why the keyword fallback ran instead of the remote matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No AI backend is configured
    NotConfigured,
    /// The catalog had no products, so nothing could match
    EmptyCatalog,
    /// The remote call failed or returned an unusable payload
    RemoteFailed(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "no AI backend configured"),
            Self::EmptyCatalog => write!(f, "catalog is empty"),
            Self::RemoteFailed(msg) => write!(f, "remote matching failed: {}", msg),
        }
    }
}

/// Provenance of a set of matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchSource {
    /// Resolved by the remote model
    Remote { model: String },
    /// Resolved by deterministic keyword matching
    Fallback { reason: FallbackReason },
}

impl MatchSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote { model } => write!(f, "AI ({})", model),
            Self::Fallback { reason } => write!(f, "keyword fallback ({})", reason),
        }
    }
}

/// A matched line item with its per-store prices
#[derive(Debug, Clone, Serialize)]
pub struct ItemComparison {
    /// The phrase as the user typed it (trimmed)
    pub user_input: String,
    pub matched_product: String,
    pub category: String,
    pub brand: Option<String>,
    pub unit: Option<String>,
    /// Present prices only
    pub prices: StorePrices,
    /// None when no store carries a price for the product
    pub cheapest: Option<StorePrice>,
}

/// Result of comparing a grocery list across stores
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    /// Matched items, in input order
    pub items: Vec<ItemComparison>,
    /// Phrases that did not resolve to a catalog product, in input order
    pub unmatched: Vec<String>,
    pub totals: StoreTotals,
    pub cheapest_store: Store,
    pub cheapest_total: f64,
    pub most_expensive_store: Store,
    pub most_expensive_total: f64,
    /// Most expensive total minus cheapest total, rounded to cents
    pub potential_savings: f64,
    pub items_matched: usize,
    pub items_total: usize,
    pub match_source: MatchSource,
}

/// A meal expanded into ingredients and priced
#[derive(Debug, Clone, Serialize)]
pub struct MealComparison {
    pub meal: String,
    pub ingredients: Vec<String>,
    pub comparison: ComparisonResult,
}

/// Several meals merged into one shopping list and priced
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyPlan {
    /// Non-blank meals, in input order
    pub meals: Vec<String>,
    /// Meals the model could not turn into ingredients
    pub unexpanded: Vec<String>,
    /// Master list: ingredients of every meal, duplicates removed
    pub ingredients: Vec<String>,
    pub comparison: ComparisonResult,
}

/// Cost of a fixed staples list spread over days and meals
#[derive(Debug, Clone, Serialize)]
pub struct PrepPlan {
    pub days: u32,
    pub meals_per_day: u32,
    pub items: Vec<String>,
    pub comparison: ComparisonResult,
    /// Cheapest total divided by days, rounded to cents
    pub cost_per_day: f64,
    /// Cheapest total divided by days × meals per day, rounded to cents
    pub cost_per_meal: f64,
}

/// A recipe scaled to a number of servings and priced
#[derive(Debug, Clone, Serialize)]
pub struct BatchPlan {
    pub recipe: String,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub comparison: ComparisonResult,
    /// Cheapest total divided by servings, rounded to cents
    pub cost_per_serving: f64,
}

/// A saved recipe from the recipe book
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recipe to save
#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_from_str_accepts_names_and_keys() {
        assert_eq!("No Frills".parse::<Store>().unwrap(), Store::NoFrills);
        assert_eq!("no_frills".parse::<Store>().unwrap(), Store::NoFrills);
        assert_eq!("FOOD BASICS".parse::<Store>().unwrap(), Store::FoodBasics);
        assert_eq!("freshco".parse::<Store>().unwrap(), Store::FreshCo);
        assert!("Costco".parse::<Store>().is_err());
    }

    #[test]
    fn test_store_columns_are_distinct() {
        let mut columns: Vec<_> = Store::ALL.iter().map(|s| s.price_column()).collect();
        columns.dedup();
        assert_eq!(columns.len(), Store::COUNT);
        assert_eq!(Store::FreshCo.price_column(), "freshco_price");
    }

    #[test]
    fn test_cheapest_prefers_earlier_store_on_tie() {
        let prices = StorePrices::new()
            .with(Store::Walmart, 2.0)
            .with(Store::FoodBasics, 2.0)
            .with(Store::Loblaws, 3.0);
        let cheapest = prices.cheapest().unwrap();
        assert_eq!(cheapest.store, Store::FoodBasics);
        assert_eq!(cheapest.price, 2.0);
    }

    #[test]
    fn test_cheapest_none_without_prices() {
        assert!(StorePrices::new().cheapest().is_none());
        assert!(StorePrices::new().is_empty());
    }

    #[test]
    fn test_totals_min_max_ties_go_first() {
        let totals = StoreTotals::default();
        assert_eq!(totals.min().store, Store::NoFrills);
        assert_eq!(totals.max().store, Store::NoFrills);

        let mut totals = StoreTotals::default();
        totals.add(Store::Walmart, 5.0);
        totals.add(Store::Loblaws, 5.0);
        assert_eq!(totals.max().store, Store::Walmart);
        assert_eq!(totals.min().store, Store::NoFrills);
    }

    #[test]
    fn test_store_prices_serialize_present_only() {
        let prices = StorePrices::new()
            .with(Store::NoFrills, 1.5)
            .with(Store::Loblaws, 2.25);
        let json = serde_json::to_value(prices).unwrap();
        assert_eq!(json["No Frills"], 1.5);
        assert_eq!(json["Loblaws"], 2.25);
        assert!(json.get("Walmart").is_none());
    }

    #[test]
    fn test_match_source_serialization() {
        let source = MatchSource::Fallback {
            reason: FallbackReason::RemoteFailed("timeout".into()),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["kind"], "fallback");
        assert_eq!(json["reason"]["reason"], "remote_failed");
        assert_eq!(json["reason"]["detail"], "timeout");
    }
}
