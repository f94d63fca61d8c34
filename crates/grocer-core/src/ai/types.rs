//! AI backend response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Serialize};

/// A deal read off a flyer image by a vision model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyerDeal {
    pub product_name: String,
    /// Advertised (sale) price
    pub sale_price: f64,
    #[serde(default)]
    pub regular_price: Option<f64>,
    /// "each", "per lb", "750g", ...
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
}

impl FlyerDeal {
    /// A deal is usable when it names a product and has a positive price
    pub fn is_valid(&self) -> bool {
        !self.product_name.trim().is_empty() && self.sale_price.is_finite() && self.sale_price > 0.0
    }
}
