//! Price aggregation over resolved line items
//!
//! Pure: takes resolutions and catalog rows, returns the comparison. Totals
//! are straight per-store column sums, so a store is not penalised for an
//! item it does not carry.

use crate::models::{
    ComparisonResult, ItemComparison, MatchSource, Product, Resolution, StoreTotals,
};

/// Build a comparison from ordered resolutions and the catalog they were resolved against
pub fn aggregate(
    resolutions: &[Resolution],
    products: &[Product],
    match_source: MatchSource,
) -> ComparisonResult {
    let mut items = Vec::new();
    let mut unmatched = Vec::new();
    let mut totals = StoreTotals::default();

    for resolution in resolutions {
        let product = resolution
            .product_name
            .as_deref()
            .and_then(|name| products.iter().find(|p| p.product_name == name));

        let Some(product) = product else {
            unmatched.push(resolution.phrase.clone());
            continue;
        };

        for (store, price) in product.prices.iter() {
            totals.add(store, price);
        }

        items.push(ItemComparison {
            user_input: resolution.phrase.clone(),
            matched_product: product.product_name.clone(),
            category: product.category.clone(),
            brand: product.brand.clone(),
            unit: product.unit.clone(),
            prices: product.prices,
            cheapest: product.prices.cheapest(),
        });
    }

    let cheapest = totals.min();
    let most_expensive = totals.max();

    ComparisonResult {
        items_matched: items.len(),
        items_total: resolutions.len(),
        items,
        unmatched,
        totals,
        cheapest_store: cheapest.store,
        cheapest_total: cheapest.price,
        most_expensive_store: most_expensive.store,
        most_expensive_total: most_expensive.price,
        potential_savings: round_cents(most_expensive.price - cheapest.price),
        match_source,
    }
}

pub(crate) fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FallbackReason, ProductSource, Store, StorePrices};

    fn product(name: &str, prices: StorePrices) -> Product {
        Product {
            id: 0,
            product_name: name.to_string(),
            category: "Test".to_string(),
            brand: None,
            unit: None,
            prices,
            source: ProductSource::Manual,
        }
    }

    fn fallback() -> MatchSource {
        MatchSource::Fallback {
            reason: FallbackReason::NotConfigured,
        }
    }

    #[test]
    fn test_totals_are_column_sums() {
        // Store Y does not carry B, so its total only includes A
        let products = vec![
            product(
                "A",
                StorePrices::new()
                    .with(Store::NoFrills, 2.0)
                    .with(Store::FoodBasics, 3.0),
            ),
            product("B", StorePrices::new().with(Store::NoFrills, 1.0)),
        ];
        let resolutions = vec![
            Resolution::new("a", Some("A".into())),
            Resolution::new("b", Some("B".into())),
        ];

        let result = aggregate(&resolutions, &products, fallback());
        assert_eq!(result.totals.get(Store::NoFrills), 3.0);
        assert_eq!(result.totals.get(Store::FoodBasics), 3.0);
        assert_eq!(result.totals.get(Store::Walmart), 0.0);
        assert_eq!(result.items_matched, 2);
    }

    #[test]
    fn test_item_cheapest_and_ties() {
        let products = vec![product(
            "Milk",
            StorePrices::new()
                .with(Store::Walmart, 4.5)
                .with(Store::FoodBasics, 4.5)
                .with(Store::Loblaws, 5.0),
        )];
        let result = aggregate(
            &[Resolution::new("milk", Some("Milk".into()))],
            &products,
            fallback(),
        );

        let cheapest = result.items[0].cheapest.unwrap();
        assert_eq!(cheapest.store, Store::FoodBasics);
        assert_eq!(cheapest.price, 4.5);
    }

    #[test]
    fn test_unknown_names_are_unmatched() {
        let products = vec![product("Bread", StorePrices::new().with(Store::Walmart, 2.5))];
        let resolutions = vec![
            Resolution::new("milk", Some("Milk That Does Not Exist".into())),
            Resolution::unmatched("caviar"),
            Resolution::new("bread", Some("Bread".into())),
        ];

        let result = aggregate(&resolutions, &products, fallback());
        assert_eq!(result.unmatched, vec!["milk", "caviar"]);
        assert_eq!(result.items_matched, 1);
        assert_eq!(result.items_total, 3);
        assert_eq!(
            result.items_matched + result.unmatched.len(),
            result.items_total
        );
    }

    #[test]
    fn test_item_without_prices_still_matched() {
        let products = vec![product("Saffron", StorePrices::new())];
        let result = aggregate(
            &[Resolution::new("saffron", Some("Saffron".into()))],
            &products,
            fallback(),
        );

        assert_eq!(result.items_matched, 1);
        assert!(result.items[0].cheapest.is_none());
        assert_eq!(result.potential_savings, 0.0);
    }

    #[test]
    fn test_no_matches_resolve_to_first_store() {
        let result = aggregate(&[Resolution::unmatched("milk")], &[], fallback());
        assert_eq!(result.cheapest_store, Store::NoFrills);
        assert_eq!(result.most_expensive_store, Store::NoFrills);
        assert_eq!(result.cheapest_total, 0.0);
        assert_eq!(result.potential_savings, 0.0);
        assert!(Store::ALL.iter().all(|&s| result.totals.get(s) == 0.0));
    }

    #[test]
    fn test_savings_rounded_to_cents() {
        let products = vec![
            product(
                "A",
                StorePrices::new()
                    .with(Store::NoFrills, 0.1)
                    .with(Store::Loblaws, 0.3),
            ),
            product(
                "B",
                StorePrices::new()
                    .with(Store::NoFrills, 0.2)
                    .with(Store::Loblaws, 0.333),
            ),
        ];
        let resolutions = vec![
            Resolution::new("a", Some("A".into())),
            Resolution::new("b", Some("B".into())),
        ];

        let result = aggregate(&resolutions, &products, fallback());
        // Walmart, FoodBasics and FreshCo total 0.0
        assert_eq!(result.cheapest_store, Store::FoodBasics);
        assert_eq!(result.most_expensive_store, Store::Loblaws);
        assert_eq!(result.potential_savings, 0.63);
        assert!(result.potential_savings >= 0.0);
    }

    #[test]
    fn test_duplicate_catalog_names_use_first_row() {
        let products = vec![
            product("Eggs", StorePrices::new().with(Store::Walmart, 3.0)),
            product("Eggs", StorePrices::new().with(Store::Walmart, 9.0)),
        ];
        let result = aggregate(
            &[Resolution::new("eggs", Some("Eggs".into()))],
            &products,
            fallback(),
        );
        assert_eq!(result.totals.get(Store::Walmart), 3.0);
    }
}
