//! Plain-text rendering of comparison results

use std::fmt::Write;

use crate::models::{ComparisonResult, Store};

const WIDTH: usize = 60;

/// Render a comparison as a terminal report
pub fn format_results_text(result: &ComparisonResult) -> String {
    let heavy = "=".repeat(WIDTH);
    let light = "─".repeat(WIDTH);
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "\n{}", heavy);
    let _ = writeln!(out, "  🛒 GROCERY PRICE COMPARISON");
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(
        out,
        "\n📋 Matched {}/{} items:\n",
        result.items_matched, result.items_total
    );

    for item in &result.items {
        let _ = writeln!(out, "  {} → {}", item.user_input, item.matched_product);

        let mut prices: Vec<(Store, f64)> = item.prices.iter().collect();
        prices.sort_by(|a, b| a.1.total_cmp(&b.1));
        let cheapest = item.cheapest.map(|c| c.store);
        for (store, price) in prices {
            let marker = if Some(store) == cheapest { " ✅" } else { "" };
            let _ = writeln!(out, "    {:15}  ${:.2}{}", store.display_name(), price, marker);
        }
        let _ = writeln!(out);
    }

    if !result.unmatched.is_empty() {
        let _ = writeln!(
            out,
            "  ⚠️  Could not find: {}\n",
            result.unmatched.join(", ")
        );
    }

    let _ = writeln!(out, "{}", light);
    let _ = writeln!(out, "  💰 STORE TOTALS:\n");

    let mut totals: Vec<(Store, f64)> = result.totals.iter().collect();
    totals.sort_by(|a, b| a.1.total_cmp(&b.1));
    for (store, total) in totals {
        let marker = if store == result.cheapest_store {
            " ← CHEAPEST! 🏆"
        } else {
            ""
        };
        let _ = writeln!(out, "    {:15}  ${:.2}{}", store.display_name(), total, marker);
    }

    let _ = writeln!(
        out,
        "\n  💵 You save ${:.2} shopping at {} vs {}!",
        result.potential_savings, result.cheapest_store, result.most_expensive_store
    );
    let _ = write!(out, "{}", heavy);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::models::{
        FallbackReason, MatchSource, Product, ProductSource, Resolution, StorePrices,
    };

    fn sample() -> ComparisonResult {
        let products = vec![Product {
            id: 1,
            product_name: "2% Milk 4L".to_string(),
            category: "Dairy".to_string(),
            brand: None,
            unit: Some("4L".to_string()),
            prices: StorePrices::new()
                .with(Store::Walmart, 5.27)
                .with(Store::NoFrills, 5.49),
            source: ProductSource::Seed,
        }];
        aggregate(
            &[
                Resolution::new("milk", Some("2% Milk 4L".into())),
                Resolution::unmatched("caviar"),
            ],
            &products,
            MatchSource::Fallback {
                reason: FallbackReason::NotConfigured,
            },
        )
    }

    #[test]
    fn test_report_sections() {
        let text = format_results_text(&sample());

        assert!(text.contains("🛒 GROCERY PRICE COMPARISON"));
        assert!(text.contains("📋 Matched 1/2 items:"));
        assert!(text.contains("  milk → 2% Milk 4L"));
        assert!(text.contains("    Walmart          $5.27 ✅"));
        assert!(text.contains("    No Frills        $5.49\n"));
        assert!(text.contains("⚠️  Could not find: caviar"));
        assert!(text.contains("💰 STORE TOTALS:"));
        assert!(text.contains("You save $5.49 shopping at Food Basics vs No Frills!"));
    }

    #[test]
    fn test_item_prices_sorted_ascending() {
        let text = format_results_text(&sample());
        let walmart = text.find("Walmart          $5.27").unwrap();
        let no_frills = text.find("No Frills        $5.49").unwrap();
        assert!(walmart < no_frills);
    }

    #[test]
    fn test_cheapest_total_marked_once() {
        let text = format_results_text(&sample());
        assert_eq!(text.matches("← CHEAPEST!").count(), 1);
        assert!(text.contains("    Food Basics      $0.00 ← CHEAPEST! 🏆"));
    }

    #[test]
    fn test_no_unmatched_line_when_all_found() {
        let mut result = sample();
        result.unmatched.clear();
        assert!(!format_results_text(&result).contains("Could not find"));
    }
}
