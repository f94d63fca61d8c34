//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, prices: StorePrices) -> NewProduct {
        NewProduct {
            product_name: name.to_string(),
            category: "Dairy".to_string(),
            brand: None,
            unit: None,
            prices,
            source: ProductSource::Manual,
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.fetch_all_products().unwrap().is_empty());
        assert!(db.get_flyer_deals().unwrap().is_empty());
        assert_eq!(db.product_count().unwrap(), 0);
    }

    #[test]
    fn test_in_memory_dbs_are_isolated() {
        let a = Database::in_memory().unwrap();
        let b = Database::in_memory().unwrap();
        assert_ne!(a.path(), b.path());

        a.insert_product(&new_product("Milk", StorePrices::new()))
            .unwrap();
        assert_eq!(b.product_count().unwrap(), 0);
    }

    #[test]
    fn test_insert_and_fetch_product() {
        let db = Database::in_memory().unwrap();
        let prices = StorePrices::new()
            .with(Store::NoFrills, 5.49)
            .with(Store::Loblaws, 6.29);
        let id = db
            .insert_product(&new_product("2% Milk 4L", prices))
            .unwrap();
        assert!(id > 0);

        let products = db.fetch_all_products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, id);
        assert_eq!(products[0].prices, prices);
        assert_eq!(products[0].prices.get(Store::Walmart), None);
        assert_eq!(products[0].source, ProductSource::Manual);
    }

    #[test]
    fn test_load_seed_csv_replaces_catalog() {
        let db = Database::in_memory().unwrap();
        db.insert_product(&new_product("Stale Row", StorePrices::new()))
            .unwrap();

        let csv = "\
product_name,category,brand,unit,no_frills_price,food_basics_price,walmart_price,freshco_price,loblaws_price
2% Milk 4L,Dairy,Neilson,4L,5.49,5.59,5.27,,6.29
Bananas,Produce,,per lb,0.69,0.79,0.67,0.69,0.89
";
        let count = db.load_seed_csv(csv.as_bytes()).unwrap();
        assert_eq!(count, 2);

        let products = db.fetch_all_products().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].product_name, "2% Milk 4L");
        assert_eq!(products[0].prices.get(Store::FreshCo), None);
        assert_eq!(products[0].prices.get(Store::Walmart), Some(5.27));
        assert_eq!(products[0].source, ProductSource::Seed);
        assert_eq!(products[1].brand, None);
    }

    #[test]
    fn test_load_seed_csv_rejects_negative_price() {
        let db = Database::in_memory().unwrap();
        db.seed_default_catalog().unwrap();
        let before = db.product_count().unwrap();

        let csv = "\
product_name,category,brand,unit,no_frills_price,food_basics_price,walmart_price,freshco_price,loblaws_price
Milk,Dairy,,,-1.00,,,,
";
        assert!(db.load_seed_csv(csv.as_bytes()).is_err());
        // Failed load leaves the catalog as it was
        assert_eq!(db.product_count().unwrap(), before);
    }

    #[test]
    fn test_seed_default_catalog() {
        let db = Database::in_memory().unwrap();
        let count = db.seed_default_catalog().unwrap();
        assert!(count >= 30);
        assert_eq!(db.product_count().unwrap(), count as i64);

        // Reseeding does not duplicate rows
        db.seed_default_catalog().unwrap();
        assert_eq!(db.product_count().unwrap(), count as i64);
    }

    #[test]
    fn test_search_products() {
        let db = Database::in_memory().unwrap();
        db.seed_default_catalog().unwrap();

        let results = db.search_products("CHICKEN").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].product_name, "Chicken Breast Boneless Skinless");

        // LIKE wildcards in the query are matched literally
        let percent: Vec<_> = db
            .search_products("%")
            .unwrap()
            .into_iter()
            .map(|p| p.product_name)
            .collect();
        assert_eq!(percent, vec!["2% Milk 4L"]);
        assert!(db.search_products("_").unwrap().is_empty());
        assert!(db.search_products("no such product").unwrap().is_empty());
    }

    #[test]
    fn test_flyer_deals() {
        let db = Database::in_memory().unwrap();
        assert!(!db.flyer_already_ingested("abc123").unwrap());

        let deal = NewFlyerDeal {
            product_name: "Chicken Breast".to_string(),
            store: "No Frills".to_string(),
            sale_price: 4.98,
            regular_price: Some(6.99),
            unit: Some("per lb".to_string()),
            start_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 15),
            flyer_source: Some("nofrills_week42.jpg".to_string()),
            source_hash: Some("abc123".to_string()),
            ..Default::default()
        };
        let id = db.add_flyer_deal(&deal).unwrap();
        assert!(id > 0);

        let deals = db.get_flyer_deals().unwrap();
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].store, "No Frills");
        assert_eq!(deals[0].regular_price, Some(6.99));
        assert_eq!(deals[0].start_date, chrono::NaiveDate::from_ymd_opt(2026, 10, 15));
        assert_eq!(deals[0].end_date, None);
        assert!(db.flyer_already_ingested("abc123").unwrap());
    }

    fn new_recipe(title: &str, ingredients: &[&str]) -> NewRecipe {
        NewRecipe {
            title: title.to_string(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            instructions: None,
        }
    }

    #[test]
    fn test_save_and_get_recipe() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_saved_recipes().unwrap().is_empty());

        let id = db
            .save_recipe(&NewRecipe {
                instructions: Some("  Simmer for an hour.  ".to_string()),
                ..new_recipe(
                    "  Vegetarian Chili ",
                    &["black beans", " roma tomatoes ", "", "onions\ngarlic"],
                )
            })
            .unwrap();

        let recipe = db.get_recipe(id).unwrap().unwrap();
        assert_eq!(recipe.title, "Vegetarian Chili");
        assert_eq!(
            recipe.ingredients,
            vec!["black beans", "roma tomatoes", "onions", "garlic"]
        );
        assert_eq!(recipe.instructions.as_deref(), Some("Simmer for an hour."));
        assert!(db.get_recipe(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_saved_recipes_newest_first() {
        let db = Database::in_memory().unwrap();
        let first = db.save_recipe(&new_recipe("Tacos", &["taco shells"])).unwrap();
        let second = db.save_recipe(&new_recipe("Chili", &["black beans"])).unwrap();

        let ids: Vec<_> = db.get_saved_recipes().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_save_recipe_rejects_blank() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(
            db.save_recipe(&new_recipe("   ", &["eggs"])),
            Err(crate::error::Error::InvalidInput(_))
        ));
        assert!(matches!(
            db.save_recipe(&new_recipe("Nothing", &["", "  "])),
            Err(crate::error::Error::InvalidInput(_))
        ));
        assert!(db.get_saved_recipes().unwrap().is_empty());
    }

    #[test]
    fn test_delete_recipe() {
        let db = Database::in_memory().unwrap();
        let id = db.save_recipe(&new_recipe("Tacos", &["taco shells"])).unwrap();

        assert!(db.delete_recipe(id).unwrap());
        assert!(!db.delete_recipe(id).unwrap());
        assert!(db.get_recipe(id).unwrap().is_none());
    }
}
