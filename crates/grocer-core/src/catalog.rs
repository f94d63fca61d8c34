//! Read access to the product catalog
//!
//! The comparison engine only ever reads the catalog, so it depends on this
//! trait rather than on [`Database`] directly. Tests and embedders can hand it
//! a [`StaticCatalog`] instead.

use crate::db::Database;
use crate::error::Result;
use crate::models::Product;

/// Read-only view over canonical products and their per-store prices
pub trait Catalog: Send + Sync {
    /// Every product, in catalog order. An empty catalog is not an error.
    fn fetch_all_products(&self) -> Result<Vec<Product>>;

    /// Products whose name contains the trimmed `query`
    ///
    /// Case is ignored for ASCII letters only, which is how SQLite `LIKE`
    /// compares. "CRÈME" does not find "Crème Fraîche".
    fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        let needle = query.trim().to_ascii_lowercase();
        Ok(self
            .fetch_all_products()?
            .into_iter()
            .filter(|p| p.product_name.to_ascii_lowercase().contains(&needle))
            .collect())
    }
}

impl Catalog for Database {
    fn fetch_all_products(&self) -> Result<Vec<Product>> {
        Database::fetch_all_products(self)
    }

    fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        Database::search_products(self, query)
    }
}

/// A fixed in-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

impl Catalog for StaticCatalog {
    fn fetch_all_products(&self) -> Result<Vec<Product>> {
        Ok(self.products.clone())
    }
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn fetch_all_products(&self) -> Result<Vec<Product>> {
        (**self).fetch_all_products()
    }

    fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        (**self).search_products(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProduct, ProductSource, Store, StorePrices};

    fn product(id: i64, name: &str) -> Product {
        Product {
            id,
            product_name: name.to_string(),
            category: "Dairy".to_string(),
            brand: None,
            unit: None,
            prices: StorePrices::new().with(Store::Walmart, 3.0),
            source: ProductSource::Seed,
        }
    }

    #[test]
    fn test_static_catalog_search_ignores_case() {
        let catalog = StaticCatalog::new(vec![
            product(1, "2% Milk 4L"),
            product(2, "Large Eggs 12pk"),
            product(3, "Chocolate MILK 1L"),
        ]);

        let found = catalog.search_products("milk").unwrap();
        let names: Vec<_> = found.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, vec!["2% Milk 4L", "Chocolate MILK 1L"]);
    }

    #[test]
    fn test_static_and_database_search_agree_on_non_ascii() {
        let names = ["Crème Fraîche 200ml", "Crema Catalana", "Large Eggs 12pk"];
        let catalog = StaticCatalog::new(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| product(i as i64 + 1, name))
                .collect(),
        );

        let db = Database::in_memory().unwrap();
        for name in names {
            db.insert_product(&NewProduct {
                product_name: name.to_string(),
                category: "Dairy".to_string(),
                brand: None,
                unit: None,
                prices: StorePrices::new().with(Store::Walmart, 3.0),
                source: ProductSource::Manual,
            })
            .unwrap();
        }

        for query in ["crème", "CRème", "CRÈME", "  crema ", "EGGS"] {
            let from_static: Vec<_> = catalog
                .search_products(query)
                .unwrap()
                .into_iter()
                .map(|p| p.product_name)
                .collect();
            let from_db: Vec<_> = Catalog::search_products(&db, query)
                .unwrap()
                .into_iter()
                .map(|p| p.product_name)
                .collect();
            assert_eq!(from_static, from_db, "query {:?}", query);
        }

        assert!(catalog.search_products("CRÈME").unwrap().is_empty());
        assert_eq!(catalog.search_products("CRème").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_catalog_is_not_an_error() {
        let catalog = StaticCatalog::default();
        assert!(catalog.fetch_all_products().unwrap().is_empty());
    }

    #[test]
    fn test_database_catalog() {
        let db = Database::in_memory().unwrap();
        assert!(Catalog::fetch_all_products(&db).unwrap().is_empty());

        db.seed_default_catalog().unwrap();
        let all = Catalog::fetch_all_products(&db).unwrap();
        assert!(!all.is_empty());
        let eggs = Catalog::search_products(&db, "EGGS").unwrap();
        assert!(eggs.iter().all(|p| p.product_name.to_lowercase().contains("eggs")));
        assert!(!eggs.is_empty());
    }
}
