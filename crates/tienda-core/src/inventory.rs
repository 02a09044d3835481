//! # Inventory Listing
//!
//! The product table: one row per product with derived stock figures, plus
//! the search, filter and sort controls above it.
//!
//! ## Stock Levels
//! ```text
//! ┌──────────┬───────────┬────────────┬────────────┬──────────────┐
//! │ Negative │  Empty    │  Critical  │    Low     │    Normal    │
//! │   < 0    │    0      │   1 - 5    │   6 - 10   │     > 10     │
//! └──────────┴───────────┴────────────┴────────────┴──────────────┘
//! ```

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::{last_sale_date, stock_levels};
use crate::report::SortOrder;
use crate::types::{AppData, Category, EventDate, Product};

/// Models offered in the model picker even before any product uses them.
pub const PRELOADED_MODELS: &[&str] = &[
    "16 PRO MAX",
    "16 PRO",
    "16",
    "15 PRO MAX",
    "15 PRO",
    "14 PRO MAX",
    "14 PRO",
    "14",
    "13",
    "13 PRO MAX",
    "13 PRO",
    "11",
];

// =============================================================================
// Stock Level
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum StockLevel {
    /// More sold than received. Surfaced, never clamped.
    Negative,
    Empty,
    Critical,
    Low,
    Normal,
}

impl StockLevel {
    /// ```rust
    /// use tienda_core::inventory::StockLevel;
    ///
    /// assert_eq!(StockLevel::classify(0), StockLevel::Empty);
    /// assert_eq!(StockLevel::classify(5), StockLevel::Critical);
    /// assert_eq!(StockLevel::classify(6), StockLevel::Low);
    /// assert_eq!(StockLevel::classify(11), StockLevel::Normal);
    /// ```
    pub const fn classify(stock: i64) -> Self {
        match stock {
            i64::MIN..=-1 => StockLevel::Negative,
            0 => StockLevel::Empty,
            1..=5 => StockLevel::Critical,
            6..=10 => StockLevel::Low,
            _ => StockLevel::Normal,
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// One line of the inventory table.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow<'a> {
    pub product: &'a Product,
    pub stock: i64,
    pub units_sold: i64,
    pub last_sale: Option<&'a EventDate>,
}

impl InventoryRow<'_> {
    pub fn level(&self) -> StockLevel {
        StockLevel::classify(self.stock)
    }
}

/// Rows for every product, in catalog order.
pub fn inventory_rows(data: &AppData) -> Vec<InventoryRow<'_>> {
    let levels = stock_levels(data);

    data.products
        .iter()
        .map(|product| {
            let totals = levels.get(product.id.as_str()).copied().unwrap_or_default();
            InventoryRow {
                product,
                stock: totals.available(),
                units_sold: totals.outbound,
                last_sale: last_sale_date(&product.id, data),
            }
        })
        .collect()
}

// =============================================================================
// Query
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    #[default]
    Stock,
    Model,
    UnitPrice,
    Color,
    TotalSold,
}

/// Search, filters and sort of the inventory table.
///
/// Empty filter lists match everything. Model and color filters compare
/// against `""` for products without one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct InventoryQuery {
    pub search: String,
    pub categories: Vec<Category>,
    pub models: Vec<String>,
    pub colors: Vec<String>,
    pub levels: Vec<StockLevel>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl InventoryQuery {
    fn matches(&self, row: &InventoryRow<'_>) -> bool {
        let product = row.product;
        let model = product.model.as_deref().unwrap_or("");
        let color = product.color.as_deref().unwrap_or("");

        product.matches_search(&self.search)
            && (self.categories.is_empty() || self.categories.contains(&product.category))
            && (self.models.is_empty() || self.models.iter().any(|m| m == model))
            && (self.colors.is_empty() || self.colors.iter().any(|c| c == color))
            && (self.levels.is_empty() || self.levels.contains(&row.level()))
    }

    fn compare(&self, a: &InventoryRow<'_>, b: &InventoryRow<'_>) -> Ordering {
        let ordering = match self.sort {
            SortField::Name => compare_text(&a.product.name, &b.product.name),
            SortField::Stock => a.stock.cmp(&b.stock),
            SortField::Model => compare_text(
                a.product.model.as_deref().unwrap_or(""),
                b.product.model.as_deref().unwrap_or(""),
            ),
            SortField::UnitPrice => a.product.default_unit_price.cmp(&b.product.default_unit_price),
            SortField::Color => compare_text(
                a.product.color.as_deref().unwrap_or(""),
                b.product.color.as_deref().unwrap_or(""),
            ),
            SortField::TotalSold => a.units_sold.cmp(&b.units_sold),
        };

        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }

    /// Filters and sorts `rows`. The sort is stable.
    pub fn apply<'a>(&self, rows: Vec<InventoryRow<'a>>) -> Vec<InventoryRow<'a>> {
        let mut rows: Vec<_> = rows.into_iter().filter(|row| self.matches(row)).collect();
        rows.sort_by(|a, b| self.compare(a, b));
        rows
    }
}

/// Case-insensitive first, then exact, so "funda" and "Funda" sit together.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Runs `query` over the whole catalog.
pub fn query_inventory<'a>(data: &'a AppData, query: &InventoryQuery) -> Vec<InventoryRow<'a>> {
    query.apply(inventory_rows(data))
}

// =============================================================================
// Facets
// =============================================================================

/// Values offered by the model and color pickers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogFacets {
    pub models: Vec<String>,
    pub colors: Vec<String>,
}

/// Sorted distinct models (preloaded list included) and colors.
pub fn catalog_facets(data: &AppData) -> CatalogFacets {
    let mut models: BTreeSet<String> = PRELOADED_MODELS.iter().map(|m| m.to_string()).collect();
    let mut colors: BTreeSet<String> = BTreeSet::new();

    for product in &data.products {
        if let Some(model) = product.model.as_deref().filter(|m| !m.is_empty()) {
            models.insert(model.to_string());
        }
        if let Some(color) = product.color.as_deref().filter(|c| !c.is_empty()) {
            colors.insert(color.to_string());
        }
    }

    CatalogFacets {
        models: models.into_iter().collect(),
        colors: colors.into_iter().collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{Sale, SaleItem, StockMovement};
    use chrono::Utc;

    fn product(
        id: &str,
        name: &str,
        model: Option<&str>,
        color: Option<&str>,
        pesos: i64,
    ) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            sku: Some(format!("SKU-{id}")),
            category: if model.is_some() { Category::Funda } else { Category::Accesorio },
            model: model.map(str::to_string),
            color: color.map(str::to_string),
            default_unit_price: Money::from_pesos(pesos),
            created_at: Utc::now(),
        }
    }

    fn stock(product_id: &str, quantity: i64) -> StockMovement {
        StockMovement {
            id: format!("m-{product_id}"),
            product_id: product_id.into(),
            quantity,
            date: "2024-03-01".into(),
            created_at: Utc::now(),
        }
    }

    fn dataset() -> AppData {
        AppData {
            products: vec![
                product("1", "Funda Roja", Some("15 PRO"), Some("Rojo"), 100),
                product("2", "cargador", None, None, 50),
                product("3", "Funda Azul", Some("16"), Some("Azul"), 120),
            ],
            stock_movements: vec![stock("1", 12), stock("2", 3), stock("3", 8)],
            sales: vec![Sale {
                id: "s1".into(),
                date: "2024-03-05".into(),
                payment_method: "qr".into(),
                total_amount: Money::from_pesos(200),
                items: vec![SaleItem::new("1", "Funda Roja", Money::from_pesos(100), 2)],
            }],
        }
    }

    fn ids(rows: &[InventoryRow<'_>]) -> Vec<String> {
        rows.iter().map(|r| r.product.id.clone()).collect()
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(StockLevel::classify(-1), StockLevel::Negative);
        assert_eq!(StockLevel::classify(0), StockLevel::Empty);
        assert_eq!(StockLevel::classify(1), StockLevel::Critical);
        assert_eq!(StockLevel::classify(10), StockLevel::Low);
        assert_eq!(StockLevel::classify(i64::MAX), StockLevel::Normal);
    }

    #[test]
    fn test_rows_carry_derived_figures() {
        let data = dataset();
        let rows = inventory_rows(&data);
        assert_eq!(rows[0].stock, 10);
        assert_eq!(rows[0].units_sold, 2);
        assert_eq!(rows[0].last_sale.map(EventDate::as_str), Some("2024-03-05"));
        assert_eq!(rows[1].last_sale, None);
        assert_eq!(rows[1].level(), StockLevel::Critical);
    }

    #[test]
    fn test_default_query_sorts_by_stock_ascending() {
        let data = dataset();
        let rows = query_inventory(&data, &InventoryQuery::default());
        assert_eq!(ids(&rows), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_search_and_filters() {
        let data = dataset();
        let query = InventoryQuery {
            search: "FUNDA".into(),
            ..InventoryQuery::default()
        };
        assert_eq!(query_inventory(&data, &query).len(), 2);

        let query = InventoryQuery {
            models: vec!["16".into()],
            ..InventoryQuery::default()
        };
        assert_eq!(ids(&query_inventory(&data, &query)), vec!["3"]);

        let query = InventoryQuery {
            colors: vec!["".into()],
            ..InventoryQuery::default()
        };
        assert_eq!(ids(&query_inventory(&data, &query)), vec!["2"]);

        let query = InventoryQuery {
            levels: vec![StockLevel::Low, StockLevel::Critical],
            categories: vec![Category::Funda],
            ..InventoryQuery::default()
        };
        assert_eq!(ids(&query_inventory(&data, &query)), vec!["3", "1"]);
    }

    #[test]
    fn test_sort_by_name_is_case_insensitive() {
        let data = dataset();
        let query = InventoryQuery {
            sort: SortField::Name,
            ..InventoryQuery::default()
        };
        assert_eq!(ids(&query_inventory(&data, &query)), vec!["2", "3", "1"]);

        let query = InventoryQuery {
            sort: SortField::UnitPrice,
            order: SortOrder::Descending,
            ..InventoryQuery::default()
        };
        assert_eq!(ids(&query_inventory(&data, &query)), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_catalog_facets() {
        let mut data = dataset();
        data.products.push(product("4", "Funda", Some("XR"), Some("Azul"), 1));
        let facets = catalog_facets(&data);
        assert!(facets.models.contains(&"XR".to_string()));
        assert!(facets.models.contains(&"16 PRO MAX".to_string()));
        assert_eq!(facets.colors, vec!["Azul", "Rojo"]);
        let mut sorted = facets.models.clone();
        sorted.sort();
        assert_eq!(facets.models, sorted);
    }
}
