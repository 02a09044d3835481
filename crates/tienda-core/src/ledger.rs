//! # Stock Ledger
//!
//! Derives stock figures from the two event logs. Nothing here is cached:
//! every call recomputes from the snapshot it is given.
//!
//! ## The Ledger Equation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   StockMovement log            Sale log                                 │
//! │   ┌──────────────┐             ┌──────────────────────────┐             │
//! │   │ +10 receipt  │             │ sale A: p1 × 2, p2 × 1   │             │
//! │   │  +5 receipt  │             │ sale B: p1 × 4           │             │
//! │   │  -1 adjust   │             └────────────┬─────────────┘             │
//! │   └──────┬───────┘                          │                           │
//! │          │ Σ quantity (inbound)             │ Σ item qty (outbound)     │
//! │          ▼                                  ▼                           │
//! │          14            ─────────────        6                           │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                    available stock = 8                                  │
//! │                                                                         │
//! │   No clamping: overselling shows up as a negative number.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sums saturate at the `i64` bounds; quantities come straight from sheet
//! cells and a corrupt one must not abort a load.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{AppData, EventDate};

// =============================================================================
// Per-Product Queries
// =============================================================================

/// Current stock of a product: Σ movements − Σ sold quantities.
///
/// ## Example
/// ```rust
/// use tienda_core::ledger::available_stock;
/// use tienda_core::AppData;
///
/// assert_eq!(available_stock("p1", &AppData::new()), 0);
/// ```
pub fn available_stock(product_id: &str, data: &AppData) -> i64 {
    inbound(product_id, data).saturating_sub(total_units_sold(product_id, data))
}

/// Units sold across every recorded sale.
pub fn total_units_sold(product_id: &str, data: &AppData) -> i64 {
    data.sales
        .iter()
        .map(|sale| sale.quantity_of(product_id))
        .fold(0, i64::saturating_add)
}

fn inbound(product_id: &str, data: &AppData) -> i64 {
    data.stock_movements
        .iter()
        .filter(|movement| movement.product_id == product_id)
        .map(|movement| movement.quantity)
        .fold(0, i64::saturating_add)
}

/// Date of the most recent sale that includes the product.
///
/// ## Ordering Rules
/// - Dates compare as instants; a bare day counts as local midnight
/// - Equal instants: the sale that appears first in the log wins
/// - Unparsable dates rank below every parsable one
pub fn last_sale_date<'a>(product_id: &str, data: &'a AppData) -> Option<&'a EventDate> {
    let mut best: Option<(Option<DateTime<Utc>>, &EventDate)> = None;

    for sale in data.sales.iter().filter(|sale| sale.contains_product(product_id)) {
        let key = sale.date.instant();
        let newer = match &best {
            Some((best_key, _)) => key > *best_key,
            None => true,
        };
        if newer {
            best = Some((key, &sale.date));
        }
    }

    best.map(|(_, date)| date)
}

/// Quantity an adjustment movement must carry so that the product's stock
/// becomes `declared`.
///
/// ```rust
/// use tienda_core::ledger::adjustment_quantity;
/// use tienda_core::AppData;
///
/// // Nothing recorded yet, operator counts 7 on the shelf
/// assert_eq!(adjustment_quantity("p1", 7, &AppData::new()), 7);
/// ```
pub fn adjustment_quantity(product_id: &str, declared: i64, data: &AppData) -> i64 {
    declared.saturating_sub(available_stock(product_id, data))
}

// =============================================================================
// Whole-Catalog Totals
// =============================================================================

/// Inbound and outbound totals for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockTotals {
    pub inbound: i64,
    pub outbound: i64,
}

impl StockTotals {
    pub const fn available(&self) -> i64 {
        self.inbound.saturating_sub(self.outbound)
    }
}

/// Totals for every product id seen in either log, in one pass over each.
///
/// Listings use this instead of calling [`available_stock`] per row. Ids of
/// deleted products still appear.
pub fn stock_levels(data: &AppData) -> HashMap<&str, StockTotals> {
    let mut totals: HashMap<&str, StockTotals> = HashMap::new();

    for movement in &data.stock_movements {
        let entry = totals.entry(movement.product_id.as_str()).or_default();
        entry.inbound = entry.inbound.saturating_add(movement.quantity);
    }

    for item in data.sales.iter().flat_map(|sale| sale.items.iter()) {
        let entry = totals.entry(item.product_id.as_str()).or_default();
        entry.outbound = entry.outbound.saturating_add(item.quantity);
    }

    totals
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{Sale, SaleItem, StockMovement};

    fn movement(product_id: &str, quantity: i64) -> StockMovement {
        StockMovement {
            id: format!("m-{product_id}-{quantity}"),
            product_id: product_id.to_string(),
            quantity,
            date: "2024-03-01".into(),
            created_at: Utc::now(),
        }
    }

    fn sale(id: &str, date: &str, lines: &[(&str, i64)]) -> Sale {
        Sale {
            id: id.to_string(),
            date: date.into(),
            payment_method: "efectivo".to_string(),
            total_amount: Money::from_pesos(1),
            items: lines
                .iter()
                .map(|(product, qty)| SaleItem::new(*product, "", Money::from_pesos(1), *qty))
                .collect(),
        }
    }

    #[test]
    fn test_empty_dataset_has_zero_stock() {
        let data = AppData::new();
        assert_eq!(available_stock("p1", &data), 0);
        assert_eq!(total_units_sold("p1", &data), 0);
        assert_eq!(last_sale_date("p1", &data), None);
    }

    #[test]
    fn test_available_stock_is_inbound_minus_outbound() {
        let data = AppData {
            products: vec![],
            stock_movements: vec![
                movement("p1", 10),
                movement("p1", 5),
                movement("p1", -1),
                movement("p2", 3),
            ],
            sales: vec![
                sale("a", "2024-03-02", &[("p1", 2), ("p2", 1)]),
                sale("b", "2024-03-03", &[("p1", 4)]),
            ],
        };
        assert_eq!(available_stock("p1", &data), 8);
        assert_eq!(available_stock("p2", &data), 2);
        assert_eq!(total_units_sold("p1", &data), 6);
    }

    #[test]
    fn test_available_stock_ignores_insertion_order() {
        let mut data = AppData {
            products: vec![],
            stock_movements: vec![movement("p1", 10), movement("p1", -3)],
            sales: vec![
                sale("a", "2024-03-02", &[("p1", 2)]),
                sale("b", "2024-03-01", &[("p1", 1)]),
            ],
        };
        let before = available_stock("p1", &data);
        data.stock_movements.reverse();
        data.sales.reverse();
        assert_eq!(available_stock("p1", &data), before);
        assert_eq!(available_stock("p1", &data), available_stock("p1", &data));
    }

    #[test]
    fn test_oversold_stock_goes_negative() {
        let data = AppData {
            products: vec![],
            stock_movements: vec![movement("p1", 1)],
            sales: vec![sale("a", "2024-03-02", &[("p1", 3)])],
        };
        assert_eq!(available_stock("p1", &data), -2);
    }

    #[test]
    fn test_last_sale_date_picks_latest_instant() {
        let data = AppData {
            products: vec![],
            stock_movements: vec![],
            sales: vec![
                sale("a", "2024-03-02", &[("p1", 1)]),
                sale("b", "2024-03-05T12:00:00.000Z", &[("p1", 1)]),
                sale("c", "2024-03-09", &[("p2", 1)]),
                sale("d", "2024-03-04", &[("p1", 1)]),
            ],
        };
        assert_eq!(
            last_sale_date("p1", &data).map(EventDate::as_str),
            Some("2024-03-05T12:00:00.000Z")
        );
    }

    #[test]
    fn test_last_sale_date_tie_keeps_first_in_log() {
        // Local midnight of the 5th is 03:00 UTC: same instant, two spellings.
        let data = AppData {
            products: vec![],
            stock_movements: vec![],
            sales: vec![
                sale("a", "2024-03-05", &[("p1", 1)]),
                sale("b", "2024-03-05T03:00:00.000Z", &[("p1", 1)]),
            ],
        };
        assert_eq!(last_sale_date("p1", &data).map(EventDate::as_str), Some("2024-03-05"));
    }

    #[test]
    fn test_last_sale_date_unparsable_ranks_last() {
        let data = AppData {
            products: vec![],
            stock_movements: vec![],
            sales: vec![sale("a", "???", &[("p1", 1)]), sale("b", "2020-01-01", &[("p1", 1)])],
        };
        assert_eq!(last_sale_date("p1", &data).map(EventDate::as_str), Some("2020-01-01"));

        let only_garbage = AppData {
            sales: vec![sale("a", "???", &[("p1", 1)])],
            ..AppData::default()
        };
        assert_eq!(last_sale_date("p1", &only_garbage).map(EventDate::as_str), Some("???"));
    }

    #[test]
    fn test_adjustment_quantity() {
        let data = AppData {
            products: vec![],
            stock_movements: vec![movement("p1", 10)],
            sales: vec![sale("a", "2024-03-02", &[("p1", 4)])],
        };
        assert_eq!(adjustment_quantity("p1", 6, &data), 0);
        assert_eq!(adjustment_quantity("p1", 2, &data), -4);
        assert_eq!(adjustment_quantity("p1", 9, &data), 3);
    }

    #[test]
    fn test_stock_levels_matches_per_product_queries() {
        let data = AppData {
            products: vec![],
            stock_movements: vec![movement("p1", 10), movement("p2", 3), movement("p1", -2)],
            sales: vec![
                sale("a", "2024-03-02", &[("p1", 2), ("p3", 1)]),
                sale("b", "2024-03-03", &[("p2", 3)]),
            ],
        };
        let levels = stock_levels(&data);
        for id in ["p1", "p2", "p3"] {
            assert_eq!(levels[id].available(), available_stock(id, &data));
            assert_eq!(levels[id].outbound, total_units_sold(id, &data));
        }
        assert_eq!(levels.get("p4"), None);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let data = AppData {
            products: vec![],
            stock_movements: vec![
                movement("p1", 9_000_000_000_000_000_000),
                movement("p1", 9_000_000_000_000_000_000),
            ],
            sales: vec![sale("a", "2024-03-02", &[("p1", i64::MAX), ("p1", i64::MAX)])],
        };
        assert_eq!(total_units_sold("p1", &data), i64::MAX);
        assert_eq!(available_stock("p1", &data), 0);
        assert_eq!(adjustment_quantity("p1", -5, &data), -5);

        let levels = stock_levels(&data);
        assert_eq!(levels["p1"].inbound, i64::MAX);
        assert_eq!(levels["p1"].available(), 0);
    }
}
