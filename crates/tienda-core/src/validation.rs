//! # Validation Module
//!
//! Input checks for drafts and the stock check that guards every sale.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Reading the sheet: TOLERANT                                           │
//! │  └── bad cells become defaults, the load never fails                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Writing a command: STRICT ← THIS MODULE                               │
//! │  ├── field checks (name, category, price, model, quantity, date)       │
//! │  └── stock check: requested ≤ available (+ original qty on edit)       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Any failure: command aborted, dataset untouched                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use tienda_core::validation::{validate_product_name, validate_positive_quantity};
//!
//! validate_product_name("Funda Silicona").unwrap();
//! validate_positive_quantity("quantity", 5).unwrap();
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::available_stock;
use crate::money::Money;
use crate::types::{AppData, Category, EventDate, Sale, SaleItem};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest product name accepted.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
///
/// ## Example
/// ```rust
/// use tienda_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Funda Silicona").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// A product must be filed as either "Funda" or "Accesorio".
pub fn validate_category(category: Category) -> ValidationResult<()> {
    if !category.is_set() {
        return Err(ValidationError::required("category"));
    }
    Ok(())
}

/// Cases must name the phone model they fit.
///
/// ```rust
/// use tienda_core::validation::validate_model;
/// use tienda_core::Category;
///
/// assert!(validate_model(Category::Funda, Some("15 PRO")).is_ok());
/// assert!(validate_model(Category::Funda, Some("  ")).is_err());
/// assert!(validate_model(Category::Accesorio, None).is_ok());
/// ```
pub fn validate_model(category: Category, model: Option<&str>) -> ValidationResult<()> {
    let missing = model.map_or(true, |m| m.trim().is_empty());
    if category.requires_model() && missing {
        return Err(ValidationError::required("model"));
    }
    Ok(())
}

/// Validates a price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (gifts, promos)
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::negative(field));
    }
    Ok(())
}

/// Stock receipts and sale lines need a quantity of at least one.
pub fn validate_positive_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::must_be_positive(field));
    }
    Ok(())
}

/// Declared stock counts may be zero but never negative.
pub fn validate_declared_stock(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::negative("stock"));
    }
    Ok(())
}

/// New events must carry a date the reports can place on a day.
pub fn validate_event_date(field: &str, date: &EventDate) -> ValidationResult<()> {
    if date.as_str().trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    if date.parse().is_none() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Sale Stock Check
// =============================================================================

/// Checks that every product in `items` has enough stock.
///
/// ## Rules
/// - Quantities of repeated lines for the same product are summed
/// - When editing, `original` is the stored version of the sale; its
///   quantities are added back before comparing, since replacing the sale
///   returns them to the shelf
/// - All-or-nothing: the first shortfall aborts the whole check
///
/// ## Edit Add-Back
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  stock received: 10        original sale: 4        available now: 6    │
/// │                                                                         │
/// │  edit to 5:   6 + 4 = 10 ≥ 5   → OK        (stock afterwards: 5)       │
/// │  edit to 11:  6 + 4 = 10 < 11  → InsufficientStock { available: 10 }   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_sale_stock(
    items: &[SaleItem],
    data: &AppData,
    original: Option<&Sale>,
) -> CoreResult<()> {
    let mut seen: Vec<&str> = Vec::new();

    for item in items {
        let product_id = item.product_id.as_str();
        if seen.contains(&product_id) {
            continue;
        }
        seen.push(product_id);

        let requested: i64 = items
            .iter()
            .filter(|line| line.product_id == product_id)
            .map(|line| line.quantity)
            .fold(0, i64::saturating_add);

        let given_back = original.map_or(0, |sale| sale.quantity_of(product_id));
        let available = available_stock(product_id, data).saturating_add(given_back);

        if requested > available {
            let product = data
                .find_product(product_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| item.product_name.clone());
            return Err(CoreError::InsufficientStock {
                product,
                available,
                requested,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Product, StockMovement};
    use chrono::Utc;

    fn dataset() -> AppData {
        AppData {
            products: vec![Product {
                id: "p1".into(),
                name: "Funda 15 PRO".into(),
                sku: Some("SKU-0001".into()),
                category: Category::Funda,
                model: Some("15 PRO".into()),
                color: None,
                default_unit_price: Money::from_pesos(100),
                created_at: Utc::now(),
            }],
            stock_movements: vec![StockMovement {
                id: "m1".into(),
                product_id: "p1".into(),
                quantity: 10,
                date: "2024-03-01".into(),
                created_at: Utc::now(),
            }],
            sales: vec![Sale {
                id: "s1".into(),
                date: "2024-03-02".into(),
                payment_method: "efectivo".into(),
                total_amount: Money::from_pesos(400),
                items: vec![SaleItem::new("p1", "Funda 15 PRO", Money::from_pesos(100), 4)],
            }],
        }
    }

    fn line(qty: i64) -> SaleItem {
        SaleItem::new("p1", "Funda 15 PRO", Money::from_pesos(100), qty)
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Funda Silicona").is_ok());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_category_and_model() {
        assert_eq!(validate_category(Category::Unset), Err(ValidationError::required("category")));
        assert!(validate_category(Category::Accesorio).is_ok());
        assert!(validate_model(Category::Funda, None).is_err());
        assert!(validate_model(Category::Unset, None).is_ok());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_price("price", Money::zero()).is_ok());
        assert!(validate_price("price", Money::from_cents(-1)).is_err());
        assert!(validate_positive_quantity("quantity", 1).is_ok());
        assert!(validate_positive_quantity("quantity", 0).is_err());
        assert!(validate_declared_stock(0).is_ok());
        assert!(validate_declared_stock(-1).is_err());
    }

    #[test]
    fn test_validate_event_date() {
        assert!(validate_event_date("date", &"2024-03-15".into()).is_ok());
        assert!(validate_event_date("date", &"2024-03-15T10:00:00.000Z".into()).is_ok());
        assert!(matches!(
            validate_event_date("date", &"".into()),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_event_date("date", &"15/03/2024".into()),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_new_sale_within_stock() {
        let data = dataset();
        assert!(validate_sale_stock(&[line(6)], &data, None).is_ok());
        let err = validate_sale_stock(&[line(7)], &data, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 6, requested: 7, .. }
        ));
    }

    #[test]
    fn test_edit_adds_back_original_quantity() {
        let data = dataset();
        let original = data.sales[0].clone();
        assert!(validate_sale_stock(&[line(5)], &data, Some(&original)).is_ok());
        assert!(validate_sale_stock(&[line(10)], &data, Some(&original)).is_ok());
    }

    #[test]
    fn test_edit_beyond_add_back_is_rejected() {
        let data = dataset();
        let original = data.sales[0].clone();
        match validate_sale_stock(&[line(11)], &data, Some(&original)) {
            Err(CoreError::InsufficientStock {
                product,
                available,
                requested,
            }) => {
                assert_eq!(product, "Funda 15 PRO");
                assert_eq!(available, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_lines_are_summed() {
        let data = dataset();
        assert!(validate_sale_stock(&[line(3), line(3)], &data, None).is_ok());
        assert!(validate_sale_stock(&[line(3), line(4)], &data, None).is_err());
    }

    #[test]
    fn test_unknown_product_has_no_stock() {
        let data = dataset();
        let ghost = SaleItem::new("gone", "Vidrio", Money::from_pesos(5), 1);
        match validate_sale_stock(&[ghost], &data, None) {
            Err(CoreError::InsufficientStock { product, available, .. }) => {
                assert_eq!(product, "Vidrio");
                assert_eq!(available, 0);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }
}
