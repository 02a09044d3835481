//! # Product Rows
//!
//! ```text
//! ┌────┬──────┬─────┬──────────┬───────┬───────┬──────────────────┬───────────┐
//! │ id │ name │ sku │ category │ model │ color │ defaultUnitPrice │ createdAt │
//! └────┴──────┴─────┴──────────┴───────┴───────┴──────────────────┴───────────┘
//! ```
//!
//! Missing optional text is written as `""` and read back as `None`.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tienda_core::{Category, Money, Product};
use tracing::warn;

use super::created_at;
use crate::cells::{self, as_optional_text, as_text};
use crate::tabular::Row;

pub const PRODUCT_HEADERS: [&str; 8] = [
    "id",
    "name",
    "sku",
    "category",
    "model",
    "color",
    "defaultUnitPrice",
    "createdAt",
];

pub fn encode_product(product: &Product) -> Row {
    vec![
        Value::from(product.id.as_str()),
        Value::from(product.name.as_str()),
        cells::optional_text_value(product.sku.as_deref()),
        Value::from(product.category.as_str()),
        cells::optional_text_value(product.model.as_deref()),
        cells::optional_text_value(product.color.as_deref()),
        cells::money_value(product.default_unit_price),
        cells::timestamp_value(product.created_at),
    ]
}

/// Decodes a product row. Never fails.
///
/// ## Fallbacks
/// - Unknown category → unset
/// - Non-numeric price → zero, with a warning
/// - Unreadable `createdAt` → `loaded_at`
pub fn decode_product(row: &Row, loaded_at: DateTime<Utc>) -> Product {
    let id = as_text(row.first());
    let price_cell = row.get(6);
    let default_unit_price = cells::as_money(price_cell).unwrap_or_else(|| {
        if !cells::is_blank(price_cell) {
            warn!(
                product = %id,
                cell = %as_text(price_cell),
                "Unreadable product price, using zero"
            );
        }
        Money::zero()
    });

    Product {
        name: as_text(row.get(1)),
        sku: as_optional_text(row.get(2)),
        category: Category::parse(&as_text(row.get(3))),
        model: as_optional_text(row.get(4)),
        color: as_optional_text(row.get(5)),
        default_unit_price,
        created_at: created_at(row.get(7), loaded_at),
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_decode_tolerates_garbage() {
        let loaded_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let row = vec![
            json!("p1"),
            json!(1234),
            json!(""),
            json!("juguete"),
            json!(null),
            json!("Rojo"),
            json!("consultar"),
            json!("ayer"),
        ];

        let product = decode_product(&row, loaded_at);
        assert_eq!(product.id, "p1");
        assert_eq!(product.name, "1234");
        assert_eq!(product.sku, None);
        assert_eq!(product.category, Category::Unset);
        assert_eq!(product.model, None);
        assert_eq!(product.color.as_deref(), Some("Rojo"));
        assert_eq!(product.default_unit_price, Money::zero());
        assert_eq!(product.created_at, loaded_at);
    }

    #[test]
    fn test_decode_short_row() {
        let product = decode_product(&vec![json!("p2"), json!("Cable")], Utc::now());
        assert_eq!(product.name, "Cable");
        assert_eq!(product.category, Category::Unset);
        assert_eq!(product.default_unit_price, Money::zero());
    }

    #[test]
    fn test_encode_uses_pesos_and_blank_optionals() {
        let product = Product {
            id: "p3".into(),
            name: "Vidrio".into(),
            sku: None,
            category: Category::Accesorio,
            model: None,
            color: None,
            default_unit_price: Money::from_pesos(3500),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };
        let row = encode_product(&product);
        assert_eq!(row, vec![
            json!("p3"),
            json!("Vidrio"),
            json!(""),
            json!("Accesorio"),
            json!(""),
            json!(""),
            json!(3500),
            json!("2024-01-02T03:04:05.000Z"),
        ]);
    }
}
