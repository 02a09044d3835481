//! # Sale Rows
//!
//! ```text
//! ┌────┬──────┬───────────────┬─────────────┬─────────────────────────────┐
//! │ id │ date │ paymentMethod │ totalAmount │ items                       │
//! │    │      │               │   (pesos)   │ JSON text, one object/line  │
//! └────┴──────┴───────────────┴─────────────┴─────────────────────────────┘
//! ```
//!
//! The `items` cell holds a JSON array serialized to text:
//!
//! ```text
//! [{"productId":"p1","productName":"Funda","unitPrice":9000,"quantity":2,"lineTotal":18000}]
//! ```
//!
//! Prices inside are pesos, like every other money cell. A cell that does not
//! parse yields a sale with no items (it still counts in reports by its
//! `totalAmount`).

use serde_json::{Map, Value};
use tienda_core::{EventDate, Money, Sale, SaleItem};
use tracing::warn;

use crate::cells::{self, as_text};
use crate::error::StoreResult;
use crate::tabular::Row;

pub const SALE_HEADERS: [&str; 5] = ["id", "date", "paymentMethod", "totalAmount", "items"];

pub fn encode_sale(sale: &Sale) -> StoreResult<Row> {
    let items: Vec<Value> = sale.items.iter().map(encode_item).collect();
    let items_text = serde_json::to_string(&items)?;

    Ok(vec![
        Value::from(sale.id.as_str()),
        Value::from(sale.date.as_str()),
        Value::from(sale.payment_method.as_str()),
        cells::money_value(sale.total_amount),
        Value::String(items_text),
    ])
}

fn encode_item(item: &SaleItem) -> Value {
    let mut object = Map::new();
    object.insert("productId".into(), Value::from(item.product_id.as_str()));
    object.insert("productName".into(), Value::from(item.product_name.as_str()));
    object.insert("unitPrice".into(), cells::money_value(item.unit_price));
    object.insert("quantity".into(), Value::from(item.quantity));
    object.insert("lineTotal".into(), cells::money_value(item.line_total));
    Value::Object(object)
}

/// Decodes a sale row. Never fails.
pub fn decode_sale(row: &Row) -> Sale {
    let id = as_text(row.first());
    let total_amount = cells::as_money(row.get(3)).unwrap_or_else(|| {
        warn!(sale = %id, cell = %as_text(row.get(3)), "Unreadable sale total, using zero");
        Money::zero()
    });
    let items = decode_items(&id, row.get(4));

    Sale {
        date: EventDate::new(as_text(row.get(1))),
        payment_method: as_text(row.get(2)),
        total_amount,
        items,
        id,
    }
}

/// Parses the items cell: JSON text, or an array if the backend already
/// decoded it.
fn decode_items(sale_id: &str, cell: Option<&Value>) -> Vec<SaleItem> {
    let parsed = match cell {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => Value::Array(items.clone()),
        Some(Value::String(text)) if text.trim().is_empty() => return Vec::new(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    sale = %sale_id,
                    error = %e,
                    "Sale items are not valid JSON, treating as empty"
                );
                return Vec::new();
            }
        },
        Some(other) => {
            warn!(sale = %sale_id, cell = %other, "Sale items cell has an unexpected type");
            return Vec::new();
        }
    };

    match parsed {
        Value::Array(items) => items.iter().filter_map(decode_item).collect(),
        _ => {
            warn!(sale = %sale_id, "Sale items are not a JSON array, treating as empty");
            Vec::new()
        }
    }
}

/// One item object. Entries without a product id are dropped; a missing
/// `lineTotal` is recomputed from price and quantity.
fn decode_item(value: &Value) -> Option<SaleItem> {
    let object = value.as_object()?;
    let product_id = cells::as_optional_text(object.get("productId"))?;
    let unit_price = cells::as_money(object.get("unitPrice")).unwrap_or(Money::zero());
    let quantity = cells::as_integer(object.get("quantity")).unwrap_or(0);
    let line_total = cells::as_money(object.get("lineTotal")).unwrap_or_else(|| {
        unit_price.checked_mul(quantity).unwrap_or_else(|| {
            warn!(product = %product_id, quantity, "Line total out of range, clamping");
            unit_price.multiply_quantity(quantity)
        })
    });

    Some(SaleItem {
        product_id,
        product_name: as_text(object.get("productName")),
        unit_price,
        quantity,
        line_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_items_as_json_text() {
        let sale = Sale {
            id: "s1".into(),
            date: EventDate::new("2024-03-15"),
            payment_method: "tarjeta".into(),
            total_amount: Money::from_cents(1050),
            items: vec![SaleItem::new("p1", "Cable", Money::from_cents(525), 2)],
        };
        let row = encode_sale(&sale).unwrap();

        assert_eq!(row[3], json!(10.5));
        let items: Value = serde_json::from_str(row[4].as_str().unwrap()).unwrap();
        assert_eq!(
            items,
            json!([{
                "productId": "p1",
                "productName": "Cable",
                "unitPrice": 5.25,
                "quantity": 2,
                "lineTotal": 10.5
            }])
        );
    }

    #[test]
    fn test_broken_items_cell_reads_as_empty() {
        let row = vec![
            json!("s1"),
            json!("2024-03-15"),
            json!("efectivo"),
            json!(500),
            json!("[{oops"),
        ];
        let sale = decode_sale(&row);
        assert!(sale.items.is_empty());
        assert_eq!(sale.total_amount, Money::from_pesos(500));
    }

    #[test]
    fn test_items_tolerate_shape_drift() {
        let row = vec![
            json!("s2"),
            json!("2024-03-15"),
            json!("qr"),
            json!("1000"),
            json!([
                {"productId": "p1", "unitPrice": "250", "quantity": "2"},
                {"productName": "sin id", "quantity": 1},
                "basura"
            ]),
        ];
        let sale = decode_sale(&row);

        assert_eq!(sale.items.len(), 1);
        let item = &sale.items[0];
        assert_eq!(item.product_name, "");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.line_total, Money::from_pesos(500));
    }

    #[test]
    fn test_oversized_quantity_clamps_line_total() {
        let row = vec![
            json!("s4"),
            json!("2024-03-15"),
            json!("efectivo"),
            json!(100),
            json!([{"productId": "p1", "unitPrice": 100, "quantity": 1e17}]),
        ];
        let sale = decode_sale(&row);

        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].quantity, 100_000_000_000_000_000);
        assert_eq!(sale.items[0].line_total, Money::from_cents(i64::MAX));
        assert_eq!(sale.items_total(), Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_missing_total_reads_as_zero() {
        let sale = decode_sale(&vec![json!("s3"), json!("2024-03-15")]);
        assert_eq!(sale.total_amount, Money::zero());
        assert!(sale.items.is_empty());
        assert_eq!(sale.payment_method, "");
    }
}
