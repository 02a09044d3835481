//! # Stock Movement Rows
//!
//! ```text
//! ┌────┬───────────┬──────────┬──────┬───────────┐
//! │ id │ productId │ quantity │ date │ createdAt │
//! └────┴───────────┴──────────┴──────┴───────────┘
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;
use tienda_core::{EventDate, StockMovement};
use tracing::warn;

use super::created_at;
use crate::cells::{self, as_text};
use crate::tabular::Row;

pub const STOCK_HEADERS: [&str; 5] = ["id", "productId", "quantity", "date", "createdAt"];

pub fn encode_movement(movement: &StockMovement) -> Row {
    vec![
        Value::from(movement.id.as_str()),
        Value::from(movement.product_id.as_str()),
        Value::from(movement.quantity),
        Value::from(movement.date.as_str()),
        cells::timestamp_value(movement.created_at),
    ]
}

/// Decodes a movement row. A quantity that is not a number reads as 0, so the
/// row is kept but moves no stock.
pub fn decode_movement(row: &Row, loaded_at: DateTime<Utc>) -> StockMovement {
    let id = as_text(row.first());
    let quantity = cells::as_integer(row.get(2)).unwrap_or_else(|| {
        warn!(movement = %id, cell = %as_text(row.get(2)), "Unreadable movement quantity, using 0");
        0
    });

    StockMovement {
        product_id: as_text(row.get(1)),
        quantity,
        date: EventDate::new(as_text(row.get(3))),
        created_at: created_at(row.get(4), loaded_at),
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_keeps_raw_date_and_sign() {
        let row = vec![
            json!("m1"),
            json!("p1"),
            json!("-3"),
            json!("2024-03-15T14:00:00.000Z"),
            json!("2024-03-15T14:00:00.000Z"),
        ];
        let movement = decode_movement(&row, Utc::now());
        assert_eq!(movement.quantity, -3);
        assert_eq!(movement.date.as_str(), "2024-03-15T14:00:00.000Z");
    }

    #[test]
    fn test_decode_bad_quantity_is_zero() {
        let row = vec![json!("m2"), json!("p1"), json!("muchos"), json!("2024-03-15")];
        assert_eq!(decode_movement(&row, Utc::now()).quantity, 0);
    }
}
