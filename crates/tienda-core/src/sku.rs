//! # SKU Sequencer
//!
//! Products get sequential codes `SKU-0001`, `SKU-0002`, ... The next code is
//! always "highest existing number + 1", so gaps left by deleted products are
//! never reused.
//!
//! ```text
//! existing: SKU-0001  SKU-0003  SKU-0099  ABC-7  (none)
//!              1         3        99      skip   skip
//!                                 │
//!                                 ▼ max + 1
//!                             SKU-0100
//! ```
//!
//! Batches use one [`SkuSequence`] so every variant gets its own code
//! without rescanning the catalog.
//!
//! Numbers are handled as decimal text: a suffix of any length counts and
//! the sequence has no ceiling.

use crate::types::{AppData, Product};

/// Prefix of generated codes.
pub const SKU_PREFIX: &str = "SKU-";

/// Minimum digit width. Wider numbers print unpadded (`SKU-10000`).
pub const SKU_WIDTH: usize = 4;

/// Extracts the number from a code shaped exactly `SKU-<digits>`, as its
/// decimal digits without leading zeros.
///
/// Numbers stay in decimal text so that no suffix is too long to count.
fn sku_number(sku: &str) -> Option<&str> {
    let digits = sku.strip_prefix(SKU_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0" } else { trimmed })
}

/// Decimal increment, carrying into a new leading digit when needed.
fn increment(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    for byte in out.iter_mut().rev() {
        if *byte == b'9' {
            *byte = b'0';
        } else {
            *byte += 1;
            return String::from_utf8_lossy(&out).into_owned();
        }
    }
    out.insert(0, b'1');
    String::from_utf8_lossy(&out).into_owned()
}

fn format_sku(digits: &str) -> String {
    format!("{SKU_PREFIX}{digits:0>width$}", width = SKU_WIDTH)
}

/// The code the next created product should get.
///
/// ## Example
/// ```rust
/// use tienda_core::sku::generate_sku;
/// use tienda_core::AppData;
///
/// assert_eq!(generate_sku(&AppData::new()), "SKU-0001");
/// ```
pub fn generate_sku(data: &AppData) -> String {
    SkuSequence::from_products(&data.products).peek()
}

/// Mints consecutive SKUs, seeded once from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuSequence {
    last: String,
}

impl SkuSequence {
    pub fn from_products(products: &[Product]) -> Self {
        let last = products
            .iter()
            .filter_map(|product| product.sku.as_deref())
            .filter_map(sku_number)
            // canonical digits: longer is larger, equal lengths compare as text
            .max_by_key(|digits| (digits.len(), *digits))
            .unwrap_or("0");
        Self { last: last.to_string() }
    }

    /// The code [`next`](Self::next) would return, without consuming it.
    pub fn peek(&self) -> String {
        format_sku(&increment(&self.last))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> String {
        self.last = increment(&self.last);
        format_sku(&self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::Category;
    use chrono::Utc;

    fn catalog(products: Vec<Product>) -> AppData {
        AppData {
            products,
            ..AppData::default()
        }
    }

    fn with_sku(sku: Option<&str>) -> Product {
        Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: "x".into(),
            sku: sku.map(str::to_string),
            category: Category::Unset,
            model: None,
            color: None,
            default_unit_price: Money::zero(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_next_after_numeric_max() {
        let products = vec![
            with_sku(Some("SKU-0001")),
            with_sku(Some("SKU-0099")),
            with_sku(Some("SKU-0003")),
        ];
        assert_eq!(generate_sku(&catalog(products)), "SKU-0100");
    }

    #[test]
    fn test_ignores_non_matching_codes() {
        let products = vec![
            with_sku(None),
            with_sku(Some("ABC-12")),
            with_sku(Some("SKU-12a")),
            with_sku(Some("sku-0500")),
            with_sku(Some("SKU-")),
            with_sku(Some(" SKU-0900")),
        ];
        assert_eq!(generate_sku(&catalog(products)), "SKU-0001");
    }

    #[test]
    fn test_wide_numbers_are_not_truncated() {
        let products = vec![with_sku(Some("SKU-9999"))];
        assert_eq!(generate_sku(&catalog(products)), "SKU-10000");
        let products = vec![with_sku(Some("SKU-123456"))];
        assert_eq!(generate_sku(&catalog(products)), "SKU-123457");
    }

    #[test]
    fn test_sequence_mints_consecutive_codes() {
        let products = vec![with_sku(Some("SKU-0007"))];
        let mut seq = SkuSequence::from_products(&products);
        assert_eq!(seq.peek(), "SKU-0008");
        assert_eq!(seq.next(), "SKU-0008");
        assert_eq!(seq.next(), "SKU-0009");
        assert_eq!(seq.peek(), "SKU-0010");
    }

    #[test]
    fn test_numbers_beyond_machine_width_still_count() {
        let products = vec![
            with_sku(Some("SKU-18446744073709551615")),
            with_sku(Some("SKU-99999999999999999999999999999999999999999")),
            with_sku(Some("SKU-0500")),
        ];
        assert_eq!(
            generate_sku(&catalog(products)),
            "SKU-100000000000000000000000000000000000000000"
        );

        let mut seq = SkuSequence::from_products(&[with_sku(Some("SKU-18446744073709551615"))]);
        assert_eq!(seq.next(), "SKU-18446744073709551616");
        assert_eq!(seq.next(), "SKU-18446744073709551617");
    }

    #[test]
    fn test_leading_zeros_do_not_inflate_the_max() {
        let products = vec![with_sku(Some("SKU-000000000042")), with_sku(Some("SKU-0100"))];
        assert_eq!(generate_sku(&catalog(products)), "SKU-0101");
        assert_eq!(generate_sku(&catalog(vec![with_sku(Some("SKU-0000"))])), "SKU-0001");
    }
}
