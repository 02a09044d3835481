//! # Domain Types
//!
//! Core domain types used throughout Tienda.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AppData (aggregate root)                        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  StockMovement  │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  product_id     │   │  id             │       │
//! │  │  sku (SKU-0001) │   │  quantity (±)   │   │  date           │       │
//! │  │  category       │   │  date           │   │  payment_method │       │
//! │  │  model / color  │   └─────────────────┘   │  total_amount   │       │
//! │  │  default price  │                         │  items ─────────┼──┐    │
//! │  └────────▲────────┘                         └─────────────────┘  │    │
//! │           │              ┌─────────────────┐                      │    │
//! │           └──────────────│    SaleItem     │◄─────────────────────┘    │
//! │                          │  product_id     │                           │
//! │                          │  product_name   │  (snapshot, never synced) │
//! │                          │  unit_price×qty │                           │
//! │                          └─────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Event Logs, Not Counters
//! There is no stock field anywhere. Stock movements and sales are
//! append-only logs; every derived number (available stock, units sold,
//! last sale) is recomputed from them by [`crate::ledger`].
//!
//! Product references are NOT enforced. Deleting a product leaves its
//! movements and sale items in place.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

/// Offset of the store's local time from UTC, in hours (Argentina, no DST).
pub const LOCAL_UTC_OFFSET_HOURS: i64 = -3;

// =============================================================================
// Category
// =============================================================================

/// Product category.
///
/// Closed set in the UI. Stored in the sheet as the Spanish label, with an
/// empty cell meaning "no category".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Category {
    /// Phone case. Requires a model.
    Funda,
    /// Any other accessory.
    Accesorio,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl Category {
    /// Parses a sheet cell. Unknown labels read as [`Category::Unset`].
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Funda" => Category::Funda,
            "Accesorio" => Category::Accesorio,
            _ => Category::Unset,
        }
    }

    /// The label written to the sheet.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Funda => "Funda",
            Category::Accesorio => "Accesorio",
            Category::Unset => "",
        }
    }

    pub const fn is_set(&self) -> bool {
        !matches!(self, Category::Unset)
    }

    /// Whether products of this category must name a phone model.
    pub const fn requires_model(&self) -> bool {
        matches!(self, Category::Funda)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// The payment methods the sales form offers.
///
/// `Sale.payment_method` stays a free-form string (older rows carry
/// anything); this enum only names the conventional values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash.
    Efectivo,
    /// Card on an external terminal.
    Tarjeta,
    /// Bank transfer.
    Transferencia,
    /// QR wallet payment.
    Qr,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Efectivo,
        PaymentMethod::Tarjeta,
        PaymentMethod::Transferencia,
        PaymentMethod::Qr,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::Tarjeta => "tarjeta",
            PaymentMethod::Transferencia => "transferencia",
            PaymentMethod::Qr => "qr",
        }
    }

    /// Case-insensitive lookup of a stored payment method string.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Event Date
// =============================================================================

/// The date of a stock movement or sale, exactly as stored in the sheet.
///
/// ## Two Shapes in the Wild
/// ```text
/// ┌──────────────────────────────┬──────────────────────────────────────────┐
/// │ Stored value                 │ Meaning                                  │
/// ├──────────────────────────────┼──────────────────────────────────────────┤
/// │ "2024-03-15"                 │ a local calendar day (date pickers)      │
/// │ "2024-03-16T01:30:00.000Z"   │ an instant (automatic entries)           │
/// │ anything else                │ kept as-is, never matches a day bucket   │
/// └──────────────────────────────┴──────────────────────────────────────────┘
/// ```
///
/// The raw string is kept so a load/save cycle writes the cell back
/// untouched. Interpretation happens on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct EventDate(String);

/// A successfully parsed [`EventDate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    /// Bare `YYYY-MM-DD`, already a local calendar day.
    Day(NaiveDate),
    /// Full RFC 3339 timestamp.
    Instant(DateTime<Utc>),
}

impl EventDate {
    pub fn new(raw: impl Into<String>) -> Self {
        EventDate(raw.into())
    }

    /// A bare calendar day, the shape date pickers produce.
    pub fn from_day(day: NaiveDate) -> Self {
        EventDate(day.format("%Y-%m-%d").to_string())
    }

    /// An instant, formatted with millisecond precision and a `Z` suffix.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        EventDate(instant.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Option<ParsedDate> {
        let raw = self.0.trim();
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(ParsedDate::Day(day));
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|instant| ParsedDate::Instant(instant.with_timezone(&Utc)))
    }

    /// The store-local calendar day this date falls on.
    ///
    /// ## Rules
    /// - A bare day is used as-is (no timezone shift)
    /// - An instant is shifted to UTC-3 before taking the date
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use tienda_core::types::EventDate;
    ///
    /// // 01:30 UTC on the 16th is still the 15th in Buenos Aires
    /// let date = EventDate::new("2024-03-16T01:30:00.000Z");
    /// assert_eq!(date.local_day(), NaiveDate::from_ymd_opt(2024, 3, 15));
    /// ```
    pub fn local_day(&self) -> Option<NaiveDate> {
        match self.parse()? {
            ParsedDate::Day(day) => Some(day),
            ParsedDate::Instant(instant) => {
                Some((instant.naive_utc() + Duration::hours(LOCAL_UTC_OFFSET_HOURS)).date())
            }
        }
    }

    /// The instant this date denotes. Bare days are local midnight.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self.parse()? {
            ParsedDate::Day(day) => {
                let midnight = day.and_hms_opt(0, 0, 0)?;
                Some((midnight - Duration::hours(LOCAL_UTC_OFFSET_HOURS)).and_utc())
            }
            ParsedDate::Instant(instant) => Some(instant),
        }
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventDate {
    fn from(raw: &str) -> Self {
        EventDate::new(raw)
    }
}

impl From<String> for EventDate {
    fn from(raw: String) -> Self {
        EventDate(raw)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry. Stock is not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4 for rows created by this crate).
    pub id: String,

    /// Display name shown in listings and copied onto sale items.
    pub name: String,

    /// Sequential business code (`SKU-0001`). Older rows may lack one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    #[serde(default)]
    pub category: Category,

    /// Phone model the product fits (`"15 PRO MAX"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Price suggested when the product is added to a sale.
    pub default_unit_price: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns true if the name or SKU contains `needle` (case-insensitive).
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .sku
                .as_deref()
                .is_some_and(|sku| sku.to_lowercase().contains(&needle))
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One entry in the stock log.
///
/// Positive quantities are receipts. Adjustments store the signed delta
/// between the declared count and the computed stock, so they may be
/// negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub date: EventDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A line in a sale.
///
/// `product_name` is a snapshot taken when the sale was recorded. Renaming
/// or deleting the product never touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

impl SaleItem {
    /// Builds a line, computing `line_total = unit_price × quantity` once.
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            unit_price,
            quantity,
            line_total: unit_price.multiply_quantity(quantity),
        }
    }
}

/// A recorded sale.
///
/// `total_amount` may have been typed by hand and is NOT guaranteed to equal
/// the sum of line totals. Reports always use `total_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub date: EventDate,
    pub payment_method: String,
    pub total_amount: Money,
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

impl Sale {
    /// Total quantity of `product_id` across every line of this sale.
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .fold(0, i64::saturating_add)
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }

    /// Sum of the stored line totals.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|item| item.line_total).sum()
    }

    /// Total units across all lines.
    pub fn units(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.quantity)
            .fold(0, i64::saturating_add)
    }
}

// =============================================================================
// AppData
// =============================================================================

/// The whole dataset. Always loaded and saved as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub stock_movements: Vec<StockMovement>,
    #[serde(default)]
    pub sales: Vec<Sale>,
}

impl AppData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.stock_movements.is_empty() && self.sales.is_empty()
    }

    pub fn find_product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    pub fn find_sale(&self, id: &str) -> Option<&Sale> {
        self.sales.iter().find(|sale| sale.id == id)
    }

    /// Name to show for a product id, or the orphan label if it was deleted.
    pub fn product_label(&self, id: &str) -> &str {
        self.find_product(id)
            .map(|product| product.name.as_str())
            .unwrap_or(crate::ORPHANED_PRODUCT_LABEL)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
