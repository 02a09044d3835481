//! # Repository Module
//!
//! Loads the whole dataset from a [`TabularStore`] and saves it back.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Architecture                              │
//! │                                                                         │
//! │  DataSynchronizer (tienda-sync)                                         │
//! │       │                                                                 │
//! │       │ load_all() / save_all(&AppData)                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │ SheetRepository<S: TabularStore>                                │   │
//! │  │                                                                 │   │
//! │  │  product.rs   "products"        Product      ⇄ row              │   │
//! │  │  stock.rs     "stockMovements"  StockMovement ⇄ row             │   │
//! │  │  sale.rs      "sales"           Sale          ⇄ row (+ JSON)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TabularStore (memory, or the spreadsheet web app)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Row 0 is the header and is skipped on read, rewritten on save
//! - Fully blank rows are skipped
//! - Malformed cells fall back to defaults; a row is never rejected
//! - Saving rewrites all three sheets, in full

mod product;
mod sale;
mod stock;

pub use product::{decode_product, encode_product, PRODUCT_HEADERS};
pub use sale::{decode_sale, encode_sale, SALE_HEADERS};
pub use stock::{decode_movement, encode_movement, STOCK_HEADERS};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tienda_core::AppData;
use tracing::{debug, info};

use crate::cells;
use crate::error::StoreResult;
use crate::tabular::{Row, TabularStore};

// =============================================================================
// Repository Trait
// =============================================================================

/// Whole-dataset persistence.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Reads every sheet and decodes the dataset.
    async fn load_all(&self) -> StoreResult<AppData>;

    /// Replaces every sheet with the encoded dataset.
    async fn save_all(&self, data: &AppData) -> StoreResult<()>;
}

// =============================================================================
// Sheet Names
// =============================================================================

/// Tab names inside the spreadsheet.
///
/// ## Example
/// ```rust
/// use tienda_store::SheetNames;
///
/// let names = SheetNames::default().with_sales("ventas");
/// assert_eq!(names.products, "products");
/// assert_eq!(names.sales, "ventas");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
    pub products: String,
    pub stock_movements: String,
    pub sales: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        SheetNames {
            products: "products".to_string(),
            stock_movements: "stockMovements".to_string(),
            sales: "sales".to_string(),
        }
    }
}

impl SheetNames {
    pub fn with_products(mut self, name: impl Into<String>) -> Self {
        self.products = name.into();
        self
    }

    pub fn with_stock_movements(mut self, name: impl Into<String>) -> Self {
        self.stock_movements = name.into();
        self
    }

    pub fn with_sales(mut self, name: impl Into<String>) -> Self {
        self.sales = name.into();
        self
    }
}

// =============================================================================
// Sheet Repository
// =============================================================================

/// [`Repository`] over any [`TabularStore`].
///
/// ## Usage
/// ```rust,ignore
/// let repo = SheetRepository::new(MemoryTabularStore::new());
/// repo.save_all(&data).await?;
/// let reloaded = repo.load_all().await?;
/// ```
#[derive(Debug, Clone)]
pub struct SheetRepository<S> {
    store: S,
    names: SheetNames,
}

impl<S: TabularStore> SheetRepository<S> {
    /// Creates a repository using the default sheet names.
    pub fn new(store: S) -> Self {
        SheetRepository {
            store,
            names: SheetNames::default(),
        }
    }

    pub fn with_names(mut self, names: SheetNames) -> Self {
        self.names = names;
        self
    }

    pub fn names(&self) -> &SheetNames {
        &self.names
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: TabularStore> Repository for SheetRepository<S> {
    async fn load_all(&self) -> StoreResult<AppData> {
        let (product_rows, movement_rows, sale_rows) = tokio::try_join!(
            self.store.read_sheet(&self.names.products),
            self.store.read_sheet(&self.names.stock_movements),
            self.store.read_sheet(&self.names.sales),
        )?;

        let loaded_at = Utc::now();
        let data = AppData {
            products: data_rows(&product_rows)
                .map(|row| decode_product(row, loaded_at))
                .collect(),
            stock_movements: data_rows(&movement_rows)
                .map(|row| decode_movement(row, loaded_at))
                .collect(),
            sales: data_rows(&sale_rows).map(decode_sale).collect(),
        };

        info!(
            products = data.products.len(),
            movements = data.stock_movements.len(),
            sales = data.sales.len(),
            "Loaded dataset"
        );
        Ok(data)
    }

    async fn save_all(&self, data: &AppData) -> StoreResult<()> {
        // Encode everything before touching the store.
        let sale_rows = data
            .sales
            .iter()
            .map(encode_sale)
            .collect::<StoreResult<Vec<_>>>()?;
        let products = with_header(&PRODUCT_HEADERS, data.products.iter().map(encode_product));
        let movements = with_header(
            &STOCK_HEADERS,
            data.stock_movements.iter().map(encode_movement),
        );
        let sales = with_header(&SALE_HEADERS, sale_rows);

        debug!(
            products = products.len() - 1,
            movements = movements.len() - 1,
            sales = sales.len() - 1,
            "Saving dataset"
        );

        tokio::try_join!(
            self.store.write_sheet(&self.names.products, products),
            self.store.write_sheet(&self.names.stock_movements, movements),
            self.store.write_sheet(&self.names.sales, sales),
        )?;

        info!("Saved dataset");
        Ok(())
    }
}

// =============================================================================
// Shared Row Helpers
// =============================================================================

/// Rows after the header, skipping fully blank ones.
fn data_rows(rows: &[Row]) -> impl Iterator<Item = &Row> {
    rows.iter()
        .skip(1)
        .filter(|row| !row.iter().all(|cell| cells::is_blank(Some(cell))))
}

fn with_header(headers: &[&str], rows: impl IntoIterator<Item = Row>) -> Vec<Row> {
    let header: Row = headers.iter().map(|h| Value::from(*h)).collect();
    std::iter::once(header).chain(rows).collect()
}

/// `createdAt` cell, falling back to the load time when unreadable.
fn created_at(cell: Option<&Value>, loaded_at: DateTime<Utc>) -> DateTime<Utc> {
    cells::as_timestamp(cell).unwrap_or(loaded_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::MemoryTabularStore;
    use chrono::TimeZone;
    use serde_json::json;
    use tienda_core::{Category, EventDate, Money, Product, Sale, SaleItem, StockMovement};

    fn sample_data() -> AppData {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        AppData {
            products: vec![
                Product {
                    id: "p1".into(),
                    name: "Funda iPhone 15".into(),
                    sku: Some("SKU-0001".into()),
                    category: Category::Funda,
                    model: Some("iPhone 15".into()),
                    color: Some("Negro".into()),
                    default_unit_price: Money::from_pesos(9000),
                    created_at: created,
                },
                Product {
                    id: "p2".into(),
                    name: "Cargador".into(),
                    sku: None,
                    category: Category::Accesorio,
                    model: None,
                    color: None,
                    default_unit_price: Money::from_cents(450050),
                    created_at: created,
                },
            ],
            stock_movements: vec![StockMovement {
                id: "m1".into(),
                product_id: "p1".into(),
                quantity: 10,
                date: EventDate::new("2024-03-01"),
                created_at: created,
            }],
            sales: vec![Sale {
                id: "s1".into(),
                date: EventDate::new("2024-03-15T14:00:00.000Z"),
                payment_method: "efectivo".into(),
                total_amount: Money::from_pesos(17000),
                items: vec![SaleItem::new("p1", "Funda iPhone 15", Money::from_pesos(9000), 2)],
            }],
        }
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_dataset() {
        let repo = SheetRepository::new(MemoryTabularStore::new());
        let data = sample_data();

        repo.save_all(&data).await.unwrap();
        let loaded = repo.load_all().await.unwrap();

        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn test_save_writes_headers_and_rows() {
        let store = MemoryTabularStore::new();
        let repo = SheetRepository::new(store.clone());
        repo.save_all(&sample_data()).await.unwrap();

        let products = store.sheet("products").await.unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0][0], json!("id"));
        assert_eq!(products[2][2], json!(""));
        assert_eq!(products[2][6], json!(4500.5));

        let movements = store.sheet("stockMovements").await.unwrap();
        assert_eq!(movements[1], vec![
            json!("m1"),
            json!("p1"),
            json!(10),
            json!("2024-03-01"),
            json!("2024-03-01T12:00:00.000Z"),
        ]);
    }

    #[tokio::test]
    async fn test_load_skips_header_and_blank_rows() {
        let store = MemoryTabularStore::new()
            .with_sheet("products", vec![
                vec![json!("id"), json!("name")],
                vec![json!(""), json!(null)],
                vec![json!("p9"), json!("Suelto")],
            ])
            .with_sheet("stockMovements", vec![])
            .with_sheet("sales", vec![vec![json!("id")]]);

        let data = SheetRepository::new(store).load_all().await.unwrap();
        assert_eq!(data.products.len(), 1);
        assert_eq!(data.products[0].id, "p9");
        assert!(data.stock_movements.is_empty());
        assert!(data.sales.is_empty());
    }

    #[tokio::test]
    async fn test_missing_sheet_fails_load() {
        let store = MemoryTabularStore::new().with_sheet("products", vec![]);
        assert!(SheetRepository::new(store).load_all().await.is_err());
    }

    #[tokio::test]
    async fn test_custom_sheet_names() {
        let store = MemoryTabularStore::new();
        let repo = SheetRepository::new(store.clone())
            .with_names(SheetNames::default().with_sales("ventas"));
        repo.save_all(&AppData::new()).await.unwrap();

        assert_eq!(store.sheet_names().await, vec!["products", "stockMovements", "ventas"]);
    }
}
