//! # tienda-core: Pure Business Logic for Tienda
//!
//! This crate is the **heart** of Tienda, a small shop's inventory and sales
//! tool backed by a spreadsheet. It contains all business logic as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tienda Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 UI (forms, tables, charts)                      │   │
//! │  │   Inventario ──► Ventas ──► Reportes                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                   drafts ▼     │     ▲ derived figures                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tienda-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  ledger  │ │   sku    │ │  report  │ │ commands         │  │   │
//! │  │   │  stock   │ │ SKU-0001 │ │ by day   │ │ draft → event    │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │  money   │ │inventory │ │ validation       │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ AppData                                │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          tienda-store / tienda-sync (sheet persistence)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, StockMovement, Sale, AppData)
//! - [`money`] - Money type with integer arithmetic
//! - [`ledger`] - Available stock, units sold, last sale
//! - [`sku`] - Sequential SKU codes
//! - [`report`] - Sales grouped by local day, pagination
//! - [`validation`] - Field checks and the sale stock check
//! - [`commands`] - Drafts turned into dataset events
//! - [`inventory`] - Inventory table rows, filters, facets
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Derived, never stored**: stock is recomputed from the event logs
//! 2. **No I/O**: the spreadsheet is somebody else's problem
//! 3. **Integer Money**: all monetary values are in centavos (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use tienda_core::commands::{create_product, ProductDraft};
//! use tienda_core::ledger::available_stock;
//! use tienda_core::{AppData, Category, Money};
//!
//! let mut data = AppData::new();
//! let draft = ProductDraft {
//!     name: "Vidrio templado".into(),
//!     category: Category::Accesorio,
//!     model: None,
//!     color: None,
//!     default_unit_price: Money::from_pesos(3500),
//! };
//!
//! let event = create_product(&data, &draft, 12, Utc::now()).unwrap();
//! data.apply(event).unwrap();
//!
//! let id = data.products[0].id.clone();
//! assert_eq!(available_stock(&id, &data), 12);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commands;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod report;
pub mod sku;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tienda_core::Money` instead of
// `use tienda_core::money::Money`

pub use commands::DataEvent;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Shown in place of a product name when the product has been deleted but
/// movements or sale items still reference it.
pub const ORPHANED_PRODUCT_LABEL: &str = "product deleted";
