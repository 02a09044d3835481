//! # tienda-store: Sheet Persistence for Tienda
//!
//! This crate stores the Tienda dataset as three spreadsheet tabs. It knows
//! the row format; it does not know where the rows travel.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tienda Data Flow                                 │
//! │                                                                         │
//! │  DataSynchronizer (tienda-sync)                                         │
//! │       │  AppData                                                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tienda-store (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │  Repository   │    │  Row codecs   │    │    cells     │   │   │
//! │  │   │ load_all()    │───►│ product.rs    │───►│ lenient      │   │   │
//! │  │   │ save_all()    │    │ stock.rs      │    │ coercion     │   │   │
//! │  │   │               │    │ sale.rs       │    │              │   │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘   │   │
//! │  │           │ Vec<Row>                                            │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │ TabularStore: MemoryTabularStore | AppsScriptClient (HTTP)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`tabular`] - The store trait and an in-memory implementation
//! - [`repository`] - Whole-dataset load and save, row codecs
//! - [`cells`] - Cell coercion helpers
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tienda_store::{MemoryTabularStore, Repository, SheetRepository};
//!
//! let repo = SheetRepository::new(MemoryTabularStore::new());
//! repo.save_all(&data).await?;
//! let data = repo.load_all().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cells;
pub mod error;
pub mod repository;
pub mod tabular;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use repository::{Repository, SheetNames, SheetRepository};
pub use tabular::{MemoryTabularStore, Row, TabularStore};
