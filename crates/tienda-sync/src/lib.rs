//! # tienda-sync: Spreadsheet Sync for Tienda
//!
//! This crate keeps the Tienda dataset in a spreadsheet, through the web app
//! deployed on it. The dataset lives in memory; every change is applied
//! locally first and then written back wholesale.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Architecture                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 DataSynchronizer (updateData sink)               │  │
//! │  │                                                                  │  │
//! │  │  load() / refresh()   execute(command)   apply(event)            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ Repository (tienda-store)              │
//! │                               ▼                                         │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │ SheetRepository<AppsScriptClient>                              │    │
//! │  │   products / stockMovements / sales, read and written at once  │    │
//! │  └────────────────────────────┬───────────────────────────────────┘    │
//! │                               │ HTTP (reqwest, timeout + backoff)       │
//! │                               ▼                                         │
//! │                  Spreadsheet web app (Apps Script)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`synchronizer`] - `DataSynchronizer`, status and event emitter
//! - [`client`] - Web app HTTP client with retries
//! - [`config`] - Sync configuration (URL, timeout, sheet names)
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tienda_sync::{DataSynchronizer, SyncConfig};
//!
//! let config = SyncConfig::load_or_default(None);
//! let sync = DataSynchronizer::from_config(&config)?;
//!
//! // A failed load leaves an empty dataset to work with
//! if let Err(e) = sync.load().await {
//!     eprintln!("Working offline: {e}");
//! }
//!
//! sync.execute(|data| create_sale(data, &draft)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod synchronizer;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{AppsScriptClient, ClientConfig};
pub use config::{SheetSettings, SyncConfig, WebAppSettings};
pub use error::{SyncError, SyncResult};
pub use synchronizer::{DataSynchronizer, NoOpEmitter, SyncEventEmitter, SyncState, SyncStatus};
