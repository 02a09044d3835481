//! # Tabular Store
//!
//! The persistence boundary: something that can hand back a sheet as rows
//! and replace a sheet with new rows. Nothing more.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │               trait TabularStore                                        │
//! │         read_sheet(name)  → Vec<Row>                                    │
//! │         write_sheet(name, Vec<Row>)   (replaces everything)             │
//! │                     ▲                        ▲                          │
//! │                     │                        │                          │
//! │        MemoryTabularStore         AppsScriptClient (tienda-sync)        │
//! │        tests, offline use         spreadsheet web app over HTTP         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row 0 of every sheet is the header row. Stores don't interpret it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// One sheet row: positional cells.
pub type Row = Vec<Value>;

/// Bulk sheet access.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Every row of the sheet, header included.
    async fn read_sheet(&self, name: &str) -> StoreResult<Vec<Row>>;

    /// Replaces the sheet's content with `rows`.
    async fn write_sheet(&self, name: &str, rows: Vec<Row>) -> StoreResult<()>;
}

#[async_trait]
impl<T: TabularStore + ?Sized> TabularStore for Arc<T> {
    async fn read_sheet(&self, name: &str) -> StoreResult<Vec<Row>> {
        (**self).read_sheet(name).await
    }

    async fn write_sheet(&self, name: &str, rows: Vec<Row>) -> StoreResult<()> {
        (**self).write_sheet(name, rows).await
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// A store kept in process memory.
///
/// Reading a sheet that was never written fails with
/// [`StoreError::SheetNotFound`], like a spreadsheet missing a tab.
///
/// ## Usage
/// ```rust,ignore
/// use serde_json::json;
/// use tienda_store::{MemoryTabularStore, TabularStore};
///
/// let store = MemoryTabularStore::new().with_sheet("sales", vec![vec![json!("id")]]);
/// assert_eq!(store.read_sheet("sales").await.unwrap().len(), 1);
/// assert!(store.read_sheet("missing").await.is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTabularStore {
    sheets: Arc<RwLock<HashMap<String, Vec<Row>>>>,
}

impl MemoryTabularStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a sheet. Builder style, for tests.
    pub fn with_sheet(self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        if let Ok(mut sheets) = self.sheets.try_write() {
            sheets.insert(name.into(), rows);
        }
        self
    }

    /// Current content of a sheet, if it exists.
    pub async fn sheet(&self, name: &str) -> Option<Vec<Row>> {
        self.sheets.read().await.get(name).cloned()
    }

    pub async fn sheet_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sheets.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl TabularStore for MemoryTabularStore {
    async fn read_sheet(&self, name: &str) -> StoreResult<Vec<Row>> {
        let sheets = self.sheets.read().await;
        let rows = sheets
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::SheetNotFound(name.to_string()))?;
        debug!(sheet = %name, rows = rows.len(), "Read sheet from memory");
        Ok(rows)
    }

    async fn write_sheet(&self, name: &str, rows: Vec<Row>) -> StoreResult<()> {
        debug!(sheet = %name, rows = rows.len(), "Wrote sheet to memory");
        self.sheets.write().await.insert(name.to_string(), rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_replaces_whole_sheet() {
        let store = MemoryTabularStore::new();
        store
            .write_sheet("products", vec![vec![json!("id")], vec![json!("a")], vec![json!("b")]])
            .await
            .unwrap();
        store
            .write_sheet("products", vec![vec![json!("id")]])
            .await
            .unwrap();
        assert_eq!(store.read_sheet("products").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_sheet() {
        let store = MemoryTabularStore::new();
        assert!(matches!(
            store.read_sheet("nope").await,
            Err(StoreError::SheetNotFound(name)) if name == "nope"
        ));
    }

    #[tokio::test]
    async fn test_clones_share_content() {
        let store = MemoryTabularStore::new().with_sheet("a", vec![]);
        let other = store.clone();
        other.write_sheet("b", vec![]).await.unwrap();
        assert_eq!(store.sheet_names().await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_arc_store_delegates() {
        let store: Arc<dyn TabularStore> = Arc::new(MemoryTabularStore::new());
        store.write_sheet("x", vec![vec![json!(1)]]).await.unwrap();
        assert_eq!(store.read_sheet("x").await.unwrap(), vec![vec![json!(1)]]);
    }
}
