//! # Data Synchronizer
//!
//! Owns the in-memory dataset and keeps the spreadsheet in step with it.
//!
//! ## Update Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Optimistic Update                                  │
//! │                                                                         │
//! │  UI action                                                              │
//! │     │ command(&AppData) → DataEvent       (rejected → nothing changes)  │
//! │     ▼                                                                   │
//! │  ┌──────────────────────┐                                               │
//! │  │ RwLock<AppData>      │  event applied locally, listeners notified    │
//! │  └──────────┬───────────┘                                               │
//! │             │ snapshot                                                  │
//! │             ▼                                                           │
//! │  Repository::save_all  ── all three sheets replaced                     │
//! │             │                                                           │
//! │        ok ──┴── error: logged and returned, local update KEPT           │
//! │                                                                         │
//! │  No web app configured: the dataset starts empty and saves are          │
//! │  skipped with a warning.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Last writer wins: there is no merge with whatever another client wrote to
//! the sheet in the meantime.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tienda_core::{AppData, CoreResult, DataEvent};
use tienda_store::{Repository, SheetRepository};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::client::{AppsScriptClient, ClientConfig};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Sync Status
// =============================================================================

/// What the synchronizer is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Reading the sheets.
    Loading,
    /// Writing the sheets.
    Saving,
    /// No web app configured; local only.
    Offline,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Loading => write!(f, "loading"),
            SyncState::Saving => write!(f, "saving"),
            SyncState::Offline => write!(f, "offline"),
        }
    }
}

/// Current sync status for external queries.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    pub state: SyncState,

    /// Last successful load.
    pub last_load: Option<DateTime<Utc>>,

    /// Last successful save.
    pub last_save: Option<DateTime<Utc>>,

    /// Last error message (cleared by the next success).
    pub last_error: Option<String>,
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives synchronizer notifications (a UI, a log, a test probe).
pub trait SyncEventEmitter: Send + Sync {
    /// The dataset changed locally.
    fn emit_data(&self, data: &AppData);

    /// The status changed.
    fn emit_status(&self, status: &SyncStatus);

    /// A load or save failed.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_data(&self, _data: &AppData) {}
    fn emit_status(&self, _status: &SyncStatus) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}

// =============================================================================
// Data Synchronizer
// =============================================================================

/// The `updateData` sink: applies changes locally, then persists wholesale.
///
/// ## Usage
/// ```rust,ignore
/// let sync = DataSynchronizer::from_config(&config)?;
/// sync.load().await.ok();
///
/// sync.execute(|data| create_sale(data, &draft)).await?;
/// let stock = sync.read(|data| available_stock("p1", data)).await;
/// ```
pub struct DataSynchronizer {
    repository: Option<Arc<dyn Repository>>,
    data: RwLock<AppData>,
    status: RwLock<SyncStatus>,
    /// Serializes mutate-then-save so saves land in mutation order.
    write_gate: Mutex<()>,
    emitter: Arc<dyn SyncEventEmitter>,
}

impl DataSynchronizer {
    /// Creates a synchronizer persisting through `repository`.
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self::build(Some(repository), SyncState::Idle)
    }

    /// Creates a synchronizer with no persistence.
    pub fn offline() -> Self {
        Self::build(None, SyncState::Offline)
    }

    /// Wires the web app client from configuration. Without a URL the
    /// synchronizer runs offline.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        if !config.is_configured() {
            warn!("Web app URL not configured, running without persistence");
            return Ok(Self::offline());
        }

        let client = AppsScriptClient::new(ClientConfig::from_sync_config(config)?)?;
        info!(url = %client.endpoint(), "Using spreadsheet web app");
        let repository = SheetRepository::new(client).with_names(config.sheet_names());
        Ok(Self::new(Arc::new(repository)))
    }

    fn build(repository: Option<Arc<dyn Repository>>, state: SyncState) -> Self {
        DataSynchronizer {
            repository,
            data: RwLock::new(AppData::new()),
            status: RwLock::new(SyncStatus {
                state,
                ..SyncStatus::default()
            }),
            write_gate: Mutex::new(()),
            emitter: Arc::new(NoOpEmitter),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Whether writes reach a backing store.
    pub fn is_persistent(&self) -> bool {
        self.repository.is_some()
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// A copy of the current dataset.
    pub async fn snapshot(&self) -> AppData {
        self.data.read().await.clone()
    }

    /// Runs `f` against the current dataset without copying it.
    pub async fn read<R>(&self, f: impl FnOnce(&AppData) -> R) -> R {
        f(&*self.data.read().await)
    }

    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replaces the local dataset with what the sheets hold.
    ///
    /// On failure the current dataset is kept (empty on first load) and the
    /// error is returned. Offline, this is a no-op.
    pub async fn load(&self) -> SyncResult<()> {
        let Some(repository) = self.repository.as_ref() else {
            debug!("Offline, nothing to load");
            return Ok(());
        };

        let _gate = self.write_gate.lock().await;
        self.set_state(SyncState::Loading).await;

        match repository.load_all().await {
            Ok(loaded) => {
                {
                    let mut data = self.data.write().await;
                    *data = loaded;
                    self.emitter.emit_data(&data);
                }
                self.finish(|status| status.last_load = Some(Utc::now())).await;
                Ok(())
            }
            Err(e) => {
                let err = SyncError::from(e);
                warn!(error = %err, "Failed to load dataset, keeping local data");
                self.fail(&err).await;
                Err(err)
            }
        }
    }

    /// Reloads from the sheets. Alias of [`DataSynchronizer::load`].
    pub async fn refresh(&self) -> SyncResult<()> {
        self.load().await
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Builds an event from the current dataset, applies it and saves.
    ///
    /// The command runs under the write lock, so it sees the same dataset
    /// the event is applied to. A rejected command changes nothing.
    pub async fn execute<F>(&self, command: F) -> SyncResult<()>
    where
        F: FnOnce(&AppData) -> CoreResult<DataEvent>,
    {
        let _gate = self.write_gate.lock().await;
        let snapshot = {
            let mut data = self.data.write().await;
            let event = command(&*data)?;
            self.apply_locked(&mut *data, event)?;
            data.clone()
        };
        self.persist(&snapshot).await
    }

    /// Applies an already-built event and saves.
    pub async fn apply(&self, event: DataEvent) -> SyncResult<()> {
        let _gate = self.write_gate.lock().await;
        let snapshot = {
            let mut data = self.data.write().await;
            self.apply_locked(&mut *data, event)?;
            data.clone()
        };
        self.persist(&snapshot).await
    }

    /// Replaces the whole dataset and saves it.
    pub async fn replace(&self, new_data: AppData) -> SyncResult<()> {
        let _gate = self.write_gate.lock().await;
        {
            let mut data = self.data.write().await;
            *data = new_data.clone();
            self.emitter.emit_data(&data);
        }
        self.persist(&new_data).await
    }

    fn apply_locked(&self, data: &mut AppData, event: DataEvent) -> SyncResult<()> {
        let kind = event.kind();
        data.apply(event)?;
        debug!(event = kind, "Applied event locally");
        self.emitter.emit_data(data);
        Ok(())
    }

    /// Saves `snapshot`. A failure leaves the local dataset as it is.
    async fn persist(&self, snapshot: &AppData) -> SyncResult<()> {
        let Some(repository) = self.repository.as_ref() else {
            warn!("Web app URL not configured, change kept locally only");
            return Ok(());
        };

        self.set_state(SyncState::Saving).await;
        match repository.save_all(snapshot).await {
            Ok(()) => {
                self.finish(|status| status.last_save = Some(Utc::now())).await;
                Ok(())
            }
            Err(e) => {
                let err = SyncError::from(e);
                warn!(error = %err, "Failed to save dataset, local change kept");
                self.fail(&err).await;
                Err(err)
            }
        }
    }

    // =========================================================================
    // Status
    // =========================================================================

    async fn set_state(&self, state: SyncState) {
        let mut status = self.status.write().await;
        status.state = state;
        self.emitter.emit_status(&status);
    }

    async fn finish(&self, record: impl FnOnce(&mut SyncStatus)) {
        let mut status = self.status.write().await;
        status.state = SyncState::Idle;
        status.last_error = None;
        record(&mut status);
        self.emitter.emit_status(&status);
    }

    async fn fail(&self, err: &SyncError) {
        let mut status = self.status.write().await;
        status.state = SyncState::Idle;
        status.last_error = Some(err.to_string());
        self.emitter.emit_status(&status);
        self.emitter.emit_error(&err.to_string(), err.is_retryable());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tienda_core::commands::{
        create_product, create_sale, ProductDraft, SaleDraft, SaleLineDraft,
    };
    use tienda_core::ledger::available_stock;
    use tienda_core::{Category, CoreError, EventDate, Money};
    use tienda_store::{MemoryTabularStore, StoreError, StoreResult};

    /// Repository whose saves can be switched to fail.
    struct FlakyRepository {
        inner: SheetRepository<MemoryTabularStore>,
        fail_saves: AtomicBool,
        saves: AtomicUsize,
    }

    impl FlakyRepository {
        fn new(store: MemoryTabularStore) -> Self {
            FlakyRepository {
                inner: SheetRepository::new(store),
                fail_saves: AtomicBool::new(false),
                saves: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Repository for FlakyRepository {
        async fn load_all(&self) -> StoreResult<AppData> {
            self.inner.load_all().await
        }

        async fn save_all(&self, data: &AppData) -> StoreResult<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::write("sales", "HTTP 500"));
            }
            self.inner.save_all(data).await
        }
    }

    #[derive(Default)]
    struct CountingEmitter {
        data: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SyncEventEmitter for CountingEmitter {
        fn emit_data(&self, _data: &AppData) {
            self.data.fetch_add(1, Ordering::SeqCst);
        }
        fn emit_status(&self, _status: &SyncStatus) {}
        fn emit_error(&self, _message: &str, _retryable: bool) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Funda iPhone 15".into(),
            category: Category::Funda,
            model: Some("iPhone 15".into()),
            color: None,
            default_unit_price: Money::from_pesos(9000),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn sale_of(product_id: &str, quantity: i64) -> SaleDraft {
        SaleDraft {
            date: EventDate::new("2024-03-15"),
            payment_method: "efectivo".into(),
            lines: vec![SaleLineDraft {
                product_id: product_id.into(),
                quantity,
                unit_price: Money::from_pesos(9000),
            }],
            total_override: None,
        }
    }

    #[tokio::test]
    async fn test_execute_persists_to_sheets() {
        let store = MemoryTabularStore::new();
        let sync = DataSynchronizer::new(Arc::new(SheetRepository::new(store.clone())));

        sync.execute(|data| create_product(data, &draft(), 10, now()))
            .await
            .unwrap();

        assert_eq!(store.sheet("products").await.unwrap().len(), 2);
        assert_eq!(store.sheet("stockMovements").await.unwrap().len(), 2);
        assert!(sync.status().await.last_save.is_some());

        let reloaded = SheetRepository::new(store).load_all().await.unwrap();
        assert_eq!(reloaded, sync.snapshot().await);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_local_update() {
        let repo = Arc::new(FlakyRepository::new(MemoryTabularStore::new()));
        let emitter = Arc::new(CountingEmitter::default());
        let sync = DataSynchronizer::new(repo.clone()).with_emitter(emitter.clone());

        sync.execute(|data| create_product(data, &draft(), 10, now()))
            .await
            .unwrap();
        let product_id = sync.read(|data| data.products[0].id.clone()).await;

        repo.fail_saves.store(true, Ordering::SeqCst);
        let err = sync
            .execute(|data| create_sale(data, &sale_of(&product_id, 4)))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Store(_)));
        assert_eq!(sync.read(|data| available_stock(&product_id, data)).await, 6);
        assert!(sync.status().await.last_error.is_some());
        assert_eq!(emitter.errors.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.data.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_command_changes_nothing() {
        let repo = Arc::new(FlakyRepository::new(MemoryTabularStore::new()));
        let sync = DataSynchronizer::new(repo.clone());

        sync.execute(|data| create_product(data, &draft(), 3, now()))
            .await
            .unwrap();
        let before = sync.snapshot().await;
        let product_id = before.products[0].id.clone();

        let err = sync
            .execute(|data| create_sale(data, &sale_of(&product_id, 5)))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(sync.snapshot().await, before);
        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_empty_dataset() {
        // No sheets at all: every read fails.
        let sync = DataSynchronizer::new(Arc::new(SheetRepository::new(MemoryTabularStore::new())));

        assert!(sync.load().await.is_err());
        assert!(sync.snapshot().await.is_empty());
        let status = sync.status().await;
        assert_eq!(status.state, SyncState::Idle);
        assert!(status.last_error.is_some());
        assert!(status.last_load.is_none());
    }

    #[tokio::test]
    async fn test_load_replaces_local_data() {
        let store = MemoryTabularStore::new();
        let writer = DataSynchronizer::new(Arc::new(SheetRepository::new(store.clone())));
        writer
            .execute(|data| create_product(data, &draft(), 2, now()))
            .await
            .unwrap();

        let reader = DataSynchronizer::new(Arc::new(SheetRepository::new(store)));
        reader.refresh().await.unwrap();
        assert_eq!(reader.snapshot().await, writer.snapshot().await);
        assert!(reader.status().await.last_load.is_some());
    }

    #[tokio::test]
    async fn test_offline_keeps_changes_locally() {
        let sync = DataSynchronizer::from_config(&SyncConfig::default()).unwrap();
        assert!(!sync.is_persistent());
        assert_eq!(sync.status().await.state, SyncState::Offline);

        sync.load().await.unwrap();
        sync.execute(|data| create_product(data, &draft(), 1, now()))
            .await
            .unwrap();
        assert_eq!(sync.read(|data| data.products.len()).await, 1);
    }

    #[tokio::test]
    async fn test_replace_saves_everything() {
        let store = MemoryTabularStore::new();
        let sync = DataSynchronizer::new(Arc::new(SheetRepository::new(store.clone())));

        sync.replace(AppData::new()).await.unwrap();
        assert_eq!(store.sheet_names().await, vec!["products", "sales", "stockMovements"]);
    }
}
