//! # Store Error Types
//!
//! Error types for tabular store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Backend failure (HTTP, in-memory lookup, JSON encoding)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds the sheet name                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SyncError (tienda-sync) ← Retry / config categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Logged; the in-memory dataset is kept as it is                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Malformed CELLS are never an error: the row codecs coerce them to
//! defaults. Only whole-sheet failures end up here.

use thiserror::Error;

/// Tabular store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend has no sheet with this name.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Reading a sheet failed.
    ///
    /// ## When This Occurs
    /// - Web app unreachable or answered with an error status
    /// - Response body was not the expected `{ "values": [...] }` shape
    #[error("Failed to read sheet '{sheet}': {message}")]
    Read { sheet: String, message: String },

    /// Writing a sheet failed.
    ///
    /// ## When This Occurs
    /// - Web app unreachable or answered with an error status
    /// - Web app answered without reporting success
    #[error("Failed to write sheet '{sheet}': {message}")]
    Write { sheet: String, message: String },

    /// Dataset could not be encoded into rows.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl StoreError {
    /// Creates a Read error for a sheet.
    pub fn read(sheet: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Read {
            sheet: sheet.into(),
            message: message.into(),
        }
    }

    /// Creates a Write error for a sheet.
    pub fn write(sheet: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Write {
            sheet: sheet.into(),
            message: message.into(),
        }
    }

    /// Name of the sheet involved, when there is one.
    pub fn sheet(&self) -> Option<&str> {
        match self {
            StoreError::SheetNotFound(sheet)
            | StoreError::Read { sheet, .. }
            | StoreError::Write { sheet, .. } => Some(sheet),
            StoreError::Encode(_) => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Encode(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
