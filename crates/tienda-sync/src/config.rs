//! # Sync Configuration
//!
//! Where the spreadsheet web app lives and how hard to try reaching it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TIENDA_WEB_APP_URL=https://script.google.com/macros/s/.../exec     │
//! │     TIENDA_REQUEST_TIMEOUT_SECS=30                                     │
//! │     TIENDA_MAX_RETRIES=3                                               │
//! │     TIENDA_PRODUCTS_SHEET / TIENDA_STOCK_SHEET / TIENDA_SALES_SHEET    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tienda/sync.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.tienda.tienda/sync.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     No URL (offline), 30 s timeout, 3 retries                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [web_app]
//! url = "https://script.google.com/macros/s/AKfy.../exec"
//! request_timeout_secs = 30
//! max_retries = 3
//!
//! [sheets]
//! products = "products"
//! stock_movements = "stockMovements"
//! sales = "sales"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tienda_store::SheetNames;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

/// Host the spreadsheet web apps are deployed under.
pub const EXPECTED_WEB_APP_HOST: &str = "script.google.com";

// =============================================================================
// Web App Settings
// =============================================================================

/// Connection settings for the web app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppSettings {
    /// Deployed web app URL. `None` runs without persistence.
    #[serde(default)]
    pub url: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Retries after the first attempt for retryable failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff duration (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff duration (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    500
}
fn default_max_backoff() -> u64 {
    10
}

impl Default for WebAppSettings {
    fn default() -> Self {
        WebAppSettings {
            url: None,
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

// =============================================================================
// Sheet Settings
// =============================================================================

/// Tab names inside the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSettings {
    #[serde(default = "default_products_sheet")]
    pub products: String,

    #[serde(default = "default_stock_sheet")]
    pub stock_movements: String,

    #[serde(default = "default_sales_sheet")]
    pub sales: String,
}

fn default_products_sheet() -> String {
    "products".to_string()
}
fn default_stock_sheet() -> String {
    "stockMovements".to_string()
}
fn default_sales_sheet() -> String {
    "sales".to_string()
}

impl Default for SheetSettings {
    fn default() -> Self {
        SheetSettings {
            products: default_products_sheet(),
            stock_movements: default_stock_sheet(),
            sales: default_sales_sheet(),
        }
    }
}

impl From<&SheetSettings> for SheetNames {
    fn from(sheets: &SheetSettings) -> Self {
        SheetNames::default()
            .with_products(sheets.products.as_str())
            .with_stock_movements(sheets.stock_movements.as_str())
            .with_sales(sheets.sales.as_str())
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub web_app: WebAppSettings,

    #[serde(default)]
    pub sheets: SheetSettings,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the web app URL. Builder style.
    pub fn with_web_app_url(mut self, url: impl Into<String>) -> Self {
        self.web_app.url = Some(url.into());
        self
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// A URL outside the usual web app host only logs a warning: proxies and
    /// test servers are legitimate.
    pub fn validate(&self) -> SyncResult<()> {
        if let Some(raw) = self.web_app.url.as_deref() {
            let url = Url::parse(raw)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(SyncError::InvalidUrl(format!(
                    "Web app URL must use http or https, got: {}",
                    raw
                )));
            }
            if url.host_str() != Some(EXPECTED_WEB_APP_HOST) {
                warn!(url = %raw, "Web app URL is not a {} deployment", EXPECTED_WEB_APP_HOST);
            }
        }

        if self.web_app.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        let sheets = [
            &self.sheets.products,
            &self.sheets.stock_movements,
            &self.sheets.sales,
        ];
        if sheets.iter().any(|name| name.trim().is_empty()) {
            return Err(SyncError::InvalidConfig("sheet names cannot be empty".into()));
        }
        if sheets[0] == sheets[1] || sheets[0] == sheets[2] || sheets[1] == sheets[2] {
            return Err(SyncError::InvalidConfig("sheet names must be distinct".into()));
        }

        Ok(())
    }

    /// Applies overrides from `lookup` (the process environment in
    /// [`SyncConfig::load`]).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TIENDA_WEB_APP_URL") {
            debug!(url = %url, "Overriding web app URL from environment");
            self.web_app.url = if url.trim().is_empty() { None } else { Some(url) };
        }

        if let Some(timeout) = lookup("TIENDA_REQUEST_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.web_app.request_timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid TIENDA_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Some(retries) = lookup("TIENDA_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(n) => self.web_app.max_retries = n,
                Err(_) => warn!(value = %retries, "Ignoring invalid TIENDA_MAX_RETRIES"),
            }
        }

        if let Some(name) = lookup("TIENDA_PRODUCTS_SHEET") {
            self.sheets.products = name;
        }
        if let Some(name) = lookup("TIENDA_STOCK_SHEET") {
            self.sheets.stock_movements = name;
        }
        if let Some(name) = lookup("TIENDA_SALES_SHEET") {
            self.sheets.sales = name;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tienda", "tienda")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn web_app_url(&self) -> Option<&str> {
        self.web_app.url.as_deref()
    }

    /// Returns true if a web app URL is set.
    pub fn is_configured(&self) -> bool {
        self.web_app.url.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.web_app.request_timeout_secs)
    }

    pub fn sheet_names(&self) -> SheetNames {
        SheetNames::from(&self.sheets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.web_app.max_retries, 3);
        assert_eq!(config.sheet_names(), SheetNames::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::new().with_web_app_url("not a url");
        assert!(config.validate().unwrap_err().is_config_error());

        config.web_app.url = Some("ftp://script.google.com/x".into());
        assert!(config.validate().is_err());

        // Unusual host is only a warning
        config.web_app.url = Some("http://localhost:8080/exec".into());
        assert!(config.validate().is_ok());

        config.web_app.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.web_app.request_timeout_secs = 5;
        config.sheets.sales = "products".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = SyncConfig::default();
        config.apply_overrides(env(&[
            ("TIENDA_WEB_APP_URL", "https://script.google.com/macros/s/abc/exec"),
            ("TIENDA_REQUEST_TIMEOUT_SECS", "12"),
            ("TIENDA_MAX_RETRIES", "muchos"),
            ("TIENDA_SALES_SHEET", "ventas"),
        ]));

        assert_eq!(config.web_app_url(), Some("https://script.google.com/macros/s/abc/exec"));
        assert_eq!(config.web_app.request_timeout_secs, 12);
        assert_eq!(config.web_app.max_retries, 3);
        assert_eq!(config.sheet_names().sales, "ventas");
        assert_eq!(config.sheet_names().products, "products");
    }

    #[test]
    fn test_blank_url_override_disables_sync() {
        let mut config = SyncConfig::new().with_web_app_url("https://script.google.com/x");
        config.apply_overrides(env(&[("TIENDA_WEB_APP_URL", "  ")]));
        assert!(!config.is_configured());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SyncConfig::new().with_web_app_url("https://script.google.com/x");
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[web_app]"));
        assert!(toml_str.contains("[sheets]"));

        let parsed: SyncConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: SyncConfig = toml::from_str("[web_app]\nmax_retries = 0\n").unwrap();
        assert_eq!(parsed.web_app.max_retries, 0);
        assert_eq!(parsed.web_app.request_timeout_secs, 30);
        assert_eq!(parsed.sheets.stock_movements, "stockMovements");
    }
}
