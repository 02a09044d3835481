//! # Apps Script Client
//!
//! HTTP client for the spreadsheet web app, implementing [`TabularStore`].
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Web App Requests                                │
//! │                                                                         │
//! │  READ                                                                   │
//! │  GET {url}?action=read&sheet=products                                   │
//! │    ◄── 200 {"values": [["id","name",...], ["p1","Funda",...]]}          │
//! │        (no "values" key reads as an empty sheet)                        │
//! │                                                                         │
//! │  WRITE (replaces the whole sheet)                                       │
//! │  POST {url}  {"action":"write","sheet":"products","values":[[...]]}     │
//! │    ◄── 200 {"success": true}                                            │
//! │    ◄── 200 text containing "success"  (plain-text deployments)          │
//! │                                                                         │
//! │  RETRIES (Exponential with Jitter)                                      │
//! │  ─────────────────────────────────                                      │
//! │  connection errors, timeouts, HTTP 5xx / 429                            │
//! │  Attempt 1: 500ms, Attempt 2: 1s, ... up to max_retries                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tienda_store::{Row, StoreError, StoreResult, TabularStore};
use tracing::{debug, error, warn};
use url::Url;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Client Configuration
// =============================================================================

/// Settings for [`AppsScriptClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Web app endpoint.
    pub url: Url,

    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Retries after the first attempt (0 = no retries).
    pub max_retries: u32,

    /// Initial backoff duration.
    pub initial_backoff: Duration,

    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl ClientConfig {
    pub fn new(url: Url) -> Self {
        ClientConfig {
            url,
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }

    /// Builds client settings from the sync configuration.
    ///
    /// Fails with [`SyncError::NotConfigured`] when no URL is set.
    pub fn from_sync_config(config: &SyncConfig) -> SyncResult<Self> {
        let raw = config.web_app_url().ok_or(SyncError::NotConfigured)?;
        Ok(ClientConfig {
            url: Url::parse(raw)?,
            request_timeout: config.request_timeout(),
            max_retries: config.web_app.max_retries,
            initial_backoff: Duration::from_millis(config.web_app.initial_backoff_ms),
            max_backoff: Duration::from_secs(config.web_app.max_backoff_secs),
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    values: Option<Vec<Row>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    action: &'static str,
    sheet: &'a str,
    values: &'a [Row],
}

// =============================================================================
// Client
// =============================================================================

/// Client for the spreadsheet web app.
///
/// ## Usage
/// ```rust,ignore
/// let client = AppsScriptClient::new(ClientConfig::from_sync_config(&config)?)?;
/// let rows = client.read("products").await?;
/// client.write("products", rows).await?;
/// ```
#[derive(Debug, Clone)]
pub struct AppsScriptClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl AppsScriptClient {
    pub fn new(config: ClientConfig) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client: {}", e)))?;
        Ok(AppsScriptClient { http, config })
    }

    pub fn endpoint(&self) -> &Url {
        &self.config.url
    }

    /// Reads every row of a sheet, header included.
    pub async fn read(&self, sheet: &str) -> SyncResult<Vec<Row>> {
        let rows = self.with_retry("read", sheet, || self.read_once(sheet)).await?;
        debug!(sheet = %sheet, rows = rows.len(), "Read sheet from web app");
        Ok(rows)
    }

    /// Replaces a sheet with `rows`.
    pub async fn write(&self, sheet: &str, rows: &[Row]) -> SyncResult<()> {
        self.with_retry("write", sheet, || self.write_once(sheet, rows)).await?;
        debug!(sheet = %sheet, rows = rows.len(), "Wrote sheet to web app");
        Ok(())
    }

    async fn read_once(&self, sheet: &str) -> SyncResult<Vec<Row>> {
        let mut url = self.config.url.clone();
        url.query_pairs_mut()
            .append_pair("action", "read")
            .append_pair("sheet", sheet);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ReadResponse = serde_json::from_str(&body)
            .map_err(|e| SyncError::InvalidResponse(format!("read '{}': {}", sheet, e)))?;

        match (parsed.values, parsed.error) {
            (Some(values), _) => Ok(values),
            (None, Some(message)) => Err(SyncError::InvalidResponse(message)),
            (None, None) => Ok(Vec::new()),
        }
    }

    async fn write_once(&self, sheet: &str, rows: &[Row]) -> SyncResult<()> {
        let request = WriteRequest {
            action: "write",
            sheet,
            values: rows,
        };

        let response = self
            .http
            .post(self.config.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        write_outcome(&body)
    }

    /// Runs `op`, retrying retryable failures with exponential backoff.
    async fn with_retry<T, F, Fut>(&self, action: &str, sheet: &str, mut op: F) -> SyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        let mut backoff = self.create_backoff();
        let mut attempt = 0u32;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let Some(delay) = backoff.next_backoff() else {
                        error!(action, sheet = %sheet, "Backoff exhausted");
                        return Err(e);
                    };
                    warn!(
                        action,
                        sheet = %sheet,
                        attempt,
                        ?delay,
                        error = %e,
                        "Web app request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_retryable() {
                        error!(
                            action,
                            sheet = %sheet,
                            attempts = attempt + 1,
                            error = %e,
                            "Web app request failed"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_interval: self.config.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout(self.config.request_timeout.as_secs())
        } else {
            SyncError::from(err)
        }
    }
}

/// Interprets a write response body.
///
/// ## Rules
/// - JSON with `"success": true` → ok
/// - JSON otherwise → rejected, with the `error` field if present
/// - Non-JSON containing "success" (any case) → ok
fn write_outcome(body: &str) -> SyncResult<()> {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            if json.get("success").and_then(Value::as_bool) == Some(true) {
                return Ok(());
            }
            let message = json
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            Err(SyncError::WriteRejected(message))
        }
        Err(_) if body.to_lowercase().contains("success") => Ok(()),
        Err(_) => Err(SyncError::WriteRejected(body.to_string())),
    }
}

#[async_trait]
impl TabularStore for AppsScriptClient {
    async fn read_sheet(&self, name: &str) -> StoreResult<Vec<Row>> {
        self.read(name)
            .await
            .map_err(|e| StoreError::read(name, e.to_string()))
    }

    async fn write_sheet(&self, name: &str, rows: Vec<Row>) -> StoreResult<()> {
        self.write(name, &rows)
            .await
            .map_err(|e| StoreError::write(name, e.to_string()))
    }
}
