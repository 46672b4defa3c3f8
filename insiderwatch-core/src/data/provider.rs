//! Data source traits, raw provider records, and structured error types.
//!
//! `InsiderSource` and `PriceSource` abstract over the two upstream providers
//! so the fetchers can be driven by mocks in tests.

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Insider transaction exactly as the provider reports it. Every field may be
/// missing or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInsiderTransaction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub share: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub filing_date: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub transaction_code: Option<String>,
    #[serde(default)]
    pub transaction_price: Option<f64>,
}

/// One daily bar, reduced to the fields the dashboard consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Unix seconds of the bar's session.
    pub timestamp: i64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (HTTP 429)")]
    RateLimited,

    #[error("forbidden by provider (HTTP 403)")]
    Forbidden,

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },
}

impl DataError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DataError::SymbolNotFound { .. })
    }
}

/// Map an HTTP status to the provider error taxonomy.
pub(crate) fn check_status(status: StatusCode) -> Result<(), DataError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(DataError::RateLimited);
    }
    if status == StatusCode::FORBIDDEN {
        return Err(DataError::Forbidden);
    }
    if !status.is_success() {
        return Err(DataError::HttpStatus {
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Source of insider transactions, one request per symbol.
pub trait InsiderSource: Send + Sync {
    fn name(&self) -> &str;

    /// All transactions the provider holds for `symbol`. Retries, if any,
    /// happen inside the implementation.
    fn insider_transactions(&self, symbol: &str) -> Result<Vec<RawInsiderTransaction>, DataError>;
}

/// Source of daily price history.
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    /// Daily bars for `symbol` between `start` and `end` inclusive, oldest first.
    fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError>;
}

/// Outcome of one symbol within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolStatus {
    /// Provider returned data; `records` is what survived normalization.
    Fetched { records: usize },
    /// Provider returned nothing for this symbol.
    Empty,
    /// Request failed after retries.
    Failed { reason: String },
}

/// Per-symbol outcomes of a multi-symbol fetch, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<(String, SymbolStatus)>,
}

impl BatchReport {
    pub fn record(&mut self, symbol: &str, status: SymbolStatus) {
        self.outcomes.push((symbol.to_string(), status));
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn fetched(&self) -> usize {
        self.count(|s| matches!(s, SymbolStatus::Fetched { .. }))
    }

    pub fn empty(&self) -> usize {
        self.count(|s| matches!(s, SymbolStatus::Empty))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, SymbolStatus::Failed { .. }))
    }

    pub fn status_of(&self, symbol: &str) -> Option<&SymbolStatus> {
        self.outcomes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, status)| status)
    }

    /// Symbols that failed, with their reasons.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(sym, status)| match status {
                SymbolStatus::Failed { reason } => Some((sym.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&SymbolStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, s)| pred(s)).count()
    }
}

/// Progress callback for multi-symbol operations.
pub trait FetchProgress: Send + Sync {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol completes, whatever its outcome.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, status: &SymbolStatus);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, label: &str, report: &BatchReport);
}

/// Progress reporter that logs through `tracing`.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        debug!("[{}/{}] {symbol}...", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, index: usize, total: usize, status: &SymbolStatus) {
        match status {
            SymbolStatus::Fetched { records } => {
                info!("[{}/{}] {symbol}: {records} records", index + 1, total)
            }
            SymbolStatus::Empty => info!("[{}/{}] {symbol}: no data", index + 1, total),
            SymbolStatus::Failed { reason } => {
                warn!("[{}/{}] {symbol}: failed: {reason}", index + 1, total)
            }
        }
    }

    fn on_batch_complete(&self, label: &str, report: &BatchReport) {
        info!(
            "{label} complete: {}/{} fetched, {} empty, {} failed",
            report.fetched(),
            report.total(),
            report.empty(),
            report.failed()
        );
    }
}

/// Progress reporter that discards everything.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _symbol: &str, _index: usize, _total: usize, _status: &SymbolStatus) {}
    fn on_batch_complete(&self, _label: &str, _report: &BatchReport) {}
}
