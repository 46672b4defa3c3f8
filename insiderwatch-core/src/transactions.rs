//! Transaction fetcher: per-symbol requests, record filtering, dedupe.
//!
//! Filtering keeps open-market purchases and sales with a nonzero share
//! change and an effective date inside the lookback window. The combined
//! set is sorted newest first and deduplicated on
//! (name, date, change, symbol), so the surviving copy is the most recent.

use crate::data::provider::{
    BatchReport, FetchProgress, InsiderSource, RawInsiderTransaction, SymbolStatus,
};
use crate::data::retry::Sleeper;
use crate::domain::{Transaction, TransactionCode};
use crate::registry::SymbolRegistry;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 180;

/// Pacing and window settings for a transaction fetch.
#[derive(Debug, Clone)]
pub struct TransactionOptions {
    pub lookback_days: i64,
    /// Pause after every symbol, whatever its outcome.
    pub request_delay: Duration,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            request_delay: Duration::from_millis(1200),
        }
    }
}

/// Deduplicated transactions plus per-symbol outcomes.
#[derive(Debug, Clone, Default)]
pub struct TransactionBatch {
    pub transactions: Vec<Transaction>,
    pub report: BatchReport,
}

/// Oldest instant a transaction may carry and still be kept.
pub fn lookback_cutoff(now: NaiveDateTime, lookback_days: i64) -> NaiveDateTime {
    now - ChronoDuration::days(lookback_days)
}

fn effective_date(raw: &RawInsiderTransaction) -> Option<&str> {
    [raw.transaction_date.as_deref(), raw.filing_date.as_deref()]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
}

/// Normalize one raw record, or `None` if it must be dropped.
pub fn normalize(
    symbol: &str,
    raw: &RawInsiderTransaction,
    cutoff: NaiveDateTime,
) -> Option<Transaction> {
    let code = TransactionCode::parse(raw.transaction_code.as_deref().unwrap_or(""))?;

    let date_str = effective_date(raw)?;
    let tx_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
    if tx_date.and_time(NaiveTime::MIN) < cutoff {
        return None;
    }

    let change = raw.change.filter(|c| *c != 0.0)?;

    Some(Transaction {
        sym: symbol.to_string(),
        name: raw.name.clone().unwrap_or_else(|| "Unknown".to_string()),
        code,
        change,
        price: raw.transaction_price.unwrap_or(0.0),
        share: raw.share.unwrap_or(0.0),
        tx_date,
        file_date: raw.filing_date.clone().unwrap_or_default(),
    })
}

/// Apply the filtering policy to every raw record for `symbol`.
pub fn filter_records(
    symbol: &str,
    raw: &[RawInsiderTransaction],
    cutoff: NaiveDateTime,
) -> Vec<Transaction> {
    raw.iter()
        .filter_map(|r| normalize(symbol, r, cutoff))
        .collect()
}

/// Stable sort newest first, then drop repeated identity keys.
pub fn sort_and_dedupe(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    transactions.sort_by(|a, b| b.tx_date.cmp(&a.tx_date));

    let keep: Vec<bool> = {
        let mut seen = HashSet::new();
        transactions.iter().map(|tx| seen.insert(tx.key())).collect()
    };
    transactions
        .into_iter()
        .zip(keep)
        .filter_map(|(tx, keep)| keep.then_some(tx))
        .collect()
}

/// Fetch, filter and dedupe insider transactions for every registry symbol.
///
/// A symbol whose request fails after retries contributes nothing and is
/// recorded as `Failed`; the loop always continues.
pub fn fetch_transactions(
    source: &dyn InsiderSource,
    registry: &SymbolRegistry,
    now: NaiveDateTime,
    options: &TransactionOptions,
    sleeper: &dyn Sleeper,
    progress: &dyn FetchProgress,
) -> TransactionBatch {
    let cutoff = lookback_cutoff(now, options.lookback_days);
    let symbols = registry.tickers();
    let total = symbols.len();
    let mut report = BatchReport::default();
    let mut all = Vec::new();

    info!(
        "fetching insider transactions from {} for {total} symbols (since {})",
        source.name(),
        cutoff.date()
    );

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        let status = match source.insider_transactions(symbol) {
            Ok(raw) if raw.is_empty() => SymbolStatus::Empty,
            Ok(raw) => {
                let kept = filter_records(symbol, &raw, cutoff);
                let records = kept.len();
                all.extend(kept);
                SymbolStatus::Fetched { records }
            }
            Err(e) => SymbolStatus::Failed {
                reason: e.to_string(),
            },
        };

        progress.on_complete(symbol, i, total, &status);
        report.record(symbol, status);

        sleeper.sleep(options.request_delay);
    }

    progress.on_batch_complete("insider transactions", &report);

    let transactions = sort_and_dedupe(all);
    info!(
        "{} unique transactions (P/S only, {}d)",
        transactions.len(),
        options.lookback_days
    );

    TransactionBatch {
        transactions,
        report,
    }
}
