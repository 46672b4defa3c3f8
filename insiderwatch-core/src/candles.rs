//! Candle fetcher: trailing daily price history for active symbols.

use crate::data::provider::{BatchReport, FetchProgress, PriceBar, PriceSource, SymbolStatus};
use crate::data::retry::Sleeper;
use crate::domain::Transaction;
use crate::persist::ArtifactWriter;
use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_WINDOW_DAYS: i64 = 200;

/// Parallel arrays of timestamp, close, high and low; one entry per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub t: Vec<i64>,
    pub c: Vec<f64>,
    pub h: Vec<f64>,
    pub l: Vec<f64>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl CandleSeries {
    pub fn from_bars(bars: &[PriceBar]) -> Self {
        let mut series = Self {
            t: Vec::with_capacity(bars.len()),
            c: Vec::with_capacity(bars.len()),
            h: Vec::with_capacity(bars.len()),
            l: Vec::with_capacity(bars.len()),
        };
        for bar in bars {
            series.t.push(bar.timestamp);
            series.c.push(round2(bar.close));
            series.h.push(round2(bar.high));
            series.l.push(round2(bar.low));
        }
        series
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CandleOptions {
    /// Trailing calendar days requested per symbol.
    pub window_days: i64,
    /// Pause after every symbol.
    pub request_delay: Duration,
}

impl Default for CandleOptions {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            request_delay: Duration::from_millis(300),
        }
    }
}

/// Distinct symbols with insider activity, sorted.
pub fn active_symbols(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .map(|tx| tx.sym.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Fetch and persist candles for each symbol.
///
/// An empty result writes nothing; a fetch or write failure is recorded and
/// the loop moves on to the next symbol.
pub fn download_candles(
    source: &dyn PriceSource,
    writer: &ArtifactWriter,
    symbols: &[String],
    today: NaiveDate,
    options: &CandleOptions,
    sleeper: &dyn Sleeper,
    progress: &dyn FetchProgress,
) -> BatchReport {
    let start = today - ChronoDuration::days(options.window_days);
    let total = symbols.len();
    let mut report = BatchReport::default();

    info!(
        "fetching {}d candles from {} for {total} symbols",
        options.window_days,
        source.name()
    );

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        let status = match source.daily_bars(symbol, start, today) {
            Ok(bars) if bars.is_empty() => SymbolStatus::Empty,
            Ok(bars) => {
                let series = CandleSeries::from_bars(&bars);
                match writer.write_candles(symbol, &series) {
                    Ok(_) => SymbolStatus::Fetched {
                        records: series.len(),
                    },
                    Err(e) => SymbolStatus::Failed {
                        reason: e.to_string(),
                    },
                }
            }
            Err(e) => SymbolStatus::Failed {
                reason: e.to_string(),
            },
        };

        progress.on_complete(symbol, i, total, &status);
        report.record(symbol, status);

        sleeper.sleep(options.request_delay);
    }

    progress.on_batch_complete("candles", &report);
    report
}
