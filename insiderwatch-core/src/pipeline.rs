//! End-to-end run: fetch → filter → dedupe → aggregate → persist.
//!
//! Per-symbol failures are collected in the reports and never abort the run.
//! Only a failure to write `insider.json` or `summary.json` is fatal.

use crate::aggregate::{build_summary, Summary};
use crate::candles::{active_symbols, download_candles};
use crate::config::PipelineConfig;
use crate::data::provider::{BatchReport, FetchProgress, InsiderSource, PriceSource};
use crate::data::retry::Sleeper;
use crate::persist::{ArtifactWriter, PersistError};
use crate::registry::{RegistryError, SymbolRegistry};
use crate::transactions::fetch_transactions;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// What a run did, for logging and for tests.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub transactions: BatchReport,
    pub candles: BatchReport,
    pub transaction_count: usize,
    pub active_symbols: Vec<String>,
    pub summary: Summary,
}

/// Borrowed collaborators for one run.
pub struct Pipeline<'a> {
    pub config: &'a PipelineConfig,
    pub registry: &'a SymbolRegistry,
    pub insiders: &'a dyn InsiderSource,
    pub prices: &'a dyn PriceSource,
    pub writer: &'a ArtifactWriter,
    pub sleeper: &'a dyn Sleeper,
    pub progress: &'a dyn FetchProgress,
}

impl Pipeline<'_> {
    /// Run every stage with `now` as the reference time.
    pub fn run(&self, now: DateTime<Utc>) -> Result<RunReport, PipelineError> {
        let batch = fetch_transactions(
            self.insiders,
            self.registry,
            now.naive_utc(),
            &self.config.transaction_options(),
            self.sleeper,
            self.progress,
        );

        let path = self.writer.write_transactions(&batch.transactions)?;
        info!("saved {} transactions to {}", batch.transactions.len(), path.display());

        let summary = build_summary(&batch.transactions, self.registry, now);
        let path = self.writer.write_summary(&summary)?;
        info!("saved summary to {}", path.display());

        let symbols = active_symbols(&batch.transactions);
        info!("{} symbols with insider activity", symbols.len());

        let candles = download_candles(
            self.prices,
            self.writer,
            &symbols,
            now.date_naive(),
            &self.config.candle_options(),
            self.sleeper,
            self.progress,
        );

        Ok(RunReport {
            transaction_count: batch.transactions.len(),
            transactions: batch.report,
            candles,
            active_symbols: symbols,
            summary,
        })
    }
}

/// The configured universe, or the built-in one.
pub fn load_registry(
    config: &PipelineConfig,
) -> Result<Cow<'static, SymbolRegistry>, PipelineError> {
    match &config.universe {
        Some(path) => Ok(Cow::Owned(SymbolRegistry::from_file(path)?)),
        None => Ok(Cow::Borrowed(SymbolRegistry::builtin())),
    }
}

/// Recompute `summary.json` from the `insider.json` already on disk.
pub fn rebuild_summary(
    writer: &ArtifactWriter,
    registry: &SymbolRegistry,
    now: DateTime<Utc>,
) -> Result<Summary, PipelineError> {
    let transactions = writer.read_transactions()?;
    let summary = build_summary(&transactions, registry, now);
    let path = writer.write_summary(&summary)?;
    info!(
        "rebuilt {} from {} transactions",
        path.display(),
        transactions.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn builtin_registry_by_default() {
        let registry = load_registry(&PipelineConfig::default()).unwrap();
        assert!(matches!(registry, Cow::Borrowed(_)));
        assert_eq!(registry.len(), 73);
    }

    #[test]
    fn missing_universe_file_is_registry_error() {
        let config = PipelineConfig {
            universe: Some(PathBuf::from("/nonexistent/universe.toml")),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            load_registry(&config),
            Err(PipelineError::Registry(RegistryError::Io(_)))
        ));
    }
}
