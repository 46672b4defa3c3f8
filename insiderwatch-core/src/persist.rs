//! JSON artifact writer.
//!
//! Layout under the data directory:
//! - `insider.json`: transaction array, compact
//! - `summary.json`: summary object, pretty-printed
//! - `candles/{SYMBOL}.json`: `{t, c, h, l}` arrays, compact
//!
//! Writes go to a `.tmp` sibling and are renamed into place, so an
//! interrupted run leaves either the previous file or the new one.

use crate::aggregate::Summary;
use crate::candles::CandleSeries;
use crate::domain::Transaction;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const TRANSACTIONS_FILE: &str = "insider.json";
pub const SUMMARY_FILE: &str = "summary.json";
pub const CANDLES_DIR: &str = "candles";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON encoding for {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub struct ArtifactWriter {
    data_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.data_dir.join(TRANSACTIONS_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.data_dir.join(SUMMARY_FILE)
    }

    pub fn candles_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(CANDLES_DIR).join(format!("{symbol}.json"))
    }

    pub fn write_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Result<PathBuf, PersistError> {
        let path = self.transactions_path();
        write_json(&path, transactions, false)?;
        Ok(path)
    }

    pub fn write_summary(&self, summary: &Summary) -> Result<PathBuf, PersistError> {
        let path = self.summary_path();
        write_json(&path, summary, true)?;
        Ok(path)
    }

    pub fn write_candles(
        &self,
        symbol: &str,
        series: &CandleSeries,
    ) -> Result<PathBuf, PersistError> {
        let path = self.candles_path(symbol);
        write_json(&path, series, false)?;
        Ok(path)
    }

    /// Load the transaction list written by a previous run.
    pub fn read_transactions(&self) -> Result<Vec<Transaction>, PersistError> {
        let path = self.transactions_path();
        let content = fs::read_to_string(&path).map_err(|e| PersistError::io("read", &path, e))?;
        serde_json::from_str(&content).map_err(|source| PersistError::Json { path, source })
    }
}

/// Serialize `value` and atomically replace `path` with it.
fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    pretty: bool,
) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistError::io("create dir", parent, e))?;
    }

    let encoded = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &encoded).map_err(|e| PersistError::io("write", &tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PersistError::io("rename into", path, e)
    })?;

    debug!("wrote {} ({} bytes)", path.display(), encoded.len());
    Ok(())
}
