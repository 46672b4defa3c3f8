//! InsiderWatch Core — insider-trading snapshot pipeline.
//!
//! One run fetches insider transactions for a fixed large-cap universe,
//! filters and deduplicates them, builds summary statistics, pulls trailing
//! daily candles for every symbol with activity, and writes static JSON
//! artifacts for a dashboard:
//! - Symbol registry (ticker → name, sector)
//! - Finnhub and Yahoo providers behind `InsiderSource` / `PriceSource`
//! - Bounded retry policy with injectable sleep
//! - Aggregation into top-N rankings and sector rollups
//! - Atomic JSON artifact writer

pub mod aggregate;
pub mod candles;
pub mod config;
pub mod data;
pub mod domain;
pub mod persist;
pub mod pipeline;
pub mod registry;
pub mod transactions;

pub use aggregate::{build_summary, Summary};
pub use candles::CandleSeries;
pub use config::{api_key_from_env, ConfigError, PipelineConfig};
pub use domain::{Transaction, TransactionCode};
pub use persist::{ArtifactWriter, PersistError};
pub use pipeline::{Pipeline, PipelineError, RunReport};
pub use registry::{SymbolEntry, SymbolRegistry};
