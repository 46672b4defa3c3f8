//! Upstream data providers and request pacing

pub mod finnhub;
pub mod provider;
pub mod retry;
pub mod yahoo;

pub use finnhub::FinnhubProvider;
pub use provider::{
    BatchReport, DataError, FetchProgress, InsiderSource, PriceBar, PriceSource,
    RawInsiderTransaction, SilentProgress, SymbolStatus, TracingProgress,
};
pub use retry::{retry, Backoff, RetryPolicy, Sleeper, ThreadSleeper};
pub use yahoo::YahooProvider;
