//! Finnhub insider-transaction provider.
//!
//! One GET per symbol against `/stock/insider-transactions`, authenticated by
//! the `token` query parameter. Every request runs under the retry policy.

use super::provider::{check_status, DataError, InsiderSource, RawInsiderTransaction};
use super::retry::{retry, RetryPolicy, Sleeper};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

#[derive(Debug, Deserialize)]
struct InsiderResponse {
    #[serde(default)]
    data: Option<Vec<RawInsiderTransaction>>,
}

pub struct FinnhubProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl FinnhubProvider {
    pub fn new(
        api_key: impl Into<String>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| {
                DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: FINNHUB_BASE_URL.to_string(),
            api_key: api_key.into(),
            policy,
            sleeper,
        })
    }

    /// Point the provider at a different host (for a proxy or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/stock/insider-transactions", self.base_url)
    }

    fn fetch_once(&self, symbol: &str) -> Result<Vec<RawInsiderTransaction>, DataError> {
        let resp = self
            .client
            .get(self.endpoint())
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.without_url().to_string()))?;

        check_status(resp.status())?;

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.without_url().to_string()))?;
        parse_response(&body)
    }

    /// Run `fetch` for `symbol` under this provider's retry policy and sleeper.
    fn with_retry<F>(
        &self,
        symbol: &str,
        mut fetch: F,
    ) -> Result<Vec<RawInsiderTransaction>, DataError>
    where
        F: FnMut(&str) -> Result<Vec<RawInsiderTransaction>, DataError>,
    {
        retry(&self.policy, self.sleeper.as_ref(), |attempt| {
            debug!("GET insider-transactions symbol={symbol} attempt={attempt}");
            fetch(symbol)
        })
    }
}

/// Decode the response body. A missing or null `data` array means no records.
pub(crate) fn parse_response(body: &str) -> Result<Vec<RawInsiderTransaction>, DataError> {
    let parsed: InsiderResponse = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("insider response: {e}")))?;
    Ok(parsed.data.unwrap_or_default())
}

impl InsiderSource for FinnhubProvider {
    fn name(&self) -> &str {
        "finnhub"
    }

    fn insider_transactions(&self, symbol: &str) -> Result<Vec<RawInsiderTransaction>, DataError> {
        self.with_retry(symbol, |s| self.fetch_once(s))
    }
}
