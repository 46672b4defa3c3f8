//! Yahoo Finance price provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API. Only timestamp, high, low and
//! close are kept. Yahoo has no official API and may change format without
//! notice; a parse failure surfaces as `ResponseFormatChanged`.

use super::provider::{check_status, DataError, PriceBar, PriceSource};
use reqwest::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| {
                DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }

    /// Chart API URL for a symbol and inclusive date range.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// 404 means the ticker is unknown to Yahoo; everything else maps as for
    /// any provider.
    fn check_chart_status(symbol: &str, status: StatusCode) -> Result<(), DataError> {
        if status == StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        check_status(status)
    }

    /// Parse a chart response body into bars, oldest first.
    ///
    /// Bars missing any of high/low/close (holidays, halted sessions) are
    /// skipped. A result with no timestamps yields an empty list.
    fn parse_response(symbol: &str, body: &str) -> Result<Vec<PriceBar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let result = match resp.chart.result {
            Some(result) => result,
            None => {
                return Err(match resp.chart.error {
                    Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    },
                    Some(err) => DataError::ResponseFormatChanged(format!(
                        "{}: {}",
                        err.code, err.description
                    )),
                    None => DataError::ResponseFormatChanged("empty result with no error".into()),
                })
            }
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(Vec::new());
        };
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let bars = timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let high = quote.high.get(i).copied().flatten()?;
                let low = quote.low.get(i).copied().flatten()?;
                let close = quote.close.get(i).copied().flatten()?;
                Some(PriceBar {
                    timestamp: ts,
                    high,
                    low,
                    close,
                })
            })
            .collect();

        Ok(bars)
    }
}

impl PriceSource for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        debug!("GET {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        Self::check_chart_status(symbol, resp.status())?;

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        Self::parse_response(symbol, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL"},
                "timestamp": [1717075800, 1717162200, 1717421400],
                "indicators": {
                    "quote": [{
                        "open":   [190.1, 191.0, 192.9],
                        "high":   [192.18, 192.57, 194.99],
                        "low":    [189.51, 189.91, 192.52],
                        "close":  [191.29, null, 194.03],
                        "volume": [75158300, 75158300, 50080500]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_and_skips_incomplete_bars() {
        let bars = YahooProvider::parse_response("AAPL", SAMPLE).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1717075800);
        assert_eq!(bars[0].close, 191.29);
        assert_eq!(bars[1].timestamp, 1717421400);
        assert_eq!(bars[1].high, 194.99);
    }

    #[test]
    fn not_found_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = YahooProvider::parse_response("ZZZZ", body).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "ZZZZ"));
    }

    #[test]
    fn chart_status_mapping() {
        assert!(YahooProvider::check_chart_status("AAPL", StatusCode::OK).is_ok());
        assert!(matches!(
            YahooProvider::check_chart_status("ZZZZ", StatusCode::NOT_FOUND),
            Err(DataError::SymbolNotFound { symbol }) if symbol == "ZZZZ"
        ));
        assert!(matches!(
            YahooProvider::check_chart_status("AAPL", StatusCode::TOO_MANY_REQUESTS),
            Err(DataError::RateLimited)
        ));
        assert!(matches!(
            YahooProvider::check_chart_status("AAPL", StatusCode::FORBIDDEN),
            Err(DataError::Forbidden)
        ));
        assert!(matches!(
            YahooProvider::check_chart_status("AAPL", StatusCode::BAD_GATEWAY),
            Err(DataError::HttpStatus { status: 502 })
        ));
    }

    #[test]
    fn missing_timestamps_is_empty() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        let bars = YahooProvider::parse_response("AAPL", body).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn chart_url_covers_end_day() {
        let url = YahooProvider::chart_url(
            "MSFT",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );
        assert!(url.contains("/chart/MSFT?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1704240000"));
        assert!(url.ends_with("interval=1d"));
    }
}
