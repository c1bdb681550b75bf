//! Alpha Vantage daily-adjusted time series source.
//!
//! One blocking GET per symbol with `outputsize=full`. Any non-success status
//! is a total failure for that request; the body is not parsed. Alpha Vantage
//! reports bad symbols and rate limits with HTTP 200 and a diagnostic key
//! instead of the series, so those bodies are classified before decoding.

use super::provider::{RemoteSource, SyncError};
use crate::config::Config;
use crate::domain::PricePoint;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

const FUNCTION: &str = "TIME_SERIES_DAILY_ADJUSTED";

#[derive(Debug, Deserialize)]
struct DailyAdjustedResponse {
    #[serde(rename = "Meta Data")]
    meta: BTreeMap<String, String>,
    #[serde(rename = "Time Series (Daily)")]
    series: BTreeMap<String, DailyEntry>,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. adjusted close")]
    adj_close: String,
    #[serde(rename = "6. volume")]
    volume: String,
    #[serde(rename = "7. dividend amount")]
    dividend: String,
    #[serde(rename = "8. split coefficient")]
    split_coefficient: String,
}

/// Alpha Vantage HTTP source.
pub struct AlphaVantageSource {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::RemoteUnavailable(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        Self::new(&config.base_url, &config.api_key, config.timeout())
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }

    /// Decode a response body into points sorted ascending by date.
    fn parse_body(symbol: &str, body: &str) -> Result<Vec<PricePoint>, SyncError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| SyncError::MalformedResponse(format!("invalid JSON for {symbol}: {e}")))?;

        if let Some(message) = value.get("Error Message") {
            log::debug!("{symbol}: provider rejected request: {message}");
            return Err(SyncError::NoDataForSymbol {
                symbol: symbol.to_string(),
            });
        }
        if let Some(notice) = value.get("Note").or_else(|| value.get("Information")) {
            return Err(SyncError::RemoteUnavailable(format!(
                "provider notice for {symbol}: {notice}"
            )));
        }

        let resp: DailyAdjustedResponse = serde_json::from_value(value)
            .map_err(|e| SyncError::MalformedResponse(format!("{symbol}: {e}")))?;

        if let Some(refreshed) = resp.meta.get("3. Last Refreshed") {
            log::debug!("{symbol}: series last refreshed {refreshed}");
        }

        // BTreeMap iteration keeps ISO dates ascending.
        resp.series
            .iter()
            .map(|(day, entry)| parse_entry(day, entry))
            .collect()
    }
}

fn parse_entry(day: &str, entry: &DailyEntry) -> Result<PricePoint, SyncError> {
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| SyncError::MalformedResponse(format!("bad date '{day}': {e}")))?;

    Ok(PricePoint {
        date,
        open: parse_price(day, "open", &entry.open)?,
        high: parse_price(day, "high", &entry.high)?,
        low: parse_price(day, "low", &entry.low)?,
        close: parse_price(day, "close", &entry.close)?,
        adj_close: parse_price(day, "adjusted close", &entry.adj_close)?,
        volume: parse_field(day, "volume", &entry.volume)?,
        dividend: parse_price(day, "dividend amount", &entry.dividend)?,
        split_coefficient: parse_price(day, "split coefficient", &entry.split_coefficient)?,
    })
}

fn parse_field<T: std::str::FromStr>(day: &str, field: &str, raw: &str) -> Result<T, SyncError> {
    raw.trim().parse().map_err(|_| {
        SyncError::MalformedResponse(format!("{day}: unparsable {field} '{raw}'"))
    })
}

/// Like [`parse_field`], but `NaN` and infinities are malformed too.
fn parse_price(day: &str, field: &str, raw: &str) -> Result<f64, SyncError> {
    let value: f64 = parse_field(day, field, raw)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SyncError::MalformedResponse(format!(
            "{day}: non-finite {field} '{raw}'"
        )))
    }
}

impl RemoteSource for AlphaVantageSource {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch_daily(&self, symbol: &str) -> Result<Vec<PricePoint>, SyncError> {
        let resp = self
            .client
            .get(self.query_url())
            .query(&[
                ("function", FUNCTION),
                ("symbol", symbol),
                ("outputsize", "full"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .map_err(|e| {
                // The request URL carries the API key.
                let e = e.without_url();
                if e.is_timeout() {
                    SyncError::RemoteUnavailable(format!("request for {symbol} timed out"))
                } else {
                    SyncError::RemoteUnavailable(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::RemoteUnavailable(format!(
                "HTTP {status} for {symbol}"
            )));
        }

        let body = resp
            .text()
            .map_err(|e| SyncError::RemoteUnavailable(e.without_url().to_string()))?;

        Self::parse_body(symbol, &body)
    }
}
