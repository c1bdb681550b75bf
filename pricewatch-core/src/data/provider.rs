//! Remote source trait and structured error types.
//!
//! The RemoteSource trait abstracts over daily price providers so the sync
//! engine can be driven by Alpha Vantage in production and by a scripted
//! source in tests.

use super::cache::CacheError;
use crate::domain::PricePoint;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while validating or backfilling a symbol.
///
/// These are displayable in CLI output but the batch driver only shows a
/// generic per-symbol message; the detail goes to the debug log.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote source unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Not a failure: the cache does not cover the window and must be refreshed.
    #[error("cache for '{symbol}' is stale: {reason}")]
    CacheStale { symbol: String, reason: String },

    #[error("no data available for symbol '{symbol}'")]
    NoDataForSymbol { symbol: String },

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("invalid window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("window of {span_days} days with slow period {slow_period} is outside the supported date range")]
    WindowTooLarge { span_days: i64, slow_period: usize },
}

/// A provider of full daily price histories.
pub trait RemoteSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the full daily series for `symbol`, sorted ascending by date.
    fn fetch_daily(&self, symbol: &str) -> Result<Vec<PricePoint>, SyncError>;
}
