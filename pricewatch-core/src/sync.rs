//! Cache validation and incremental backfill.
//!
//! State machine per symbol:
//!
//! ```text
//! CHECK_CACHE ──valid──▶ VALID
//!      │
//!      └──stale──▶ STALE_DOWNLOAD ──▶ BACKFILLED | FAILED
//! ```
//!
//! The cache is valid when its rows inside the padded window are exactly the
//! calendar's trading days for that window. Anything else triggers one remote
//! download; a failed download writes nothing.

use crate::calendar::TradingCalendar;
use crate::data::cache::PriceCache;
use crate::data::provider::{RemoteSource, SyncError};
use crate::domain::{DailyClose, PricePoint};
use chrono::{Duration, NaiveDate};

/// Requested window `[start, end]` plus the warm-up padding for the slow average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    start: NaiveDate,
    end: NaiveDate,
    slow_period: usize,
    padded_start: NaiveDate,
}

impl SyncWindow {
    pub fn new(start: NaiveDate, end: NaiveDate, slow_period: usize) -> Result<Self, SyncError> {
        if start > end {
            return Err(SyncError::InvalidWindow { start, end });
        }
        let span = (end - start).num_days();
        let padded_start = Self::checked_padding_days(span, slow_period)
            .and_then(Duration::try_days)
            .and_then(|padding| end.checked_sub_signed(padding))
            .ok_or(SyncError::WindowTooLarge {
                span_days: span,
                slow_period,
            })?;
        Ok(Self {
            start,
            end,
            slow_period,
            padded_start,
        })
    }

    /// Window of `days` calendar days ending on the calendar's today.
    pub fn ending_today(
        calendar: &TradingCalendar,
        days: i64,
        slow_period: usize,
    ) -> Result<Self, SyncError> {
        let end = calendar.today();
        let start = Duration::try_days(days)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or(SyncError::WindowTooLarge {
                span_days: days,
                slow_period,
            })?;
        Self::new(start, end, slow_period)
    }

    /// Days to step back from `end`: `dd + 7/5·nh + dd/30·3`, truncated.
    ///
    /// Evaluated exactly as `floor((11·dd + 14·nh) / 10)` so no float
    /// rounding can move the padded start by a day.
    pub fn padding_days(span_days: i64, slow_period: usize) -> i64 {
        (11 * span_days + 14 * slow_period as i64).div_euclid(10)
    }

    fn checked_padding_days(span_days: i64, slow_period: usize) -> Option<i64> {
        let nh = i64::try_from(slow_period).ok()?;
        let scaled = span_days.checked_mul(11)?.checked_add(nh.checked_mul(14)?)?;
        Some(scaled.div_euclid(10))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn padded_start(&self) -> NaiveDate {
        self.padded_start
    }

    pub fn slow_period(&self) -> usize {
        self.slow_period
    }

    /// `dd`: calendar days between the requested start and end.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// True if `date` lies in the padded window `[padded_start, end]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.padded_start && date <= self.end
    }
}

/// Terminal state of one symbol's sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Valid,
    Backfilled,
    Failed,
}

/// Result of syncing one symbol. Errors stop here and never reach the batch.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Cache already covered the window; rows as cached.
    Valid(Vec<DailyClose>),
    /// Cache was stale; these downloaded points were merged into it.
    Backfilled(Vec<PricePoint>),
    /// No data for this symbol; the cache is unchanged.
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn state(&self) -> SyncState {
        match self {
            SyncOutcome::Valid(_) => SyncState::Valid,
            SyncOutcome::Backfilled(_) => SyncState::Backfilled,
            SyncOutcome::Failed(_) => SyncState::Failed,
        }
    }

    /// The (date, adjusted close) series, or `None` on failure.
    pub fn closes(&self) -> Option<Vec<DailyClose>> {
        match self {
            SyncOutcome::Valid(rows) => Some(rows.clone()),
            SyncOutcome::Backfilled(points) => {
                Some(points.iter().map(PricePoint::daily_close).collect())
            }
            SyncOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Validates the cache against the trading calendar and backfills from a remote source.
pub struct SyncEngine<R> {
    calendar: TradingCalendar,
    cache: PriceCache,
    remote: R,
}

impl<R: RemoteSource> SyncEngine<R> {
    pub fn new(calendar: TradingCalendar, cache: PriceCache, remote: R) -> Self {
        Self {
            calendar,
            cache,
            remote,
        }
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Cached rows for the padded window, or `CacheStale` if they do not
    /// match the expected trading days exactly.
    pub fn check_cache(
        &self,
        symbol: &str,
        window: &SyncWindow,
    ) -> Result<Vec<DailyClose>, SyncError> {
        let stale = |reason: String| SyncError::CacheStale {
            symbol: symbol.to_string(),
            reason,
        };

        let cached = self
            .cache
            .fetch_all(symbol)?
            .ok_or_else(|| stale("no cached rows".into()))?;

        let rows: Vec<DailyClose> = cached
            .into_iter()
            .filter(|row| window.contains(row.date))
            .collect();
        let expected = self
            .calendar
            .trading_days(window.padded_start(), window.end());

        log::debug!(
            "{symbol}: {} cached rows vs {} expected trading days in [{}, {}]",
            rows.len(),
            expected.len(),
            window.padded_start(),
            window.end()
        );

        if rows.len() != expected.len() {
            return Err(stale(format!(
                "expected {} trading days, cached {}",
                expected.len(),
                rows.len()
            )));
        }
        if let Some((row, day)) = rows
            .iter()
            .zip(&expected)
            .find(|(row, day)| row.date != **day)
        {
            return Err(stale(format!(
                "cached {} where {day} was expected",
                row.date
            )));
        }

        Ok(rows)
    }

    /// Run the state machine for one symbol.
    pub fn sync(&mut self, symbol: &str, window: &SyncWindow) -> SyncOutcome {
        match self.check_cache(symbol, window) {
            Ok(rows) => {
                log::info!("{symbol}: cache valid ({} days)", rows.len());
                SyncOutcome::Valid(rows)
            }
            Err(SyncError::CacheStale { reason, .. }) => {
                log::info!(
                    "{symbol}: cache stale ({reason}), downloading from {}",
                    self.remote.name()
                );
                match self.backfill(symbol, window) {
                    Ok(points) => SyncOutcome::Backfilled(points),
                    Err(e) => {
                        log::warn!("{symbol}: backfill failed: {e}");
                        SyncOutcome::Failed(e)
                    }
                }
            }
            Err(e) => {
                log::warn!("{symbol}: cache check failed: {e}");
                SyncOutcome::Failed(e)
            }
        }
    }

    /// Download, clip to the padded window, and merge in one transaction.
    fn backfill(
        &mut self,
        symbol: &str,
        window: &SyncWindow,
    ) -> Result<Vec<PricePoint>, SyncError> {
        let series = self.remote.fetch_daily(symbol)?;
        let points: Vec<PricePoint> = series
            .into_iter()
            .filter(|p| window.contains(p.date))
            .collect();

        if points.is_empty() {
            return Err(SyncError::NoDataForSymbol {
                symbol: symbol.to_string(),
            });
        }

        let written = self.cache.insert_all(symbol, &points)?;
        log::info!(
            "{symbol}: merged {written} new rows ({} downloaded in window)",
            points.len()
        );
        Ok(points)
    }
}
