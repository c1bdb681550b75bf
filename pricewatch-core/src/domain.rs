//! Domain types shared by the cache, the sync engine and the signal layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One day of a daily price series as delivered by a remote source.
///
/// The cache only persists `adj_close`; the other fields are kept so a
/// freshly downloaded series carries everything the provider returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
    pub dividend: f64,
    pub split_coefficient: f64,
}

impl PricePoint {
    /// The (date, adjusted close) pair that the cache stores.
    pub fn daily_close(&self) -> DailyClose {
        DailyClose {
            date: self.date,
            close: self.adj_close,
        }
    }
}

/// A cached close for one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Direction of a moving-average crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    /// Fast average crossed above the slow one.
    Buy,
    /// Fast average crossed below the slow one.
    Sell,
}

impl SignalDirection {
    pub fn is_buy(self) -> bool {
        matches!(self, SignalDirection::Buy)
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::Buy => f.write_str("Buy"),
            SignalDirection::Sell => f.write_str("Sell"),
        }
    }
}

/// A crossover observed on the close of `date` at `price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub direction: SignalDirection,
    pub date: NaiveDate,
    pub price: f64,
}
