//! Moving average crossover detection over a daily close series.
//!
//! Emits Buy when the fast MA crosses above the slow MA (golden cross) and
//! Sell when it crosses below (death cross).

use crate::domain::{CrossoverEvent, DailyClose, SignalDirection};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Moving average type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaKind {
    Sma,
    Ema,
}

impl MaKind {
    /// Average of `values` with NaN for indices before the first full window.
    pub fn compute(self, values: &[f64], period: usize) -> Vec<f64> {
        match self {
            MaKind::Sma => sma(values, period),
            MaKind::Ema => ema(values, period),
        }
    }
}

impl std::str::FromStr for MaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sma" => Ok(MaKind::Sma),
            "ema" => Ok(MaKind::Ema),
            other => Err(format!("unknown moving average '{other}' (expected sma or ema)")),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("need 1 <= fast < slow, got fast={fast} slow={slow}")]
pub struct InvalidPeriods {
    pub fast: usize,
    pub slow: usize,
}

/// Fast/slow moving average crossover detector.
#[derive(Debug, Clone, Copy)]
pub struct CrossoverDetector {
    fast: usize,
    slow: usize,
    kind: MaKind,
}

impl CrossoverDetector {
    pub fn new(fast: usize, slow: usize, kind: MaKind) -> Result<Self, InvalidPeriods> {
        if fast == 0 || slow <= fast {
            return Err(InvalidPeriods { fast, slow });
        }
        Ok(Self { fast, slow, kind })
    }

    pub fn fast(&self) -> usize {
        self.fast
    }

    pub fn slow(&self) -> usize {
        self.slow
    }

    pub fn kind(&self) -> MaKind {
        self.kind
    }

    /// All crossovers in `closes`, time-ascending.
    pub fn detect(&self, closes: &[DailyClose]) -> Vec<CrossoverEvent> {
        let prices: Vec<f64> = closes.iter().map(|c| c.close).collect();
        let fast = self.kind.compute(&prices, self.fast);
        let slow = self.kind.compute(&prices, self.slow);

        let mut events = Vec::new();
        for i in 1..closes.len() {
            let (fc, sc, fp, sp) = (fast[i], slow[i], fast[i - 1], slow[i - 1]);
            if fc.is_nan() || sc.is_nan() || fp.is_nan() || sp.is_nan() {
                continue;
            }

            let direction = if fc > sc && fp <= sp {
                SignalDirection::Buy
            } else if fc < sc && fp >= sp {
                SignalDirection::Sell
            } else {
                continue;
            };

            events.push(CrossoverEvent {
                direction,
                date: closes[i].date,
                price: closes[i].close,
            });
        }
        events
    }

    /// Crossovers dated on or after `start`. Earlier history only warms up the averages.
    pub fn detect_since(&self, closes: &[DailyClose], start: NaiveDate) -> Vec<CrossoverEvent> {
        self.detect(closes)
            .into_iter()
            .filter(|e| e.date >= start)
            .collect()
    }
}

/// Rolling mean. A NaN inside a window makes that window NaN.
fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().sum::<f64>() / period as f64;
    }
    result
}

/// EMA seeded with the SMA of the first `period` values, `alpha = 2/(period+1)`.
fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let seed_window = &values[..period];
    if seed_window.iter().any(|v| v.is_nan()) {
        return result;
    }
    let seed = seed_window.iter().sum::<f64>() / period as f64;
    result[period - 1] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in period..n {
        if values[i].is_nan() {
            // Once tainted, every later value is NaN.
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }
    result
}
