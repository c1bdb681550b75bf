//! pricewatch core: trading calendar, price cache, cache sync, crossover reporting.
//!
//! This crate contains:
//! - Trading calendar with weekend and (approximate) NYSE holiday exclusion
//! - Append-only SQLite cache of per-symbol daily adjusted closes
//! - Remote source trait and the Alpha Vantage daily-adjusted client
//! - Sync engine that validates the cache against the calendar and backfills gaps
//! - Moving average crossover detection and latest-signal reporting

pub mod calendar;
pub mod config;
pub mod data;
pub mod domain;
pub mod signal;
pub mod sync;

pub use calendar::{Clock, TradingCalendar};
pub use config::{Config, ConfigError};
pub use data::{AlphaVantageSource, CacheError, PriceCache, RemoteSource, SyncError, TableName};
pub use domain::{CrossoverEvent, DailyClose, PricePoint, SignalDirection};
pub use signal::{CrossoverDetector, LatestSignal, MaKind};
pub use sync::{SyncEngine, SyncOutcome, SyncState, SyncWindow};
