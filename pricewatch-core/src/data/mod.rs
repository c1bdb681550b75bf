//! Price cache and remote sources

pub mod alpha_vantage;
pub mod cache;
pub mod provider;

pub use alpha_vantage::AlphaVantageSource;
pub use cache::{CacheError, PriceCache, TableName};
pub use provider::{RemoteSource, SyncError};
