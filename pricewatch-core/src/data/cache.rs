//! SQLite price cache.
//!
//! One table per logical data source:
//! `(id INTEGER PRIMARY KEY, symbol TEXT, date TIMESTAMP, close REAL, UNIQUE(symbol, date))`
//!
//! Features:
//! - Append-only: rows are never updated or deleted
//! - Insert-or-ignore on (symbol, day), so re-inserting a batch is a no-op
//! - Batch inserts commit in one transaction (all rows visible, or none)
//! - Day-granular reads: the time part of a stored timestamp is ignored

use crate::domain::{DailyClose, PricePoint};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const MAX_TABLE_NAME_LEN: usize = 64;

/// How long a connection waits on a lock held by another writer.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the cache layer.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid table name '{0}' (expected [A-Za-z_][A-Za-z0-9_]*, at most 64 chars)")]
    InvalidTableName(String),

    #[error("unreadable date '{value}' in cached row for '{symbol}'")]
    InvalidDate { symbol: String, value: String },

    #[error("non-finite adjusted close {value} for '{symbol}' on {date}")]
    NonFinitePrice {
        symbol: String,
        date: NaiveDate,
        value: f64,
    },
}

/// A validated SQL table identifier.
///
/// Table names cannot be bound as query parameters, so they are checked once
/// here and interpolated only after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: &str) -> Result<Self, CacheError> {
        let mut chars = name.chars();
        let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid_head && valid_tail && name.len() <= MAX_TABLE_NAME_LEN {
            Ok(Self(name.to_string()))
        } else {
            Err(CacheError::InvalidTableName(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-source daily close cache backed by one SQLite connection.
///
/// The connection is not shared: parallel writers open their own `PriceCache`.
pub struct PriceCache {
    conn: Connection,
    table: TableName,
}

impl PriceCache {
    /// Open (or create) the cache file and ensure the source table exists.
    pub fn open(path: impl AsRef<Path>, table: TableName) -> Result<Self, CacheError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, table)
    }

    /// In-memory cache, for tests and dry runs.
    pub fn open_in_memory(table: TableName) -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, table)
    }

    fn with_connection(conn: Connection, table: TableName) -> Result<Self, CacheError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                id INTEGER PRIMARY KEY, \
                symbol TEXT, \
                date TIMESTAMP, \
                close REAL, \
                UNIQUE(symbol, date))"
        ))?;
        Ok(Self { conn, table })
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// All cached closes for `symbol`, ascending by date.
    ///
    /// Returns `None` when the symbol has no rows at all.
    pub fn fetch_all(&self, symbol: &str) -> Result<Option<Vec<DailyClose>>, CacheError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT date, close FROM {} WHERE symbol = ?1 ORDER BY date ASC",
            self.table
        ))?;

        let rows = stmt.query_map(params![symbol], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut closes = Vec::new();
        for row in rows {
            let (raw_date, close) = row?;
            let date = parse_day(&raw_date).ok_or_else(|| CacheError::InvalidDate {
                symbol: symbol.to_string(),
                value: raw_date.clone(),
            })?;
            closes.push(DailyClose { date, close });
        }

        if closes.is_empty() {
            Ok(None)
        } else {
            Ok(Some(closes))
        }
    }

    /// Cached close for `symbol` on `date`, if any.
    pub fn fetch(&self, symbol: &str, date: NaiveDate) -> Result<Option<f64>, CacheError> {
        let close = self
            .conn
            .query_row(
                &format!(
                    "SELECT close FROM {} WHERE symbol = ?1 AND substr(date, 1, 10) = ?2",
                    self.table
                ),
                params![symbol, day_key(date)],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;
        Ok(close)
    }

    /// Insert a single point. Returns true if a new row was written.
    pub fn insert(&mut self, symbol: &str, point: &PricePoint) -> Result<bool, CacheError> {
        let inserted = self.insert_all(symbol, std::slice::from_ref(point))?;
        Ok(inserted == 1)
    }

    /// Insert the adjusted closes of `points` in one transaction.
    ///
    /// Days already cached for `symbol` are skipped. Returns the number of
    /// rows actually written. A non-finite adjusted close rejects the whole
    /// batch before anything is written.
    pub fn insert_all(&mut self, symbol: &str, points: &[PricePoint]) -> Result<usize, CacheError> {
        if let Some(bad) = points.iter().find(|p| !p.adj_close.is_finite()) {
            return Err(CacheError::NonFinitePrice {
                symbol: symbol.to_string(),
                date: bad.date,
                value: bad.adj_close,
            });
        }

        let sql = format!(
            "INSERT OR IGNORE INTO {table} (symbol, date, close) \
             SELECT ?1, ?2, ?3 \
             WHERE NOT EXISTS (\
                SELECT 1 FROM {table} WHERE symbol = ?1 AND substr(date, 1, 10) = ?4)",
            table = self.table
        );

        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for point in points {
                written += stmt.execute(params![
                    symbol,
                    timestamp_key(point.date),
                    point.adj_close,
                    day_key(point.date),
                ])?;
            }
        }
        tx.commit()?;

        Ok(written)
    }
}

/// `YYYY-MM-DD`, the day-granular comparison key.
fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Stored form of a date: a midnight timestamp.
fn timestamp_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d 00:00:00").to_string()
}

/// Parse the calendar day of a stored timestamp, ignoring any time part.
fn parse_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
