//! pricewatch CLI: sync cached daily series and report the latest crossover.
//!
//! For each symbol (arguments, or the configured list):
//! - validate the SQLite cache against the trading calendar, downloading on a gap
//! - detect fast/slow moving average crossovers inside the requested window
//! - print the latest crossover and whether it executes at the current session
//!
//! A symbol that cannot be synced is reported and skipped; the run still exits 0.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use pricewatch_core::config::DEFAULT_CONFIG_FILE;
use pricewatch_core::{
    AlphaVantageSource, Config, CrossoverDetector, LatestSignal, MaKind, PriceCache, SyncEngine,
    SyncState, SyncWindow, TradingCalendar,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pricewatch",
    about = "Sync daily price caches and report the latest moving average crossover"
)]
struct Cli {
    /// Symbols to process (e.g., SWTSX SWISX). Defaults to the configured list.
    symbols: Vec<String>,

    /// Path to the TOML config file. Missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// SQLite cache file. Overrides the config.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Window start (YYYY-MM-DD). Defaults to `window_days` before the end.
    #[arg(long)]
    start: Option<String>,

    /// Window end (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Fast moving average period. Overrides the config.
    #[arg(long)]
    fast: Option<usize>,

    /// Slow moving average period. Overrides the config.
    #[arg(long)]
    slow: Option<usize>,

    /// Moving average type: sma or ema. Overrides the config.
    #[arg(long)]
    ma: Option<MaKind>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = effective_config(&cli)?;
    run(&cli, &config)
}

/// Config file, then environment, then command-line overrides; validated last.
fn effective_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env();

    if let Some(db) = &cli.db {
        config.database = db.clone();
    }
    if let Some(fast) = cli.fast {
        config.fast_period = fast;
    }
    if let Some(slow) = cli.slow {
        config.slow_period = slow;
    }
    if let Some(ma) = cli.ma {
        config.moving_average = ma;
    }

    config.validate()?;
    Ok(config)
}

fn build_window(cli: &Cli, config: &Config, calendar: &TradingCalendar) -> Result<SyncWindow> {
    let end = parse_date(cli.end.as_deref(), "--end")?.unwrap_or_else(|| calendar.today());
    let start = match parse_date(cli.start.as_deref(), "--start")? {
        Some(start) => start,
        None => chrono::Duration::try_days(config.window_days)
            .and_then(|span| end.checked_sub_signed(span))
            .with_context(|| format!("window_days {} before {end}", config.window_days))?,
    };
    Ok(SyncWindow::new(start, end, config.slow_period)?)
}

fn parse_date(raw: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("{flag} '{s}'"))
    })
    .transpose()
}

fn symbols(cli: &Cli, config: &Config) -> Vec<String> {
    let raw = if cli.symbols.is_empty() {
        &config.symbols
    } else {
        &cli.symbols
    };
    raw.iter()
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    let calendar = TradingCalendar::new();
    let window = build_window(cli, config, &calendar)?;
    let detector = CrossoverDetector::new(
        config.fast_period,
        config.slow_period,
        config.moving_average,
    )?;

    let cache = PriceCache::open(&config.database, config.table_name()?)
        .with_context(|| format!("open cache {}", config.database.display()))?;
    let source = AlphaVantageSource::from_config(config)?;
    let mut engine = SyncEngine::new(calendar, cache, source);

    log::info!(
        "window {}..{} (padded from {}), {:?} {}/{}",
        window.start(),
        window.end(),
        window.padded_start(),
        detector.kind(),
        detector.fast(),
        detector.slow()
    );

    let symbols = symbols(cli, config);
    let mut failed = 0;

    for symbol in &symbols {
        let outcome = engine.sync(symbol, &window);

        let Some(closes) = outcome.closes() else {
            if let Some(e) = outcome.error() {
                log::debug!("{symbol}: {e}");
            }
            println!("Could not retrieve data from remote server for {symbol}.");
            failed += 1;
            continue;
        };

        let events = detector.detect_since(&closes, window.start());
        let report = LatestSignal::from_events(&events, window.span_days(), engine.calendar());

        println!();
        println!("{symbol} latest crossover:");
        println!("  {report}");

        if report.is_actionable() {
            if let Some(direction) = report.direction() {
                log::warn!("{symbol}: {direction} signal executes at the current session");
            }
        }
        if outcome.state() == SyncState::Backfilled {
            log::info!("{symbol}: series refreshed from remote");
        }
    }

    println!(
        "\nProcessed {} symbols: {} ok, {failed} failed",
        symbols.len(),
        symbols.len() - failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("pricewatch").chain(args.iter().copied()))
    }

    fn config() -> Config {
        Config {
            api_key: "demo".into(),
            ..Config::default()
        }
    }

    #[test]
    fn default_symbols_from_config() {
        assert_eq!(symbols(&cli(&[]), &config()), vec!["SWTSX", "SWISX"]);
    }

    #[test]
    fn argument_symbols_are_normalized() {
        assert_eq!(
            symbols(&cli(&["spy", " qqq "]), &config()),
            vec!["SPY", "QQQ"]
        );
    }

    #[test]
    fn explicit_window_bounds() {
        let cal = TradingCalendar::fixed(NaiveDate::from_ymd_opt(2024, 7, 10).unwrap());
        let args = cli(&["--start", "2023-01-01", "--end", "2023-12-31"]);
        let window = build_window(&args, &config(), &cal).unwrap();
        assert_eq!(window.span_days(), 364);
        assert_eq!(
            window.padded_start(),
            NaiveDate::from_ymd_opt(2022, 10, 15).unwrap()
        );
    }

    #[test]
    fn default_window_ends_today() {
        let today = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        let cal = TradingCalendar::fixed(today);
        let window = build_window(&cli(&[]), &config(), &cal).unwrap();
        assert_eq!(window.end(), today);
        assert_eq!(window.span_days(), 365);
    }

    #[test]
    fn bad_date_is_rejected() {
        let cal = TradingCalendar::fixed(NaiveDate::from_ymd_opt(2024, 7, 10).unwrap());
        assert!(build_window(&cli(&["--start", "01/02/2024"]), &config(), &cal).is_err());
        assert!(
            build_window(&cli(&["--start", "2024-02-01", "--end", "2024-01-01"]), &config(), &cal)
                .is_err()
        );
    }

    #[test]
    fn out_of_range_window_is_an_error() {
        let cal = TradingCalendar::fixed(NaiveDate::from_ymd_opt(2024, 7, 10).unwrap());
        let config = Config {
            window_days: 1_000_000_000_000,
            ..config()
        };
        assert!(build_window(&cli(&[]), &config, &cal).is_err());
    }

    #[test]
    fn ma_flag_parses() {
        assert_eq!(cli(&["--ma", "sma"]).ma, Some(MaKind::Sma));
    }
}
