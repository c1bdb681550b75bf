//! Property tests for calendar, cache and window invariants.
//!
//! Uses proptest to verify:
//! 1. Trading days are strictly ascending, in range, and never weekends
//! 2. next_trading_day is the first trading day after its input
//! 3. insert_all is idempotent
//! 4. Padding matches the fractional formula truncated to whole days

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use pricewatch_core::{PriceCache, PricePoint, SyncWindow, TableName, TradingCalendar};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    // 2000-01-01 .. ~2035
    (0i64..13_000).prop_map(|offset| NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(offset))
}

fn arb_batch() -> impl Strategy<Value = Vec<PricePoint>> {
    prop::collection::vec((0i64..400, 1.0..500.0_f64), 0..60).prop_map(|rows| {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        rows.into_iter()
            .map(|(offset, price)| PricePoint {
                date: base + Duration::days(offset),
                open: price,
                high: price,
                low: price,
                close: price,
                adj_close: (price * 100.0).round() / 100.0,
                volume: 1,
                dividend: 0.0,
                split_coefficient: 1.0,
            })
            .collect()
    })
}

// ── 1. Trading-day sequences ─────────────────────────────────────────

proptest! {
    #[test]
    fn trading_days_sorted_in_range_no_weekends(start in arb_date(), len in 0i64..120) {
        let cal = TradingCalendar::new();
        let end = start + Duration::days(len);
        let days = cal.trading_days(start, end);

        for pair in days.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        for day in &days {
            prop_assert!(*day >= start && *day <= end);
            prop_assert!(!matches!(day.weekday(), Weekday::Sat | Weekday::Sun));
            prop_assert!(cal.is_trading_day(*day));
        }
        // At most 5 sessions in any 7 consecutive days.
        prop_assert!(days.len() as i64 <= (len + 1) * 5 / 7 + 2);
    }

    #[test]
    fn reversed_range_is_empty(start in arb_date(), back in 1i64..30) {
        let cal = TradingCalendar::new();
        prop_assert!(cal.trading_days(start, start - Duration::days(back)).is_empty());
    }

    // ── 2. next_trading_day ──────────────────────────────────────────

    #[test]
    fn next_trading_day_is_first_after(date in arb_date()) {
        let cal = TradingCalendar::new();
        let next = cal.next_trading_day(date);
        prop_assert!(next > date);
        prop_assert!(cal.is_trading_day(next));
        // Nothing in between is a trading day.
        let between = cal.trading_days(date + Duration::days(1), next - Duration::days(1));
        prop_assert!(between.is_empty());
    }

    #[test]
    fn days_since_matches_trading_days(date in arb_date(), ahead in 0i64..60) {
        let today = date + Duration::days(ahead);
        let cal = TradingCalendar::fixed(today);
        let expected = if ahead == 0 {
            0
        } else {
            cal.trading_days(date + Duration::days(1), today).len()
        };
        prop_assert_eq!(cal.days_since(date), expected);
    }

    // ── 3. Cache idempotence ─────────────────────────────────────────

    #[test]
    fn insert_all_twice_equals_once(batch in arb_batch()) {
        let table = TableName::new("AlphaVantage").unwrap();
        let mut once = PriceCache::open_in_memory(table.clone()).unwrap();
        let mut twice = PriceCache::open_in_memory(table).unwrap();

        once.insert_all("SPY", &batch).unwrap();
        twice.insert_all("SPY", &batch).unwrap();
        let second = twice.insert_all("SPY", &batch).unwrap();

        prop_assert_eq!(second, 0);
        prop_assert_eq!(once.fetch_all("SPY").unwrap(), twice.fetch_all("SPY").unwrap());
    }

    // ── 4. Padding arithmetic ────────────────────────────────────────

    #[test]
    fn padding_is_truncated_formula(dd in 0i64..4000, nh in 1usize..400) {
        let exact = dd as f64 + 7.0 / 5.0 * nh as f64 + dd as f64 / 30.0 * 3.0;
        let padding = SyncWindow::padding_days(dd, nh);
        // Integer arithmetic must agree with the float formula up to truncation.
        prop_assert!(padding as f64 <= exact + 1e-9);
        prop_assert!(exact - (padding as f64) < 1.0 + 1e-9);

        let end = NaiveDate::from_ymd_opt(2030, 6, 30).unwrap();
        let window = SyncWindow::new(end - Duration::days(dd), end, nh).unwrap();
        prop_assert_eq!(window.padded_start(), end - Duration::days(padding));
        prop_assert!(window.padded_start() <= window.start());
    }
}
