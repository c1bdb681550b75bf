//! Trading calendar: trading-day sequences and day counts relative to "now".
//!
//! Weekends are excluded exactly. Holidays follow the regular NYSE full-day
//! closures and are best-effort: ad-hoc closures (national days of mourning,
//! weather) are not modelled.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Source of "today" for day-count arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Local system date at the time of each call.
    System,
    /// A fixed date, for reproducible runs and tests.
    Fixed(NaiveDate),
}

/// Trading calendar for a single reference market.
#[derive(Debug, Clone, Copy)]
pub struct TradingCalendar {
    clock: Clock,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl TradingCalendar {
    /// Calendar driven by the system clock.
    pub fn new() -> Self {
        Self {
            clock: Clock::System,
        }
    }

    /// Calendar whose "today" is pinned to `today`.
    pub fn fixed(today: NaiveDate) -> Self {
        Self {
            clock: Clock::Fixed(today),
        }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn today(&self) -> NaiveDate {
        match self.clock {
            Clock::System => chrono::Local::now().date_naive(),
            Clock::Fixed(date) => date,
        }
    }

    pub fn yesterday(&self) -> NaiveDate {
        self.today() - Duration::days(1)
    }

    /// True if the market is open on `date`.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !holidays(date.year()).contains(&date)
    }

    /// Trading days in `[start, end]`, ascending. Empty when `start > end`.
    pub fn trading_days(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        if start > end {
            return days;
        }

        let mut year = start.year();
        let mut closed = holidays(year);
        let mut current = start;
        while current <= end {
            if current.year() != year {
                year = current.year();
                closed = holidays(year);
            }
            if !is_weekend(current) && !closed.contains(&current) {
                days.push(current);
            }
            current += Duration::days(1);
        }
        days
    }

    /// First trading day strictly after `date`.
    pub fn next_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut next = date + Duration::days(1);
        while !self.is_trading_day(next) {
            next += Duration::days(1);
        }
        next
    }

    /// Number of trading days in `(date, today]`. Zero when `date` is today or later.
    pub fn days_since(&self, date: NaiveDate) -> usize {
        let today = self.today();
        if date >= today {
            return 0;
        }
        self.trading_days(date + Duration::days(1), today).len()
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Full-day market closures for `year`, as observed dates.
fn holidays(year: i32) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(10);

    // A Saturday New Year's Day is not moved back into the previous year.
    if let Some(new_year) = NaiveDate::from_ymd_opt(year, 1, 1) {
        match new_year.weekday() {
            Weekday::Sat => {}
            Weekday::Sun => days.push(new_year + Duration::days(1)),
            _ => days.push(new_year),
        }
    }

    days.extend(nth_weekday(year, 1, Weekday::Mon, 3)); // Martin Luther King Jr. Day
    days.extend(nth_weekday(year, 2, Weekday::Mon, 3)); // Washington's Birthday
    days.extend(easter_sunday(year).map(|d| d - Duration::days(2))); // Good Friday
    days.extend(last_weekday(year, 5, Weekday::Mon)); // Memorial Day
    if year >= 2022 {
        days.extend(NaiveDate::from_ymd_opt(year, 6, 19).map(observed));
    }
    days.extend(NaiveDate::from_ymd_opt(year, 7, 4).map(observed));
    days.extend(nth_weekday(year, 9, Weekday::Mon, 1)); // Labor Day
    days.extend(nth_weekday(year, 11, Weekday::Thu, 4)); // Thanksgiving
    days.extend(NaiveDate::from_ymd_opt(year, 12, 25).map(observed));

    days
}

/// Saturday holidays close the Friday before, Sunday holidays the Monday after.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut date = first_of_next - Duration::days(1);
    while date.weekday() != weekday {
        date -= Duration::days(1);
    }
    Some(date)
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
