//! Latest-crossover report.
//!
//! A signal observed on the close of day T is only executable at the next
//! session, so the report is anchored on `next_trading_day(T)`.

use crate::calendar::TradingCalendar;
use crate::domain::{CrossoverEvent, SignalDirection};
use chrono::NaiveDate;
use std::fmt;

/// Status of the most recent crossover for one series.
#[derive(Debug, Clone, PartialEq)]
pub enum LatestSignal {
    /// No crossover in the requested window of `window_days` days.
    None { window_days: i64 },
    Crossover {
        direction: SignalDirection,
        execution_date: NaiveDate,
        /// Trading sessions in `[execution_date, yesterday]`.
        sessions_ago: usize,
        /// Trading days in `(execution_date, today]`.
        days_since: usize,
        price: f64,
    },
}

impl LatestSignal {
    /// Report on the last element of a time-ascending event sequence.
    pub fn from_events(
        events: &[CrossoverEvent],
        window_days: i64,
        calendar: &TradingCalendar,
    ) -> Self {
        let Some(last) = events.last() else {
            return LatestSignal::None { window_days };
        };

        let execution_date = calendar.next_trading_day(last.date);
        let sessions_ago = calendar
            .trading_days(execution_date, calendar.yesterday())
            .len();
        let days_since = calendar.days_since(execution_date);

        LatestSignal::Crossover {
            direction: last.direction,
            execution_date,
            sessions_ago,
            days_since,
            price: last.price,
        }
    }

    /// True when the signal becomes executable at the current session.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            LatestSignal::Crossover {
                sessions_ago: 0,
                ..
            }
        )
    }

    pub fn direction(&self) -> Option<SignalDirection> {
        match self {
            LatestSignal::None { .. } => None,
            LatestSignal::Crossover { direction, .. } => Some(*direction),
        }
    }
}

impl fmt::Display for LatestSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatestSignal::None { window_days } => {
                write!(f, "no crossover occurred within {window_days} days")
            }
            LatestSignal::Crossover {
                direction,
                execution_date,
                sessions_ago,
                days_since,
                price,
            } => write!(
                f,
                "{direction} {} ({sessions_ago}|{days_since} days ago) @ ${price:.2}",
                execution_date.format("%m/%d/%Y")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn empty_history_reports_window() {
        let cal = TradingCalendar::fixed(d(2024, 7, 10));
        let report = LatestSignal::from_events(&[], 30, &cal);
        assert_eq!(report.to_string(), "no crossover occurred within 30 days");
        assert!(!report.is_actionable());
        assert_eq!(report.direction(), None);
    }

    #[test]
    fn stale_signal_counts_sessions() {
        // Today Wednesday 2024-07-10; crossover on Monday 2024-07-01.
        let cal = TradingCalendar::fixed(d(2024, 7, 10));
        let events = [CrossoverEvent {
            direction: SignalDirection::Buy,
            date: d(2024, 7, 1),
            price: 99.999,
        }];
        let report = LatestSignal::from_events(&events, 365, &cal);

        // Execution Tue 07/02; sessions 2, 3, 5, 8, 9 up to yesterday.
        assert_eq!(
            report,
            LatestSignal::Crossover {
                direction: SignalDirection::Buy,
                execution_date: d(2024, 7, 2),
                sessions_ago: 5,
                days_since: 5,
                price: 99.999,
            }
        );
        assert!(!report.is_actionable());
        assert_eq!(report.to_string(), "Buy 07/02/2024 (5|5 days ago) @ $100.00");
    }

    #[test]
    fn signal_from_last_session_is_actionable() {
        // Crossover on Tuesday's close executes Wednesday (today).
        let cal = TradingCalendar::fixed(d(2024, 7, 10));
        let events = [CrossoverEvent {
            direction: SignalDirection::Sell,
            date: d(2024, 7, 9),
            price: 105.0,
        }];
        let report = LatestSignal::from_events(&events, 365, &cal);
        assert!(report.is_actionable());
        assert_eq!(report.to_string(), "Sell 07/10/2024 (0|0 days ago) @ $105.00");
    }

    #[test]
    fn weekend_today_counts_friday_execution() {
        // Today Saturday 2024-07-13; crossover Thursday, execution Friday.
        let cal = TradingCalendar::fixed(d(2024, 7, 13));
        let events = [CrossoverEvent {
            direction: SignalDirection::Buy,
            date: d(2024, 7, 11),
            price: 1.0,
        }];
        let report = LatestSignal::from_events(&events, 30, &cal);
        match report {
            LatestSignal::Crossover {
                execution_date,
                sessions_ago,
                days_since,
                ..
            } => {
                assert_eq!(execution_date, d(2024, 7, 12));
                assert_eq!(sessions_ago, 1);
                assert_eq!(days_since, 0);
            }
            other => panic!("unexpected report {other:?}"),
        }
    }
}
