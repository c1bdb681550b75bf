//! Crossover detection feeding the latest-signal report.

use chrono::{Duration, NaiveDate};
use pricewatch_core::{
    CrossoverDetector, CrossoverEvent, DailyClose, LatestSignal, MaKind, SignalDirection,
    TradingCalendar,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn latest_of_two_events_is_fresh_sell() {
    // Today Wednesday 2024-07-10. The sell fired on Tuesday's close, so its
    // execution session is today and no session has elapsed since.
    let cal = TradingCalendar::fixed(d(2024, 7, 10));
    let events = vec![
        CrossoverEvent {
            direction: SignalDirection::Buy,
            date: d(2024, 6, 3),
            price: 100.00,
        },
        CrossoverEvent {
            direction: SignalDirection::Sell,
            date: d(2024, 7, 9),
            price: 105.00,
        },
    ];

    let report = LatestSignal::from_events(&events, 365, &cal);
    assert_eq!(report.direction(), Some(SignalDirection::Sell));
    assert!(report.is_actionable());
    match &report {
        LatestSignal::Crossover { sessions_ago, .. } => assert_eq!(*sessions_ago, 0),
        other => panic!("unexpected {other:?}"),
    }
    assert!(report.to_string().ends_with("@ $105.00"));
}

#[test]
fn empty_history_is_not_actionable() {
    let cal = TradingCalendar::fixed(d(2024, 7, 10));
    let report = LatestSignal::from_events(&[], 30, &cal);
    assert_eq!(report.to_string(), "no crossover occurred within 30 days");
    assert!(!report.is_actionable());
}

#[test]
fn holiday_pushes_execution_date() {
    // Crossover on Wednesday 2024-07-03; July 4th closed; executes Friday.
    let cal = TradingCalendar::fixed(d(2024, 7, 5));
    let events = [CrossoverEvent {
        direction: SignalDirection::Buy,
        date: d(2024, 7, 3),
        price: 42.0,
    }];
    let report = LatestSignal::from_events(&events, 30, &cal);
    assert!(report.is_actionable());
    assert_eq!(report.to_string(), "Buy 07/05/2024 (0|0 days ago) @ $42.00");
}

#[test]
fn detected_crossovers_drive_the_report() {
    // Trading-day series: steady decline then a sharp rally on the last days.
    let cal = TradingCalendar::fixed(d(2024, 7, 10));
    let days = cal.trading_days(d(2024, 5, 1), d(2024, 7, 9));
    let n = days.len();
    let closes: Vec<DailyClose> = days
        .iter()
        .enumerate()
        .map(|(i, &date)| DailyClose {
            date,
            close: if i + 3 < n {
                200.0 - i as f64
            } else {
                400.0 + i as f64
            },
        })
        .collect();

    let detector = CrossoverDetector::new(3, 10, MaKind::Sma).unwrap();
    let events = detector.detect_since(&closes, d(2024, 5, 1) + Duration::days(20));
    let last = events.last().expect("rally should produce a golden cross");
    assert_eq!(last.direction, SignalDirection::Buy);

    let report = LatestSignal::from_events(&events, 70, &cal);
    assert_eq!(report.direction(), Some(SignalDirection::Buy));
}

#[test]
fn ema_and_sma_agree_on_direction_of_a_clean_cross() {
    let base = d(2024, 1, 1);
    let closes: Vec<DailyClose> = (0..60)
        .map(|i| DailyClose {
            date: base + Duration::days(i),
            close: if i < 40 { 100.0 - i as f64 } else { 60.0 + 5.0 * (i - 40) as f64 },
        })
        .collect();

    for kind in [MaKind::Sma, MaKind::Ema] {
        let detector = CrossoverDetector::new(5, 20, kind).unwrap();
        let events = detector.detect(&closes);
        assert_eq!(
            events.last().map(|e| e.direction),
            Some(SignalDirection::Buy),
            "{kind:?}"
        );
    }
}
