//! Crossover detection and latest-signal reporting

pub mod crossover;
pub mod report;

pub use crossover::{CrossoverDetector, InvalidPeriods, MaKind};
pub use report::LatestSignal;
