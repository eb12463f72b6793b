//! Strategy comparison.
//!
//! Runs the analytic and learned strategies on one schedule and aligns their
//! deltas, portfolio values and metrics into a single [`ComparisonResult`].

pub mod comparator;

pub use comparator::{
    pad_to, ComparisonResult, ComparisonRow, DeltaRow, StrategyComparator, StrategyMetrics,
    StrategyRun,
};
