//! Delta generation strategies.
//!
//! Both strategies turn a [`HistoricalSeries`] into one hedge ratio per
//! rebalancing date:
//! - Analytic: Black-Scholes call delta, with a terminal 0/1 delta at expiry
//! - Learned: an injected scoring function, terminal date left out

pub mod analytic;
pub mod learned;

pub use analytic::{AnalyticStrategy, BlackScholes};
pub use learned::{DeltaScorer, FnScorer, LearnedStrategy, PriceRangeScorer, ScoringFeatures};

use crate::data::{DeltaSeries, HistoricalSeries};
use crate::error::BacktestError;

/// Time to maturity in years below which the hedge collapses to 0 or 1.
pub const TERMINAL_THRESHOLD: f64 = 1e-6;

/// A source of hedge ratios for one backtest run.
///
/// Implementations must be pure: the same series and parameters always give
/// the same deltas, so two runs can be evaluated in any order or in parallel.
pub trait DeltaStrategy: Send + Sync {
    /// Name used to key this strategy in reports.
    fn name(&self) -> &str;

    /// Produce deltas for `series`.
    fn generate(
        &self,
        series: &HistoricalSeries,
        risk_free_rate: f64,
        strike: f64,
    ) -> Result<DeltaSeries, BacktestError>;
}

/// Exercise / no-exercise hedge at expiry for a call.
pub fn terminal_delta(price: f64, strike: f64) -> f64 {
    if price >= strike {
        1.0
    } else {
        0.0
    }
}

/// Check that a strategy returned either one delta per date or one fewer.
pub fn check_shape(
    strategy: &str,
    deltas: &DeltaSeries,
    dates: usize,
) -> Result<(), BacktestError> {
    if deltas.is_empty() {
        return Err(BacktestError::EmptyDeltaSeries);
    }
    let len = deltas.len();
    if len == dates || len + 1 == dates {
        Ok(())
    } else {
        Err(BacktestError::StrategyOutputShape {
            strategy: strategy.to_string(),
            expected: format!("{} or {}", dates, dates.saturating_sub(1)),
            actual: len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_delta_boundary() {
        assert_eq!(terminal_delta(100.0, 100.0), 1.0);
        assert_eq!(terminal_delta(100.01, 100.0), 1.0);
        assert_eq!(terminal_delta(99.99, 100.0), 0.0);
    }

    #[test]
    fn test_check_shape() {
        let full = DeltaSeries::new(vec![0.5; 5]);
        let short = DeltaSeries::new(vec![0.5; 4]);
        let bad = DeltaSeries::new(vec![0.5; 3]);

        assert!(check_shape("s", &full, 5).is_ok());
        assert!(check_shape("s", &short, 5).is_ok());
        assert!(matches!(
            check_shape("s", &bad, 5),
            Err(BacktestError::StrategyOutputShape { actual: 3, .. })
        ));
        assert!(matches!(
            check_shape("s", &full, 4),
            Err(BacktestError::StrategyOutputShape { .. })
        ));
        assert_eq!(
            check_shape("s", &DeltaSeries::new(vec![]), 5),
            Err(BacktestError::EmptyDeltaSeries)
        );
    }
}
