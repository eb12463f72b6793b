//! Hedge performance metrics calculator.
//!
//! Derives return-based statistics from one portfolio trajectory. The hedge
//! portfolio replicates a short call, so the final P&L nets out the call
//! payoff at the last observed price.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::backtest::PortfolioTrajectory;
use crate::data::TRADING_DAYS_PER_YEAR;

/// Guard added to denominators that may approach zero.
pub const EPSILON: f64 = 1e-8;

/// Summary statistics for one hedged run.
///
/// Fields may hold NaN or infinity when the underlying trajectory does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Final portfolio value minus the call payoff.
    #[serde(rename = "Final_PnL")]
    pub final_pnl: f64,

    /// Annualized standard deviation of period returns.
    #[serde(rename = "Volatility")]
    pub volatility: f64,

    /// Annualized mean return over return volatility.
    #[serde(rename = "Sharpe")]
    pub sharpe: f64,

    /// Whole-path peak-to-trough: `(min - max) / (max + ε)`.
    ///
    /// Non-positive while the path maximum is positive; a path that stays
    /// below zero yields a positive value.
    #[serde(rename = "Max_Drawdown")]
    pub max_drawdown: f64,
}

impl MetricsReport {
    /// Generate a summary report.
    pub fn summary(&self) -> String {
        format!(
            "Final P&L: {:.2}\n\
             Volatility: {:.4}\n\
             Sharpe Ratio: {:.2}\n\
             Max Drawdown: {:.2}%",
            self.final_pnl,
            self.volatility,
            self.sharpe,
            self.max_drawdown * 100.0
        )
    }
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Calculate all metrics for a trajectory.
    pub fn compute(
        trajectory: &PortfolioTrajectory,
        strike: f64,
        quantity: f64,
        final_price: f64,
    ) -> MetricsReport {
        Self::compute_values(&trajectory.values(), strike, quantity, final_price)
    }

    /// Calculate all metrics from raw portfolio values.
    pub fn compute_values(
        values: &[f64],
        strike: f64,
        quantity: f64,
        final_price: f64,
    ) -> MetricsReport {
        let payoff = call_payoff(final_price, strike) * quantity;
        let final_pnl = values.last().map(|v| v - payoff).unwrap_or(f64::NAN);

        let returns = Self::period_returns(values);
        let (volatility, sharpe) = if returns.is_empty() {
            (0.0, 0.0)
        } else {
            let mean = returns.iter().mean();
            let std_dev = returns.iter().population_std_dev();
            let annualizer = TRADING_DAYS_PER_YEAR.sqrt();
            (std_dev * annualizer, mean / (std_dev + EPSILON) * annualizer)
        };

        MetricsReport {
            final_pnl,
            volatility,
            sharpe,
            max_drawdown: Self::max_drawdown(values),
        }
    }

    /// Simple returns with an ε-guarded denominator.
    pub fn period_returns(values: &[f64]) -> Vec<f64> {
        values
            .windows(2)
            .map(|w| (w[1] - w[0]) / (w[0] + EPSILON))
            .collect()
    }

    /// Peak-to-trough over the whole path, relative to the path maximum.
    ///
    /// Uses the global min and max regardless of their order in time.
    pub fn max_drawdown(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        let min = values.iter().copied().fold(f64::INFINITY, nan_min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, nan_max);
        (min - max) / (max + EPSILON)
    }
}

/// Payoff of one call at expiry.
pub fn call_payoff(final_price: f64, strike: f64) -> f64 {
    (final_price - strike).max(0.0)
}

// NaN-propagating min/max; f64::min would silently drop NaN.
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_final_pnl_nets_call_payoff() {
        let report = MetricsCalculator::compute_values(&[0.0, 5.0, 12.0], 100.0, 10.0, 110.0);
        assert_abs_diff_eq!(report.final_pnl, 12.0 - 100.0, epsilon = 1e-12);

        // Out of the money: no payoff
        let report = MetricsCalculator::compute_values(&[0.0, 5.0, 12.0], 100.0, 10.0, 95.0);
        assert_abs_diff_eq!(report.final_pnl, 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_volatility_and_sharpe() {
        let values = [100.0, 110.0, 99.0, 108.9];
        let report = MetricsCalculator::compute_values(&values, 100.0, 1.0, 100.0);

        let returns = MetricsCalculator::period_returns(&values);
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
        let std = var.sqrt();

        assert_abs_diff_eq!(report.volatility, std * 252.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            report.sharpe,
            mean / (std + EPSILON) * 252.0_f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_max_drawdown_strictly_increasing() {
        let values = [100.0, 101.0, 103.0, 110.0];
        let dd = MetricsCalculator::max_drawdown(&values);
        assert_abs_diff_eq!(dd, (100.0 - 110.0) / (110.0 + EPSILON), epsilon = 1e-15);
        assert!(dd < 0.0);
    }

    #[test]
    fn test_max_drawdown_ignores_order() {
        // Running-max drawdown would be (90-120)/120; the whole-path one
        // uses the early trough against the later peak.
        let values = [80.0, 120.0, 90.0];
        let dd = MetricsCalculator::max_drawdown(&values);
        assert_abs_diff_eq!(dd, (80.0 - 120.0) / (120.0 + EPSILON), epsilon = 1e-15);
    }

    #[test]
    fn test_max_drawdown_of_negative_path_is_positive() {
        let dd = MetricsCalculator::max_drawdown(&[-10.0, -5.0]);
        assert_abs_diff_eq!(dd, (-10.0 + 5.0) / (-5.0 + EPSILON), epsilon = 1e-12);
        assert!(dd > 0.0);
    }

    #[test]
    fn test_zero_values_do_not_divide_by_zero() {
        let values = [0.0, 0.0, 1.0];
        let report = MetricsCalculator::compute_values(&values, 100.0, 10.0, 90.0);
        assert!(report.volatility.is_finite());
        assert!(report.sharpe.is_finite());
        let returns = MetricsCalculator::period_returns(&values);
        assert_eq!(returns[0], 0.0);
        assert_abs_diff_eq!(returns[1], 1.0 / EPSILON, epsilon = 1e-3);
    }

    #[test]
    fn test_flat_trajectory_has_zero_sharpe() {
        let report = MetricsCalculator::compute_values(&[50.0, 50.0, 50.0], 100.0, 1.0, 90.0);
        assert_eq!(report.volatility, 0.0);
        assert_eq!(report.sharpe, 0.0);
        assert_abs_diff_eq!(report.max_drawdown, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_short_trajectories_do_not_fail() {
        let single = MetricsCalculator::compute_values(&[42.0], 100.0, 1.0, 90.0);
        assert_eq!(single.final_pnl, 42.0);
        assert_eq!(single.volatility, 0.0);
        assert_eq!(single.sharpe, 0.0);
        assert_eq!(single.max_drawdown, 0.0);

        let empty = MetricsCalculator::compute_values(&[], 100.0, 1.0, 90.0);
        assert!(empty.final_pnl.is_nan());
        assert!(empty.max_drawdown.is_nan());
        assert_eq!(empty.volatility, 0.0);
    }

    #[test]
    fn test_nan_values_are_representable() {
        let report = MetricsCalculator::compute_values(&[10.0, f64::NAN, 12.0], 100.0, 1.0, 90.0);
        assert!(report.volatility.is_nan());
        assert!(report.max_drawdown.is_nan());
        assert_eq!(report.final_pnl, 12.0);
    }

    #[test]
    fn test_report_serializes_with_table_keys() {
        let report = MetricsCalculator::compute_values(&[1.0, 2.0], 100.0, 1.0, 90.0);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"Final_PnL\""));
        assert!(json.contains("\"Max_Drawdown\""));
    }
}
