//! Black-Scholes hedge ratios.
//!
//! Uses one volatility for the whole path (estimated by the schedule builder)
//! and the remaining calendar time to maturity at each rebalancing date.

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::data::{DeltaSeries, HistoricalSeries};
use crate::error::BacktestError;

use super::{terminal_delta, DeltaStrategy, TERMINAL_THRESHOLD};

/// Black-Scholes call delta calculator without dividends.
#[derive(Debug, Clone, Copy)]
pub struct BlackScholes {
    /// Risk-free interest rate (continuously compounded)
    pub rate: f64,
}

impl BlackScholes {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Calculate d1 parameter.
    pub fn d1(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        let numerator = (spot / strike).ln() + (self.rate + 0.5 * vol * vol) * time;
        numerator / (vol * time.sqrt())
    }

    /// Standard normal CDF.
    fn norm_cdf(x: f64) -> f64 {
        Normal::standard().cdf(x)
    }

    /// Call delta, collapsing to 0/1 at or below the terminal threshold.
    pub fn call_delta(&self, spot: f64, strike: f64, time: f64, vol: f64) -> f64 {
        if time <= TERMINAL_THRESHOLD {
            return terminal_delta(spot, strike);
        }
        Self::norm_cdf(self.d1(spot, strike, time, vol))
    }
}

/// Analytic hedge: Black-Scholes delta on every date, terminal delta on the last.
#[derive(Debug, Clone, Default)]
pub struct AnalyticStrategy;

impl AnalyticStrategy {
    pub const NAME: &'static str = "Black-Scholes";

    pub fn new() -> Self {
        Self
    }
}

impl DeltaStrategy for AnalyticStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate(
        &self,
        series: &HistoricalSeries,
        risk_free_rate: f64,
        strike: f64,
    ) -> Result<DeltaSeries, BacktestError> {
        if series.is_empty() {
            return Err(BacktestError::EmptyDeltaSeries);
        }

        let bs = BlackScholes::new(risk_free_rate);
        let last = series.len() - 1;

        let deltas: Vec<f64> = series
            .points()
            .iter()
            .enumerate()
            .map(|(i, point)| {
                if i == last {
                    terminal_delta(point.price, strike)
                } else {
                    let t = series.time_to_maturity(i);
                    bs.call_delta(point.price, strike, t, series.volatility)
                }
            })
            .collect();

        debug!(
            deltas = deltas.len(),
            volatility = series.volatility,
            "Generated Black-Scholes deltas"
        );

        Ok(DeltaSeries::new(deltas))
    }
}
