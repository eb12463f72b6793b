//! Rebalancing schedule construction.
//!
//! Reduces a raw daily close series to one price per rebalancing interval:
//! 1. Count business days between start and maturity
//! 2. Derive the interval length in business days from the rebalance frequency
//! 3. Bucket observations into consecutive intervals, keeping the last close
//! 4. Forward-fill intervals without observations
//! 5. Estimate annualized volatility from the resampled simple returns

use std::collections::BTreeMap;

use chrono::NaiveDate;
use statrs::statistics::Statistics;
use tracing::{debug, warn};

use crate::data::{
    DailyClose, HistoricalSeries, PricePoint, CALENDAR_DAYS_PER_YEAR, TRADING_DAYS_PER_YEAR,
};
use crate::error::BacktestError;

use super::calendar::{add_business_days, business_day_offset, business_days_inclusive, roll_forward};

/// Builds the [`HistoricalSeries`] for one backtest.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleBuilder {
    /// Rebalances per year, as supplied by the caller.
    rebalance_freq: f64,
}

impl ScheduleBuilder {
    pub fn new(rebalance_freq: f64) -> Self {
        Self { rebalance_freq }
    }

    /// Interval between rebalances in business days.
    ///
    /// `max(1, round(business_days * rebalance_freq / 252))`.
    pub fn rebalance_days(business_days: usize, rebalance_freq: f64) -> usize {
        let raw = (business_days as f64 * rebalance_freq / TRADING_DAYS_PER_YEAR).round();
        if raw.is_finite() && raw >= 1.0 {
            raw as usize
        } else {
            1
        }
    }

    /// Resample `raw` over `[start, maturity]` into rebalancing points.
    pub fn build(
        &self,
        raw: &[DailyClose],
        start: NaiveDate,
        maturity: NaiveDate,
    ) -> Result<HistoricalSeries, BacktestError> {
        if !(self.rebalance_freq.is_finite() && self.rebalance_freq > 0.0) {
            return Err(BacktestError::InvalidParameters(format!(
                "rebalance frequency must be positive, got {}",
                self.rebalance_freq
            )));
        }
        if maturity <= start {
            return Err(BacktestError::DataUnavailable(format!(
                "empty window: maturity {} is not after start {}",
                maturity, start
            )));
        }
        if raw.is_empty() {
            return Err(BacktestError::DataUnavailable(
                "price series is empty".to_string(),
            ));
        }

        let mut window: Vec<DailyClose> = raw
            .iter()
            .filter(|r| r.date >= start && r.date <= maturity && r.close.is_finite())
            .copied()
            .collect();
        window.sort_by_key(|r| r.date);

        let anchor = match window.first() {
            Some(first) => roll_forward(first.date),
            None => {
                return Err(BacktestError::DataUnavailable(format!(
                    "no observations between {} and {}",
                    start, maturity
                )))
            }
        };

        let business_days = business_days_inclusive(start, maturity);
        let rebalance_days = Self::rebalance_days(business_days, self.rebalance_freq);

        // Later rows overwrite earlier ones, so each bin keeps its last close.
        let mut bins: BTreeMap<usize, f64> = BTreeMap::new();
        for row in &window {
            let offset = business_day_offset(anchor, row.date);
            bins.insert(offset / rebalance_days, row.close);
        }

        let last_bin = bins.keys().next_back().copied().unwrap_or(0);
        let mut points = Vec::with_capacity(last_bin + 1);
        let mut carried: Option<f64> = None;
        for bin in 0..=last_bin {
            if let Some(&close) = bins.get(&bin) {
                carried = Some(close);
            }
            if let Some(price) = carried {
                points.push(PricePoint {
                    date: add_business_days(anchor, bin * rebalance_days),
                    price,
                });
            }
        }

        let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
        let volatility = annualized_volatility(&prices);
        if !volatility.is_finite() {
            warn!(points = points.len(), "Volatility undefined for resampled series");
        }

        let maturity_years = (maturity - start).num_days() as f64 / CALENDAR_DAYS_PER_YEAR;

        debug!(
            business_days,
            rebalance_days,
            observations = window.len(),
            points = points.len(),
            volatility,
            "Built rebalancing schedule"
        );

        Ok(HistoricalSeries::new(
            points,
            volatility,
            maturity_years,
            rebalance_days,
        ))
    }
}

/// Simple period-over-period returns.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Sample standard deviation of simple returns scaled by √252.
///
/// NaN when fewer than two returns are available.
pub fn annualized_volatility(prices: &[f64]) -> f64 {
    let returns = simple_returns(prices);
    returns.iter().std_dev() * TRADING_DAYS_PER_YEAR.sqrt()
}
