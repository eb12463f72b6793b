//! Core data types for the hedging backtest.
//!
//! A backtest starts from a raw daily close series handed over by a market
//! data collaborator and works on the resampled [`HistoricalSeries`] from
//! then on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Days per year used for calendar-day year fractions.
pub const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One daily close observation from the market data feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

impl DailyClose {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// A rebalancing date and the underlying price observed for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Resampled price path used by every strategy of one backtest.
///
/// Dates are strictly increasing. The volatility is estimated once over the
/// whole resampled path and is not re-estimated per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    points: Vec<PricePoint>,

    /// Annualized volatility of simple returns.
    pub volatility: f64,

    /// Time from start to maturity in years (calendar days / 365).
    pub maturity_years: f64,

    /// Business days between two rebalancing dates.
    pub rebalance_days: usize,
}

impl HistoricalSeries {
    pub fn new(
        points: Vec<PricePoint>,
        volatility: f64,
        maturity_years: f64,
        rebalance_days: usize,
    ) -> Self {
        Self {
            points,
            volatility,
            maturity_years,
            rebalance_days,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Underlying price on the last rebalancing date.
    pub fn final_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }

    /// Calendar-day year fraction between rebalancing dates `i - 1` and `i`.
    pub fn year_fraction(&self, i: usize) -> f64 {
        if i == 0 || i >= self.points.len() {
            return 0.0;
        }
        let days = (self.points[i].date - self.points[i - 1].date).num_days();
        days as f64 / CALENDAR_DAYS_PER_YEAR
    }

    /// Remaining time to maturity in years at rebalancing date `i`.
    ///
    /// Elapsed time is measured from the first rebalancing date.
    pub fn time_to_maturity(&self, i: usize) -> f64 {
        match (self.points.first(), self.points.get(i)) {
            (Some(first), Some(point)) => {
                let elapsed = (point.date - first.date).num_days() as f64;
                self.maturity_years - elapsed / CALENDAR_DAYS_PER_YEAR
            }
            _ => self.maturity_years,
        }
    }
}

/// Hedge ratios produced by one strategy run.
///
/// Holds either one value per rebalancing date or one fewer when the
/// strategy leaves the terminal date out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaSeries {
    values: Vec<f64>,
}

impl DeltaSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied()
    }

    /// Whether the series covers the terminal date of a series of `dates` points.
    pub fn includes_terminal(&self, dates: usize) -> bool {
        self.values.len() == dates
    }
}

impl From<Vec<f64>> for DeltaSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}
