//! Self-financing hedge portfolio simulation.
//!
//! Runs the rebalancing loop over the schedule:
//! 1. Accrue interest on cash since the previous date
//! 2. Move the share position to `delta * quantity`
//! 3. Pay for (or collect) the traded shares from cash
//! 4. Record the marked-to-market portfolio value
//!
//! Nothing enters or leaves the portfolio after initialization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{DeltaSeries, HistoricalSeries, CALENDAR_DAYS_PER_YEAR};
use crate::error::BacktestError;

/// Parameters shared by every simulated run of one backtest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Number of options hedged (shares per unit delta).
    pub quantity: f64,
    /// Continuously compounded rate earned or paid on cash.
    pub risk_free_rate: f64,
    /// Shares held before the first rebalance.
    pub initial_shares: f64,
    /// Cash held before the first rebalance.
    pub initial_cash: f64,
}

/// Cash and share holdings between two rebalances.
#[derive(Debug, Clone, Copy)]
struct PortfolioState {
    cash: f64,
    shares: f64,
}

impl PortfolioState {
    fn value(&self, price: f64) -> f64 {
        self.shares * price + self.cash
    }

    /// Accrue interest over `dt` years, then trade to `target_shares` at `price`.
    fn rebalance(self, rate: f64, dt: f64, target_shares: f64, price: f64) -> Self {
        let cash = self.cash * (rate * dt).exp();
        let traded = target_shares - self.shares;
        Self {
            cash: cash - traded * price,
            shares: target_shares,
        }
    }
}

/// Portfolio snapshot on one rebalancing date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub date: NaiveDate,
    pub price: f64,
    /// Delta the strategy supplied for this date.
    pub delta: f64,
    pub shares: f64,
    pub cash: f64,
    pub value: f64,
}

/// Portfolio values over the rebalancing dates of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTrajectory {
    points: Vec<TrajectoryPoint>,
}

impl PortfolioTrajectory {
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }

    /// Per-step gap between the recorded value change and the change implied
    /// by the previous holdings (share P&L plus interest on cash).
    ///
    /// Every entry is zero up to rounding for a self-financing run.
    pub fn self_financing_residuals(&self, risk_free_rate: f64) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|w| {
                let (prev, curr) = (&w[0], &w[1]);
                let dt = (curr.date - prev.date).num_days() as f64 / CALENDAR_DAYS_PER_YEAR;
                let implied = prev.shares * (curr.price - prev.price)
                    + prev.cash * ((risk_free_rate * dt).exp() - 1.0);
                (curr.value - prev.value) - implied
            })
            .collect()
    }
}

/// Simulates the hedge portfolio for a delta sequence.
#[derive(Debug, Clone, Copy)]
pub struct PortfolioSimulator {
    params: SimulationParams,
}

impl PortfolioSimulator {
    pub fn new(params: SimulationParams) -> Self {
        Self { params }
    }

    /// Run the rebalancing loop.
    ///
    /// The trajectory has one point per delta; a delta series that omits the
    /// terminal date yields a trajectory one point shorter than the schedule.
    /// The first delta is recorded but not traded: the run starts from the
    /// initial holdings.
    pub fn simulate(
        &self,
        series: &HistoricalSeries,
        deltas: &DeltaSeries,
    ) -> Result<PortfolioTrajectory, BacktestError> {
        if deltas.is_empty() {
            return Err(BacktestError::EmptyDeltaSeries);
        }
        if deltas.len() > series.len() {
            return Err(BacktestError::StrategyOutputShape {
                strategy: "simulator input".to_string(),
                expected: format!("at most {}", series.len()),
                actual: deltas.len(),
            });
        }

        let p = &self.params;
        let points = series.points();
        let deltas = deltas.values();

        let mut state = PortfolioState {
            cash: p.initial_cash,
            shares: p.initial_shares,
        };
        let mut trajectory = Vec::with_capacity(deltas.len());
        trajectory.push(TrajectoryPoint {
            date: points[0].date,
            price: points[0].price,
            delta: deltas[0],
            shares: state.shares,
            cash: state.cash,
            value: state.value(points[0].price),
        });

        for (i, &delta) in deltas.iter().enumerate().skip(1) {
            let point = points[i];
            state = state.rebalance(
                p.risk_free_rate,
                series.year_fraction(i),
                delta * p.quantity,
                point.price,
            );
            trajectory.push(TrajectoryPoint {
                date: point.date,
                price: point.price,
                delta,
                shares: state.shares,
                cash: state.cash,
                value: state.value(point.price),
            });
        }

        Ok(PortfolioTrajectory { points: trajectory })
    }
}
