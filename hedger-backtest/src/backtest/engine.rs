//! Core backtesting engine.
//!
//! Runs one hedging backtest end to end:
//! 1. Build the rebalancing schedule from the daily closes
//! 2. Generate Black-Scholes deltas and, unless skipped, learned deltas
//! 3. Simulate the self-financing hedge for each strategy
//! 4. Compute metrics for each trajectory
//! 5. Align both runs into a comparison
//!
//! The engine is synchronous and keeps no state between runs.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compare::{ComparisonResult, StrategyComparator};
use crate::data::{DailyClose, HistoricalSeries};
use crate::error::BacktestError;
use crate::schedule::ScheduleBuilder;
use crate::strategy::{AnalyticStrategy, DeltaScorer, DeltaStrategy, LearnedStrategy};

use super::simulator::SimulationParams;

/// Configuration for backtest execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// First date of the hedge.
    pub start_date: NaiveDate,

    /// Option expiry.
    pub maturity_date: NaiveDate,

    /// Number of options hedged.
    pub quantity: f64,

    /// Continuously compounded risk-free rate (e.g., 0.05 = 5%).
    pub risk_free_rate: f64,

    /// Call strike.
    pub strike: f64,

    /// Rebalance frequency fed to the schedule builder.
    #[serde(default = "default_rebalance_freq")]
    pub rebalance_freq: f64,

    /// Shares held at the start.
    #[serde(default)]
    pub initial_shares: f64,

    /// Cash held at the start.
    #[serde(default)]
    pub initial_cash: f64,

    /// Run the analytic strategy only.
    #[serde(default)]
    pub skip_learned: bool,
}

fn default_rebalance_freq() -> f64 {
    12.0
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            maturity_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap_or_default(),
            quantity: 100.0,
            risk_free_rate: 0.05,
            strike: 150.0,
            rebalance_freq: default_rebalance_freq(),
            initial_shares: 0.0,
            initial_cash: 0.0,
            skip_learned: false,
        }
    }
}

impl BacktestConfig {
    /// Reject parameter combinations the engine cannot run.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.maturity_date <= self.start_date {
            return Err(BacktestError::InvalidParameters(format!(
                "maturity {} is not after start {}",
                self.maturity_date, self.start_date
            )));
        }
        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            return Err(BacktestError::InvalidParameters(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(BacktestError::InvalidParameters(format!(
                "strike must be positive, got {}",
                self.strike
            )));
        }
        if !(self.rebalance_freq.is_finite() && self.rebalance_freq > 0.0) {
            return Err(BacktestError::InvalidParameters(format!(
                "rebalance frequency must be positive, got {}",
                self.rebalance_freq
            )));
        }
        let finite = [self.risk_free_rate, self.initial_shares, self.initial_cash];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(BacktestError::InvalidParameters(
                "rate and initial holdings must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            quantity: self.quantity,
            risk_free_rate: self.risk_free_rate,
            initial_shares: self.initial_shares,
            initial_cash: self.initial_cash,
        }
    }
}

/// Where the learned deltas come from.
#[derive(Clone)]
pub enum DeltaSource {
    /// A frozen scorer supplied by the model-loading collaborator.
    Learned(Arc<dyn DeltaScorer>),
    /// Run the analytic strategy only.
    Skip,
}

impl DeltaSource {
    pub fn learned(scorer: impl DeltaScorer + 'static) -> Self {
        Self::Learned(Arc::new(scorer))
    }
}

impl fmt::Debug for DeltaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Learned(_) => f.write_str("DeltaSource::Learned(..)"),
            Self::Skip => f.write_str("DeltaSource::Skip"),
        }
    }
}

/// The main backtesting engine.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Build the rebalancing schedule only.
    pub fn schedule(&self, prices: &[DailyClose]) -> Result<HistoricalSeries, BacktestError> {
        self.config.validate()?;
        ScheduleBuilder::new(self.config.rebalance_freq).build(
            prices,
            self.config.start_date,
            self.config.maturity_date,
        )
    }

    /// Run both strategies over `prices` and compare them.
    pub fn run(
        &self,
        prices: &[DailyClose],
        delta_source: DeltaSource,
    ) -> Result<ComparisonResult, BacktestError> {
        let series = self.schedule(prices)?;
        info!(
            points = series.len(),
            rebalance_days = series.rebalance_days,
            volatility = series.volatility,
            maturity_years = series.maturity_years,
            "Running hedge backtest"
        );

        let comparator =
            StrategyComparator::new(self.config.simulation_params(), self.config.strike);
        let analytic = AnalyticStrategy::new();

        let learned = match (&delta_source, self.config.skip_learned) {
            (DeltaSource::Learned(scorer), false) => Some(LearnedStrategy::new(scorer.clone())),
            _ => None,
        };

        comparator.compare(
            &series,
            &analytic,
            learned.as_ref().map(|s| s as &dyn DeltaStrategy),
        )
    }
}

/// Run one backtest with explicit parameters.
#[allow(clippy::too_many_arguments)]
pub fn run_backtest(
    prices: &[DailyClose],
    start_date: NaiveDate,
    maturity_date: NaiveDate,
    quantity: f64,
    risk_free_rate: f64,
    strike: f64,
    rebalance_freq: f64,
    initial_shares: f64,
    initial_cash: f64,
    delta_source: DeltaSource,
) -> Result<ComparisonResult, BacktestError> {
    let config = BacktestConfig {
        start_date,
        maturity_date,
        quantity,
        risk_free_rate,
        strike,
        rebalance_freq,
        initial_shares,
        initial_cash,
        skip_learned: matches!(delta_source, DeltaSource::Skip),
    };
    BacktestEngine::new(config).run(prices, delta_source)
}
