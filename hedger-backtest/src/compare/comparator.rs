//! Side-by-side comparison of two hedging strategies.
//!
//! Both strategies run on the same [`HistoricalSeries`]. Their outputs are
//! aligned by position to the schedule; a strategy that leaves out the
//! terminal date gets an explicit missing value (`None`) there instead of a
//! shifted or truncated series.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backtest::{PortfolioSimulator, PortfolioTrajectory, SimulationParams};
use crate::data::{DeltaSeries, HistoricalSeries};
use crate::error::BacktestError;
use crate::metrics::{MetricsCalculator, MetricsReport};
use crate::strategy::{check_shape, DeltaStrategy};

/// Everything one strategy produced on a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    pub name: String,
    pub deltas: DeltaSeries,
    pub trajectory: PortfolioTrajectory,
    pub metrics: MetricsReport,
}

/// One rebalancing date of the aligned comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    pub underlying_price: f64,
    pub analytic_value: Option<f64>,
    pub learned_value: Option<f64>,
    pub analytic_delta: Option<f64>,
    pub learned_delta: Option<f64>,
}

/// Deltas only, for every date except the terminal one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaRow {
    pub date: NaiveDate,
    pub analytic_delta: Option<f64>,
    pub learned_delta: Option<f64>,
}

/// Metrics of one strategy, keyed by its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    pub strategy: String,
    pub report: MetricsReport,
}

/// The comparison handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub analytic_name: String,
    /// `None` when the learned strategy was skipped.
    pub learned_name: Option<String>,
    pub rows: Vec<ComparisonRow>,
    pub metrics: Vec<StrategyMetrics>,
    pub delta_view: Vec<DeltaRow>,
}

impl ComparisonResult {
    /// Metrics for a strategy by name.
    pub fn metrics_for(&self, strategy: &str) -> Option<&MetricsReport> {
        self.metrics
            .iter()
            .find(|m| m.strategy == strategy)
            .map(|m| &m.report)
    }

    pub fn analytic_metrics(&self) -> Option<&MetricsReport> {
        self.metrics_for(&self.analytic_name)
    }

    pub fn learned_metrics(&self) -> Option<&MetricsReport> {
        self.learned_name.as_deref().and_then(|n| self.metrics_for(n))
    }

    /// Plain-text metrics table followed by the per-date table.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let learned = self.learned_name.as_deref().unwrap_or("Learned (skipped)");

        let _ = writeln!(out, "Performance Metrics");
        let _ = writeln!(out, "===================");
        let _ = writeln!(
            out,
            "{:<20} {:>14} {:>12} {:>10} {:>14}",
            "Strategy", "Final_PnL", "Volatility", "Sharpe", "Max_Drawdown"
        );
        for m in &self.metrics {
            let _ = writeln!(
                out,
                "{:<20} {:>14.4} {:>12.4} {:>10.4} {:>14.6}",
                m.strategy,
                m.report.final_pnl,
                m.report.volatility,
                m.report.sharpe,
                m.report.max_drawdown
            );
        }

        let _ = writeln!(out);
        let analytic_delta = format!("{} Delta", self.analytic_name);
        let learned_delta = format!("{} Delta", learned);
        let _ = writeln!(
            out,
            "{:<12} {:>12} {:>14} {:>14} {:>20} {:>20}",
            "Date", "Underlying", self.analytic_name, learned, analytic_delta, learned_delta
        );
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:<12} {:>12.4} {:>14} {:>14} {:>20} {:>20}",
                row.date.to_string(),
                row.underlying_price,
                fmt_cell(row.analytic_value, 4),
                fmt_cell(row.learned_value, 4),
                fmt_cell(row.analytic_delta, 4),
                fmt_cell(row.learned_delta, 4)
            );
        }
        out
    }
}

fn fmt_cell(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Right-pad `values` with `None` up to `len` entries.
pub fn pad_to(values: &[f64], len: usize) -> Vec<Option<f64>> {
    (0..len).map(|i| values.get(i).copied()).collect()
}

/// Runs strategies through simulation and metrics, then aligns the results.
#[derive(Debug, Clone, Copy)]
pub struct StrategyComparator {
    params: SimulationParams,
    strike: f64,
}

impl StrategyComparator {
    pub fn new(params: SimulationParams, strike: f64) -> Self {
        Self { params, strike }
    }

    /// Generate deltas, simulate the hedge and compute metrics for one strategy.
    pub fn run_strategy(
        &self,
        strategy: &dyn DeltaStrategy,
        series: &HistoricalSeries,
    ) -> Result<StrategyRun, BacktestError> {
        let final_price = series
            .final_price()
            .ok_or_else(|| BacktestError::DataUnavailable("series has no points".to_string()))?;

        let deltas = strategy.generate(series, self.params.risk_free_rate, self.strike)?;
        check_shape(strategy.name(), &deltas, series.len())?;

        let trajectory = PortfolioSimulator::new(self.params).simulate(series, &deltas)?;
        let metrics =
            MetricsCalculator::compute(&trajectory, self.strike, self.params.quantity, final_price);

        Ok(StrategyRun {
            name: strategy.name().to_string(),
            deltas,
            trajectory,
            metrics,
        })
    }

    /// Run both strategies on `series` and assemble the comparison.
    ///
    /// The runs share nothing mutable and are evaluated in parallel. If either
    /// fails, no partial result is returned.
    pub fn compare(
        &self,
        series: &HistoricalSeries,
        analytic: &dyn DeltaStrategy,
        learned: Option<&dyn DeltaStrategy>,
    ) -> Result<ComparisonResult, BacktestError> {
        let (analytic_run, learned_run) = rayon::join(
            || self.run_strategy(analytic, series),
            || learned.map(|s| self.run_strategy(s, series)),
        );

        let learned_name = learned
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| "Learned (skipped)".to_string());

        match (analytic_run, learned_run) {
            (Ok(a), None) => Self::assemble(series, a, None),
            (Ok(a), Some(Ok(l))) => Self::assemble(series, a, Some(l)),
            (a, l) => {
                let analytic_err = a.err().map(|e| e.to_string());
                let learned_err = l.and_then(|r| r.err()).map(|e| e.to_string());
                warn!(
                    analytic = ?analytic_err,
                    learned = ?learned_err,
                    "Strategy comparison failed"
                );
                Err(BacktestError::StrategyComparison {
                    analytic_name: analytic.name().to_string(),
                    analytic: analytic_err,
                    learned_name,
                    learned: learned_err,
                })
            }
        }
    }

    /// Align completed runs to the schedule of `series`.
    pub fn assemble(
        series: &HistoricalSeries,
        analytic: StrategyRun,
        learned: Option<StrategyRun>,
    ) -> Result<ComparisonResult, BacktestError> {
        let n = series.len();
        for run in std::iter::once(&analytic).chain(learned.as_ref()) {
            let longest = run.deltas.len().max(run.trajectory.len());
            if longest > n {
                return Err(BacktestError::StrategyOutputShape {
                    strategy: run.name.clone(),
                    expected: format!("at most {}", n),
                    actual: longest,
                });
            }
        }

        let a_values = pad_to(&analytic.trajectory.values(), n);
        let a_deltas = pad_to(analytic.deltas.values(), n);
        let (l_values, l_deltas) = match &learned {
            Some(run) => (
                pad_to(&run.trajectory.values(), n),
                pad_to(run.deltas.values(), n),
            ),
            None => (vec![None; n], vec![None; n]),
        };

        let rows: Vec<ComparisonRow> = series
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| ComparisonRow {
                date: p.date,
                underlying_price: p.price,
                analytic_value: a_values[i],
                learned_value: l_values[i],
                analytic_delta: a_deltas[i],
                learned_delta: l_deltas[i],
            })
            .collect();

        let delta_view: Vec<DeltaRow> = rows
            .iter()
            .take(n.saturating_sub(1))
            .map(|r| DeltaRow {
                date: r.date,
                analytic_delta: r.analytic_delta,
                learned_delta: r.learned_delta,
            })
            .collect();

        let mut metrics = vec![StrategyMetrics {
            strategy: analytic.name.clone(),
            report: analytic.metrics,
        }];
        if let Some(run) = &learned {
            metrics.push(StrategyMetrics {
                strategy: run.name.clone(),
                report: run.metrics,
            });
        }

        for m in &metrics {
            info!(
                strategy = %m.strategy,
                final_pnl = m.report.final_pnl,
                sharpe = m.report.sharpe,
                max_drawdown = m.report.max_drawdown,
                "Strategy metrics"
            );
        }

        Ok(ComparisonResult {
            analytic_name: analytic.name,
            learned_name: learned.map(|r| r.name),
            rows,
            metrics,
            delta_view,
        })
    }
}
