//! Backtesting engine for delta-hedging strategies.
//!
//! This module provides the hedging backtest pipeline:
//! - Engine configuration and the `run_backtest` entry point
//! - Self-financing portfolio simulation
//! - Cash accrual at the risk-free rate between rebalances

pub mod engine;
pub mod simulator;

pub use engine::{run_backtest, BacktestConfig, BacktestEngine, DeltaSource};
pub use simulator::{PortfolioSimulator, PortfolioTrajectory, SimulationParams, TrajectoryPoint};
