//! Hedge performance metrics.
//!
//! Four summaries per trajectory:
//! - Final P&L net of the hedged call's payoff
//! - Annualized return volatility
//! - Sharpe ratio (ε-guarded)
//! - Whole-path maximum drawdown

pub mod calculator;

pub use calculator::{call_payoff, MetricsCalculator, MetricsReport, EPSILON};
