pub mod backtest;
pub mod compare;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod schedule;
pub mod strategy;

// Re-export commonly used types
pub use backtest::{run_backtest, BacktestConfig, BacktestEngine, DeltaSource, PortfolioTrajectory};
pub use compare::{ComparisonResult, ComparisonRow, StrategyComparator};
pub use config::{AppConfig, ConfigError};
pub use data::{DailyClose, DeltaSeries, HistoricalSeries, PriceLoader};
pub use error::BacktestError;
pub use metrics::{MetricsCalculator, MetricsReport};
pub use schedule::ScheduleBuilder;
pub use strategy::{AnalyticStrategy, DeltaScorer, DeltaStrategy, LearnedStrategy, PriceRangeScorer};
