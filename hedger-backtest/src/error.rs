//! Error taxonomy for the hedging engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("Historical data not available: {0}")]
    DataUnavailable(String),

    #[error("{strategy} produced {actual} deltas, expected {expected}")]
    StrategyOutputShape {
        strategy: String,
        expected: String,
        actual: usize,
    },

    #[error("Delta series is empty")]
    EmptyDeltaSeries,

    /// One or both strategies failed; the message of each side is kept.
    #[error("Strategy comparison failed ({analytic_name}: {}, {learned_name}: {})",
        .analytic.as_deref().unwrap_or("ok"),
        .learned.as_deref().unwrap_or("ok"))]
    StrategyComparison {
        analytic_name: String,
        analytic: Option<String>,
        learned_name: String,
        learned: Option<String>,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl BacktestError {
    /// True when the error describes a delta sequence of the wrong shape.
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Self::StrategyOutputShape { .. } | Self::EmptyDeltaSeries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_message_carries_both_sides() {
        let err = BacktestError::StrategyComparison {
            analytic_name: "Black-Scholes".to_string(),
            analytic: None,
            learned_name: "Learned".to_string(),
            learned: Some("Delta series is empty".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Black-Scholes: ok"));
        assert!(msg.contains("Learned: Delta series is empty"));
    }

    #[test]
    fn test_shape_error_classification() {
        assert!(BacktestError::EmptyDeltaSeries.is_shape_error());
        assert!(!BacktestError::DataUnavailable("x".into()).is_shape_error());
    }
}
