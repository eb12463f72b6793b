//! Model-driven hedge ratios.
//!
//! The engine never loads or trains a model. A caller injects a frozen
//! [`DeltaScorer`] and the strategy only checks that it returns one delta per
//! scored point. The terminal date is not scored: at expiry the hedge is an
//! exercise decision, not a steady-state ratio.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::data::{DeltaSeries, HistoricalSeries};
use crate::error::BacktestError;

use super::DeltaStrategy;

/// Inputs handed to a scorer, one entry per scored rebalancing date.
#[derive(Debug, Clone, Copy)]
pub struct ScoringFeatures<'a> {
    /// Resampled underlying prices on the scored dates.
    pub prices: &'a [f64],
    /// The whole resampled price path, terminal date included.
    pub path: &'a [f64],
    /// Remaining time to maturity as a fraction of the full option life, in [0, 1].
    pub time_to_maturity: &'a [f64],
}

impl ScoringFeatures<'_> {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// A frozen, side-effect-free delta predictor.
pub trait DeltaScorer: Send + Sync {
    /// Return one delta per entry of `features`.
    fn score(&self, features: &ScoringFeatures<'_>) -> Vec<f64>;
}

/// Adapts a pure closure into a [`DeltaScorer`].
pub struct FnScorer<F>(F);

impl<F> FnScorer<F>
where
    F: Fn(&ScoringFeatures<'_>) -> Vec<f64> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> DeltaScorer for FnScorer<F>
where
    F: Fn(&ScoringFeatures<'_>) -> Vec<f64> + Send + Sync,
{
    fn score(&self, features: &ScoringFeatures<'_>) -> Vec<f64> {
        (self.0)(features)
    }
}

/// Demonstration scorer mapping the price range of the path onto [0.1, 0.9].
///
/// `delta = 0.1 + 0.8 * (S - min) / (max - min)` with min and max taken over
/// the full path, so the terminal price still sets the range. A flat path
/// scores 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceRangeScorer;

impl DeltaScorer for PriceRangeScorer {
    fn score(&self, features: &ScoringFeatures<'_>) -> Vec<f64> {
        let min = features.path.iter().copied().fold(f64::INFINITY, f64::min);
        let max = features.path.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        features
            .prices
            .iter()
            .map(|&p| {
                if range > 0.0 {
                    0.1 + 0.8 * (p - min) / range
                } else {
                    0.5
                }
            })
            .collect()
    }
}

/// Hedge ratios from an injected scorer.
#[derive(Clone)]
pub struct LearnedStrategy {
    name: String,
    scorer: Arc<dyn DeltaScorer>,
}

impl LearnedStrategy {
    pub const NAME: &'static str = "Learned";

    pub fn new(scorer: Arc<dyn DeltaScorer>) -> Self {
        Self {
            name: Self::NAME.to_string(),
            scorer,
        }
    }

    /// Override the report name (e.g. the model's label).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Scored dates: all but the terminal one, or the single date of a
    /// one-point series.
    fn scored_len(series: &HistoricalSeries) -> usize {
        series.len().saturating_sub(1).max(1).min(series.len())
    }
}

impl fmt::Debug for LearnedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearnedStrategy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl DeltaStrategy for LearnedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(
        &self,
        series: &HistoricalSeries,
        _risk_free_rate: f64,
        _strike: f64,
    ) -> Result<DeltaSeries, BacktestError> {
        let n = Self::scored_len(series);
        if n == 0 {
            return Err(BacktestError::EmptyDeltaSeries);
        }

        let path = series.prices();
        let prices = &path[..n];
        let total = series.maturity_years;
        let time_to_maturity: Vec<f64> = (0..n)
            .map(|i| {
                if total > 0.0 {
                    (series.time_to_maturity(i) / total).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            })
            .collect();

        let features = ScoringFeatures {
            prices,
            path: &path,
            time_to_maturity: &time_to_maturity,
        };
        let deltas = self.scorer.score(&features);

        if deltas.len() != n {
            return Err(BacktestError::StrategyOutputShape {
                strategy: self.name.clone(),
                expected: n.to_string(),
                actual: deltas.len(),
            });
        }

        debug!(strategy = %self.name, deltas = deltas.len(), "Scored learned deltas");
        Ok(DeltaSeries::new(deltas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PricePoint;
    use chrono::{Duration, NaiveDate};

    fn series(prices: &[f64]) -> HistoricalSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                date: start + Duration::days(i as i64),
                price,
            })
            .collect();
        HistoricalSeries::new(points, 0.2, 4.0 / 365.0, 1)
    }

    #[test]
    fn test_price_range_scorer() {
        let prices = [100.0, 110.0, 105.0];
        let ttm = [1.0, 0.5, 0.0];
        let deltas = PriceRangeScorer.score(&ScoringFeatures {
            prices: &prices,
            path: &prices,
            time_to_maturity: &ttm,
        });
        assert_eq!(deltas.len(), 3);
        assert!((deltas[0] - 0.1).abs() < 1e-12);
        assert!((deltas[1] - 0.9).abs() < 1e-12);
        assert!((deltas[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_flat_path_scores_midpoint() {
        let prices = [100.0, 100.0];
        let ttm = [1.0, 0.5];
        let deltas = PriceRangeScorer.score(&ScoringFeatures {
            prices: &prices,
            path: &prices,
            time_to_maturity: &ttm,
        });
        assert_eq!(deltas, vec![0.5, 0.5]);
    }

    #[test]
    fn test_terminal_date_is_not_scored() {
        let s = series(&[100.0, 102.0, 101.0, 105.0, 110.0]);
        let strategy = LearnedStrategy::new(Arc::new(PriceRangeScorer));
        let deltas = strategy.generate(&s, 0.05, 100.0).unwrap();
        assert_eq!(deltas.len(), 4);
        assert!(!deltas.includes_terminal(5));
    }

    #[test]
    fn test_price_range_uses_terminal_price() {
        let s = series(&[100.0, 102.0, 101.0, 105.0, 110.0]);
        let deltas = LearnedStrategy::new(Arc::new(PriceRangeScorer))
            .generate(&s, 0.05, 100.0)
            .unwrap();

        let expected = [0.1, 0.26, 0.18, 0.5];
        assert_eq!(deltas.len(), expected.len());
        for (got, want) in deltas.values().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_scorer_receives_full_path() {
        let s = series(&[100.0, 102.0, 101.0]);
        let scorer = FnScorer::new(|f: &ScoringFeatures<'_>| {
            assert_eq!(f.path, &[100.0, 102.0, 101.0]);
            f.prices.to_vec()
        });
        let deltas = LearnedStrategy::new(Arc::new(scorer))
            .generate(&s, 0.05, 100.0)
            .unwrap();
        assert_eq!(deltas.values(), &[100.0, 102.0]);
    }

    #[test]
    fn test_scorer_receives_normalized_time() {
        let s = series(&[100.0, 102.0, 101.0, 105.0, 110.0]);
        let scorer = FnScorer::new(|f: &ScoringFeatures<'_>| f.time_to_maturity.to_vec());
        let deltas = LearnedStrategy::new(Arc::new(scorer))
            .generate(&s, 0.05, 100.0)
            .unwrap();

        let v = deltas.values();
        assert!((v[0] - 1.0).abs() < 1e-12);
        assert!((v[1] - 0.75).abs() < 1e-12);
        assert!((v[3] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_output_length_is_shape_error() {
        let s = series(&[100.0, 102.0, 101.0]);
        let scorer = FnScorer::new(|f: &ScoringFeatures<'_>| vec![0.5; f.len() + 1]);
        let err = LearnedStrategy::new(Arc::new(scorer))
            .generate(&s, 0.05, 100.0)
            .unwrap_err();
        assert_eq!(
            err,
            BacktestError::StrategyOutputShape {
                strategy: "Learned".to_string(),
                expected: "2".to_string(),
                actual: 3,
            }
        );
    }

    #[test]
    fn test_non_finite_scores_pass_through() {
        let s = series(&[100.0, 102.0, 101.0]);
        let scorer = FnScorer::new(|_: &ScoringFeatures<'_>| vec![f64::NAN, f64::INFINITY]);
        let deltas = LearnedStrategy::new(Arc::new(scorer))
            .generate(&s, 0.05, 100.0)
            .unwrap();
        assert!(deltas.values()[0].is_nan());
        assert!(deltas.values()[1].is_infinite());
    }

    #[test]
    fn test_single_point_series_scores_that_point() {
        let s = series(&[100.0]);
        let deltas = LearnedStrategy::new(Arc::new(PriceRangeScorer))
            .generate(&s, 0.05, 100.0)
            .unwrap();
        assert_eq!(deltas.values(), &[0.5]);
    }

    #[test]
    fn test_custom_name() {
        let strategy = LearnedStrategy::new(Arc::new(PriceRangeScorer)).with_name("LSTM");
        assert_eq!(strategy.name(), "LSTM");
    }
}
