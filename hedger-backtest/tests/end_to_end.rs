//! Full hedging backtest runs through the public API.

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;

use hedger_backtest::strategy::FnScorer;
use hedger_backtest::{
    run_backtest, AppConfig, BacktestEngine, BacktestError, ComparisonResult, DailyClose,
    DeltaSource, PriceLoader, PriceRangeScorer,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Mon 2024-01-01 .. Fri 2024-01-05.
fn week_of_closes() -> Vec<DailyClose> {
    [100.0, 102.0, 101.0, 105.0, 110.0]
        .iter()
        .enumerate()
        .map(|(i, &p)| DailyClose::new(date(2024, 1, 1 + i as u32), p))
        .collect()
}

fn run_week(source: DeltaSource) -> Result<ComparisonResult, BacktestError> {
    run_backtest(
        &week_of_closes(),
        date(2024, 1, 1),
        date(2024, 1, 5),
        10.0,
        0.05,
        100.0,
        12.0,
        0.0,
        0.0,
        source,
    )
}

#[test]
fn test_one_week_backtest() {
    let result = run_week(DeltaSource::learned(PriceRangeScorer)).unwrap();

    assert_eq!(result.analytic_name, "Black-Scholes");
    assert_eq!(result.learned_name.as_deref(), Some("Learned"));
    assert_eq!(result.rows.len(), 5);
    assert_eq!(result.rows[0].date, date(2024, 1, 1));
    assert_eq!(result.rows[4].date, date(2024, 1, 5));

    // Analytic deltas cover every date and end in the exercise hedge
    let analytic: Vec<f64> = result
        .rows
        .iter()
        .map(|r| r.analytic_delta.unwrap())
        .collect();
    assert_eq!(analytic.len(), 5);
    assert_eq!(analytic[4], 1.0);
    assert!(analytic[..4].iter().all(|d| (0.0..=1.0).contains(d)));

    // Learned deltas stop one date early
    assert!(result.rows[4].learned_delta.is_none());
    assert!(result.rows[4].learned_value.is_none());
    let learned: Vec<f64> = result.rows[..4]
        .iter()
        .map(|r| r.learned_delta.unwrap())
        .collect();
    let expected = [0.1, 0.26, 0.18, 0.5];
    for (got, want) in learned.iter().zip(expected) {
        assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
    }

    // Starts flat with zero initial holdings
    assert_eq!(result.rows[0].analytic_value, Some(0.0));
    assert_eq!(result.rows[0].learned_value, Some(0.0));

    // ITM at 110: payoff (110 - 100) * 10
    let last_value = result.rows[4].analytic_value.unwrap();
    let metrics = result.analytic_metrics().unwrap();
    assert_abs_diff_eq!(metrics.final_pnl, last_value - 100.0, epsilon = 1e-9);
    assert!(metrics.max_drawdown <= 0.0 || metrics.max_drawdown.is_nan());

    let learned_metrics = result.learned_metrics().unwrap();
    let learned_last = result.rows[3].learned_value.unwrap();
    assert_abs_diff_eq!(learned_metrics.final_pnl, learned_last - 100.0, epsilon = 1e-9);

    assert_eq!(result.delta_view.len(), 4);
    assert_eq!(result.delta_view[3].date, date(2024, 1, 4));
}

#[test]
fn test_analytic_only_run() {
    let result = run_week(DeltaSource::Skip).unwrap();
    assert!(result.learned_name.is_none());
    assert_eq!(result.metrics.len(), 1);
    assert!(result.learned_metrics().is_none());
    assert!(result.rows.iter().all(|r| r.learned_delta.is_none()));
    assert!(result.summary().contains("Black-Scholes"));
}

#[test]
fn test_malformed_learned_output_fails_whole_comparison() {
    let scorer = FnScorer::new(|_: &hedger_backtest::strategy::ScoringFeatures<'_>| vec![0.5]);
    let err = run_week(DeltaSource::learned(scorer)).unwrap_err();
    match err {
        BacktestError::StrategyComparison {
            analytic, learned, ..
        } => {
            assert!(analytic.is_none());
            assert!(learned.is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_window_without_data() {
    let err = run_backtest(
        &week_of_closes(),
        date(2023, 1, 1),
        date(2023, 6, 1),
        100.0,
        0.05,
        150.0,
        12.0,
        0.0,
        0.0,
        DeltaSource::Skip,
    )
    .unwrap_err();
    assert!(matches!(err, BacktestError::DataUnavailable(_)));
}

#[test]
fn test_config_and_price_files() {
    let dir = tempfile::tempdir().unwrap();

    let prices_path = dir.path().join("prices.csv");
    std::fs::write(
        &prices_path,
        "Date,Close\n2024-01-01,100\n2024-01-02,102\n2024-01-03,101\n2024-01-04,105\n2024-01-05,110\n",
    )
    .unwrap();

    let config_path = dir.path().join("hedger.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[backtest]
start_date = "2024-01-01"
maturity_date = "2024-01-05"
quantity = 10
risk_free_rate = 0.05
strike = 100.0

[data]
prices = "{}"
"#,
            prices_path.display()
        ),
    )
    .unwrap();

    let config = AppConfig::load(&config_path).unwrap();
    let prices = PriceLoader::new(config.data.prices.clone().unwrap())
        .with_columns(&config.data.date_column, &config.data.close_column)
        .load()
        .unwrap();
    assert_eq!(prices, week_of_closes());

    let from_files = BacktestEngine::new(config.backtest)
        .run(&prices, DeltaSource::learned(PriceRangeScorer))
        .unwrap();
    let direct = run_week(DeltaSource::learned(PriceRangeScorer)).unwrap();
    assert_eq!(from_files, direct);
}
