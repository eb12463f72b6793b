//! # Compare the analytic and learned hedges
//! hedger-backtest run --config config/default.toml --prices data/AAPL.csv
//!
//! # Analytic hedge only, with JSON output
//! hedger-backtest run --config config/default.toml --skip-learned --json results/run.json
//!
//! # Inspect the rebalancing schedule
//! hedger-backtest schedule --config config/default.toml --prices data/AAPL.csv

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use hedger_backtest::config::AppConfig;
use hedger_backtest::{BacktestEngine, DailyClose, DeltaSource, PriceLoader, PriceRangeScorer};

#[derive(Parser)]
#[command(name = "hedger-backtest")]
#[command(about = "Delta-hedging backtester comparing Black-Scholes and learned hedges")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a hedging backtest and print the comparison
    Run {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Price file (CSV or Parquet); overrides `data.prices`
        #[arg(short, long)]
        prices: Option<PathBuf>,

        /// Run the Black-Scholes hedge only
        #[arg(long)]
        skip_learned: bool,

        /// Write the full comparison as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Print the rebalancing schedule
    Schedule {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Price file (CSV or Parquet); overrides `data.prices`
        #[arg(short, long)]
        prices: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

fn load_prices(config: &AppConfig, override_path: Option<PathBuf>) -> Result<Vec<DailyClose>> {
    let path = override_path
        .or_else(|| config.data.prices.clone())
        .context("No price file given; pass --prices or set data.prices")?;

    let prices = PriceLoader::new(&path)
        .with_columns(&config.data.date_column, &config.data.close_column)
        .load()
        .with_context(|| format!("Failed to load prices from {}", path.display()))?;

    info!(rows = prices.len(), path = %path.display(), "Loaded daily closes");
    Ok(prices)
}

fn cmd_run(
    config: Option<PathBuf>,
    prices: Option<PathBuf>,
    skip_learned: bool,
    json: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config.as_deref())?;
    config.backtest.skip_learned |= skip_learned;
    let prices = load_prices(&config, prices)?;

    let source = if config.backtest.skip_learned {
        DeltaSource::Skip
    } else {
        DeltaSource::learned(PriceRangeScorer)
    };

    let engine = BacktestEngine::new(config.backtest);
    let result = engine.run(&prices, source)?;

    println!("{}", result.summary());

    if let Some(path) = json {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&result)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote comparison");
    }

    Ok(())
}

fn cmd_schedule(config: Option<PathBuf>, prices: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let prices = load_prices(&config, prices)?;

    let series = BacktestEngine::new(config.backtest).schedule(&prices)?;

    println!("Rebalance every {} business days", series.rebalance_days);
    println!("Volatility (annualized): {:.4}", series.volatility);
    println!("Maturity (years): {:.4}", series.maturity_years);
    println!();
    println!("{:<12} {:>12} {:>10}", "Date", "Price", "TTM");
    for (i, point) in series.points().iter().enumerate() {
        println!(
            "{:<12} {:>12.4} {:>10.4}",
            point.date,
            point.price,
            series.time_to_maturity(i)
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hedger_backtest=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            prices,
            skip_learned,
            json,
        } => cmd_run(config, prices, skip_learned, json)?,
        Commands::Schedule { config, prices } => cmd_schedule(config, prices)?,
    }

    Ok(())
}
