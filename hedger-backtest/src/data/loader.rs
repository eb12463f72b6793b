//! Daily close loader for CSV and Parquet price files.
//!
//! Stands in for the market data provider when the engine is driven from the
//! command line. Files need a date column and a close column; header lookup is
//! case-insensitive so `Date,Close` exports load as well as `date,close`.
//!
//! Dates may be stored as `YYYY-MM-DD` strings or as a native date column.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::DailyClose;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Supported price file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFileFormat {
    Csv,
    Parquet,
}

impl PriceFileFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Loader for a single-ticker daily close file.
pub struct PriceLoader {
    path: PathBuf,
    date_column: String,
    close_column: String,
}

impl PriceLoader {
    /// Create a loader with the default `date` / `close` columns.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            date_column: "date".to_string(),
            close_column: "close".to_string(),
        }
    }

    /// Override the column names.
    pub fn with_columns(mut self, date_column: &str, close_column: &str) -> Self {
        self.date_column = date_column.to_string();
        self.close_column = close_column.to_string();
        self
    }

    fn load_lazy(&self) -> Result<LazyFrame, LoaderError> {
        if !self.path.exists() {
            return Err(LoaderError::FileNotFound(self.path.display().to_string()));
        }

        let format = PriceFileFormat::from_path(&self.path).ok_or_else(|| {
            LoaderError::InvalidData(format!(
                "Unsupported price file extension: {}",
                self.path.display()
            ))
        })?;

        let lf = match format {
            PriceFileFormat::Csv => LazyCsvReader::new(&self.path)
                .with_has_header(true)
                .finish()?,
            PriceFileFormat::Parquet => {
                LazyFrame::scan_parquet(&self.path, ScanArgsParquet::default())?
            }
        };
        Ok(lf)
    }

    /// Load the file as a DataFrame with exactly two columns, `date` and `close`.
    pub fn load_dataframe(&self) -> Result<DataFrame, LoaderError> {
        let mut lf = self.load_lazy()?;
        let schema = lf.collect_schema()?;
        let names: Vec<String> = schema.iter_names().map(|n| n.to_string()).collect();

        let date_name = resolve_column(&names, &self.date_column)?;
        let close_name = resolve_column(&names, &self.close_column)?;

        let df = lf
            .select([
                col(date_name.as_str()).alias("date"),
                col(close_name.as_str()).cast(DataType::Float64).alias("close"),
            ])
            .filter(col("close").is_not_null())
            .collect()?;

        Ok(df)
    }

    /// Load all daily closes, sorted by date with duplicate dates removed.
    ///
    /// When a date appears more than once the last row wins.
    pub fn load(&self) -> Result<Vec<DailyClose>, LoaderError> {
        let df = self.load_dataframe()?;
        let dates = extract_dates(&df)?;

        let closes: Vec<Option<f64>> = df.column("close")?.f64()?.into_iter().collect();

        let mut rows: Vec<DailyClose> = dates
            .into_iter()
            .zip(closes)
            .filter_map(|(d, c)| match (d, c) {
                (Some(date), Some(close)) => Some(DailyClose::new(date, close)),
                _ => None,
            })
            .collect();

        let dropped = df.height() - rows.len();
        if dropped > 0 {
            warn!(dropped, path = %self.path.display(), "Skipped rows with unparseable dates");
        }

        // Stable sort keeps file order within a date so dedup can keep the last one.
        rows.sort_by_key(|r| r.date);
        let mut deduped: Vec<DailyClose> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.date == row.date => *last = row,
                _ => deduped.push(row),
            }
        }

        debug!(rows = deduped.len(), path = %self.path.display(), "Loaded daily closes");
        Ok(deduped)
    }
}

fn resolve_column(names: &[String], wanted: &str) -> Result<String, LoaderError> {
    names
        .iter()
        .find(|n| n.eq_ignore_ascii_case(wanted))
        .cloned()
        .ok_or_else(|| {
            LoaderError::InvalidData(format!(
                "Missing column '{}' (found: {})",
                wanted,
                names.join(", ")
            ))
        })
}

fn extract_dates(df: &DataFrame) -> Result<Vec<Option<NaiveDate>>, LoaderError> {
    let dates_col = df.column("date")?;

    // Handle both string and date column types
    if let Ok(str_col) = dates_col.str() {
        Ok(str_col
            .into_iter()
            .map(|s| s.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
            .collect())
    } else if let Ok(date_col) = dates_col.date() {
        Ok(date_col
            .into_iter()
            .map(|d| d.map(date_from_days))
            .collect())
    } else {
        Err(LoaderError::InvalidData(
            "date column has unexpected type".to_string(),
        ))
    }
}

/// Convert days since Unix epoch to NaiveDate.
fn date_from_days(days: i32) -> NaiveDate {
    NaiveDate::from_num_days_from_ce_opt(days + 719163).unwrap_or_default()
}
