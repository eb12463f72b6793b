pub mod loader;
pub mod types;

pub use loader::{LoaderError, PriceFileFormat, PriceLoader};
pub use types::{
    DailyClose, DeltaSeries, HistoricalSeries, PricePoint, CALENDAR_DAYS_PER_YEAR,
    TRADING_DAYS_PER_YEAR,
};
