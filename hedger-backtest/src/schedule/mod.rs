//! Rebalancing schedule construction from daily closes.

pub mod builder;
pub mod calendar;

pub use builder::{annualized_volatility, simple_returns, ScheduleBuilder};
pub use calendar::{
    add_business_days, business_days_inclusive, is_business_day, next_business_day, roll_forward,
};
