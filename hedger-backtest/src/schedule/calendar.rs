//! Weekday business-day arithmetic.
//!
//! Only weekends are treated as non-business days; exchange holidays are not
//! modeled, so a holiday simply shows up as a missing observation.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Whether the date falls on Monday through Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Roll a date forward to the next business day (identity on business days).
pub fn roll_forward(date: NaiveDate) -> NaiveDate {
    let mut next = date;
    while !is_business_day(next) {
        next += Duration::days(1);
    }
    next
}

/// Get the next business day strictly after `date`.
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    roll_forward(date + Duration::days(1))
}

/// Count business days in `[start, end]`, both ends inclusive.
pub fn business_days_inclusive(start: NaiveDate, end: NaiveDate) -> usize {
    if end < start {
        return 0;
    }
    let total_days = (end - start).num_days() + 1;
    let full_weeks = total_days / 7;
    let mut count = full_weeks * 5;

    let mut day = start + Duration::days(full_weeks * 7);
    while day <= end {
        if is_business_day(day) {
            count += 1;
        }
        day += Duration::days(1);
    }
    count as usize
}

/// Count business days `b` with `start < b <= end`.
///
/// For a business-day `start` this is the business-day offset of `end`; a
/// weekend `end` maps onto the preceding Friday's offset.
pub fn business_day_offset(start: NaiveDate, end: NaiveDate) -> usize {
    if end <= start {
        return 0;
    }
    business_days_inclusive(start + Duration::days(1), end)
}

/// Move `n` business days forward from a business day.
pub fn add_business_days(date: NaiveDate, n: usize) -> NaiveDate {
    let mut current = roll_forward(date);
    let full_weeks = (n / 5) as i64;
    current += Duration::days(full_weeks * 7);
    for _ in 0..(n % 5) {
        current = next_business_day(current);
    }
    current
}
