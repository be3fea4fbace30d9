//! Date arithmetic for leave ranges.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{LeaveError, LeaveResult};

/// Longest range, in calendar days, any leave query may cover.
pub const MAX_RANGE_DAYS: i64 = 366;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every date in `[start, end]`; empty when `end < start`.
pub fn dates_in(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |date| *date <= end)
}

/// Monday-to-Friday days in `[start, end]`, skipping any date in `excluded`.
pub fn business_days(start: NaiveDate, end: NaiveDate, excluded: &[NaiveDate]) -> u32 {
    let excluded: HashSet<NaiveDate> = excluded.iter().copied().collect();
    dates_in(start, end)
        .filter(|date| !is_weekend(*date) && !excluded.contains(date))
        .count() as u32
}

/// Refuses ranges longer than [`MAX_RANGE_DAYS`]. Reversed ranges pass; the
/// validator reports those itself.
pub fn check_range(start: NaiveDate, end: NaiveDate) -> LeaveResult<()> {
    let length = days_until(start, end) + 1;
    if length > MAX_RANGE_DAYS {
        return Err(LeaveError::InvalidInput(format!(
            "date range of {length} days exceeds the {MAX_RANGE_DAYS}-day limit"
        )));
    }
    Ok(())
}

/// Whole days from `from` until `to`; negative when `to` is earlier.
pub fn days_until(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}
