use chrono::{Datelike, Month, NaiveDate};

use crate::errors::AppError;
use crate::models::{MonthOption, PerformanceWindow, WindowSelection};

/// Number of past years offered next to the current one.
pub const YEARS_BACK: i32 = 5;

/// Earliest year accepted; daily history before the Unix epoch is not served.
pub const MIN_YEAR: i32 = 1970;

/// Resolve a year/month selection into an inclusive date window.
///
/// A month later than the current month of the current year is clamped to the
/// current month. Without a month the whole calendar year is used.
pub fn resolve_window(selection: WindowSelection, today: NaiveDate) -> Result<PerformanceWindow, AppError> {
    let WindowSelection { year, month } = selection;

    if year > today.year() {
        return Err(AppError::Validation(format!("Year {} is in the future", year)));
    }
    if year < MIN_YEAR {
        return Err(AppError::Validation(format!("Year {} is before {}", year, MIN_YEAR)));
    }

    let Some(month) = month else {
        return Ok(PerformanceWindow {
            year,
            month: None,
            start: ymd(year, 1, 1)?,
            end: ymd(year, 12, 31)?,
            label: year.to_string(),
        });
    };

    if !(1..=12).contains(&month) {
        return Err(AppError::Validation(format!("Month {} is out of range", month)));
    }

    let month = if year == today.year() { month.min(today.month()) } else { month };

    Ok(PerformanceWindow {
        year,
        month: Some(month),
        start: ymd(year, month, 1)?,
        end: last_day_of_month(year, month)?,
        label: format!("{} {}", month_name(month), year),
    })
}

/// Selectable months for `year`: up to the current month for the current year.
pub fn month_options(year: i32, today: NaiveDate) -> Vec<MonthOption> {
    let last = if year == today.year() { today.month() } else { 12 };
    (1..=last)
        .map(|value| MonthOption { label: month_name(value), value })
        .collect()
}

/// The current year and the [`YEARS_BACK`] years before it, oldest first.
pub fn year_options(today: NaiveDate) -> Vec<i32> {
    (today.year() - YEARS_BACK..=today.year()).collect()
}

pub fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| month.to_string())
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, AppError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AppError::Validation(format!("Invalid date {}-{:02}-{:02}", year, month, day)))
}

fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate, AppError> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    ymd(next_year, next_month, 1)?
        .pred_opt()
        .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{:02}", year, month)))
}
