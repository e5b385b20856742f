use crate::error::{DashboardError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};

pub fn first_day_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Last calendar day of the month: first day of the following month, minus one day.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    first_day_of_month(next_year, next_month)
        .checked_sub_days(Days::new(1))
        .unwrap_or(NaiveDate::MIN)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date.year(), date.month())
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    last_day_of_month(date.year(), date.month())
}

/// First day of the month `months` before the month containing `date`.
pub fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    month_start(date)
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Number of calendar months covered by `start..=end`, counting partial months.
pub fn months_spanned(start: NaiveDate, end: NaiveDate) -> u32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    (year_diff * 12 + month_diff + 1).max(0) as u32
}

/// Sort key for a month bucket, e.g. "2024-01".
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Display label for a month bucket, e.g. "Jan 2024".
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Parses a month string in the format "YYYY-MM" (a full "YYYY-MM-DD" is also
/// accepted, the day is ignored). Returns the first day of that month.
pub fn parse_month_string(month: &str) -> Result<NaiveDate> {
    let trimmed = month.trim();
    let head = trimmed.get(..7).unwrap_or(trimmed);
    let start_str = format!("{}-01", head);

    NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
        DashboardError::DateError(format!(
            "Invalid month format: {}. Expected YYYY-MM",
            month
        ))
    })
}

/// Zero-guarded division: a zero (or non-finite) divisor yields 0.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
