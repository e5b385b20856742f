//! Normalization of loosely-structured spreadsheet rows into [`PerformanceRecord`]s.
//!
//! Sheets exported over the years use several naming schemes at once
//! (`date` / `Date` / `Month`, `spend` / `Meta Spend` / `metaSpend`, ...).
//! Each logical field is resolved through an explicit, ordered alias list.

use crate::error::Result;
use crate::schema::{sanitize_amount, PerformanceRecord, RawRow, RawValue, Source};
use chrono::{DateTime, Datelike, NaiveDate};
use log::debug;

pub const DATE_ALIASES: &[&str] = &["date", "Date", "DATE", "day", "Day", "month", "Month"];

pub const SOURCE_ALIASES: &[&str] = &["source", "Source", "platform", "Platform", "channel", "Channel"];

/// Spend columns. Each inner list is one platform group; the first non-empty
/// alias of every group is summed into the record's single spend value.
pub const SPEND_GROUPS: &[&[&str]] = &[
    &["spend", "Spend", "Ad Spend"],
    &["Meta Spend", "metaSpend"],
    &["Google Spend", "googleSpend"],
];

pub const REVENUE_GROUPS: &[&[&str]] = &[
    &["revenue", "Revenue", "Conversion Value"],
    &["Meta Conversion Value", "Meta Conv", "metaConv"],
    &["Google Conversion Value", "Google Conv", "googleConv"],
];

pub const ORDER_ALIASES: &[&str] = &["orders", "Orders", "Purchases", "conversions", "Conversions"];

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥'];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%-m/%-d/%Y"];

// Dashed forms come first: chrono lets a format space match nothing and `%Y`
// take a sign, so "Jan-24" would otherwise read as year -24.
const MONTH_NAME_FORMATS: &[&str] = &["%d %b-%y", "%d %B-%y", "%d %B %Y", "%d %b %Y"];

const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Year assumed for bare month names such as "March".
    pub fallback_year: i32,
    /// When set, bare month names are rejected instead of pinned to `fallback_year`.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            fallback_year: 2025,
            strict: false,
        }
    }
}

/// Returns the first alias whose cell is present and non-blank.
pub fn resolve_column<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a RawValue> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .find(|value| !value.is_blank())
}

/// Parses a currency-formatted cell such as "$4,321.40". Anything that does
/// not parse to a finite, non-negative number becomes 0.
pub fn parse_currency(value: Option<&RawValue>) -> f64 {
    match value {
        None | Some(RawValue::Empty) => 0.0,
        Some(RawValue::Number(n)) => sanitize_amount(*n),
        Some(RawValue::Text(text)) => parse_currency_str(text),
    }
}

pub fn parse_currency_str(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    cleaned.parse::<f64>().map(sanitize_amount).unwrap_or(0.0)
}

fn sum_groups(row: &RawRow, groups: &[&[&str]]) -> f64 {
    groups
        .iter()
        .map(|aliases| parse_currency(resolve_column(row, aliases)))
        .sum()
}

/// Parses a date cell. Full dates are tried first; failing that, bare month
/// names ("March", "Mar 2024") land on day 1 of the month, using
/// `options.fallback_year` when no year is given.
pub fn parse_record_date(text: &str, options: &ParseOptions) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.date_naive());
    }

    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d") {
        return Some(date);
    }

    if options.strict {
        return None;
    }

    // "March 2024" carries its own year; "March" gets the fallback one.
    let candidates = [
        format!("1 {}", trimmed),
        format!("1 {} {}", trimmed, options.fallback_year),
    ];
    candidates.iter().find_map(|candidate| {
        MONTH_NAME_FORMATS
            .iter()
            .filter_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
            .find(|date| PLAUSIBLE_YEARS.contains(&date.year()))
    })
}

fn parse_orders(value: Option<&RawValue>) -> u64 {
    parse_currency(value).round() as u64
}

/// Converts one raw row into a canonical record, or `None` when the row has
/// no usable date.
pub fn parse_record(row: &RawRow, options: &ParseOptions) -> Option<PerformanceRecord> {
    let date_text = resolve_column(row, DATE_ALIASES)?.as_text()?;
    let date = parse_record_date(&date_text, options)?;

    let source = resolve_column(row, SOURCE_ALIASES)
        .and_then(RawValue::as_text)
        .map(|tag| Source::new(&tag))
        .unwrap_or_default();

    Some(PerformanceRecord::new(
        date,
        source,
        sum_groups(row, SPEND_GROUPS),
        sum_groups(row, REVENUE_GROUPS),
        parse_orders(resolve_column(row, ORDER_ALIASES)),
    ))
}

/// Parses every row, silently dropping the ones without a resolvable date.
pub fn parse_rows(rows: &[RawRow], options: &ParseOptions) -> Vec<PerformanceRecord> {
    let records: Vec<PerformanceRecord> = rows
        .iter()
        .filter_map(|row| parse_record(row, options))
        .collect();

    let dropped = rows.len() - records.len();
    if dropped > 0 {
        debug!("Dropped {} of {} rows without a usable date", dropped, rows.len());
    }

    records
}

/// Splits header-keyed CSV text into raw rows. Numeric-looking cells become
/// [`RawValue::Number`], blank cells [`RawValue::Empty`]; fully blank lines are
/// skipped. A line whose field count differs from the header fails the whole
/// document.
pub fn parse_csv_document(text: &str) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            skipped += 1;
            continue;
        }

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.clone(), typed_cell(cell)))
            .collect();
        rows.push(row);
    }

    if skipped > 0 {
        debug!("Skipped {} blank CSV lines", skipped);
    }

    Ok(rows)
}

fn typed_cell(cell: &str) -> RawValue {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return RawValue::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => RawValue::Number(n),
        _ => RawValue::Text(trimmed.to_string()),
    }
}

/// Convenience wrapper: CSV text straight to canonical records.
pub fn parse_csv_records(text: &str, options: &ParseOptions) -> Result<Vec<PerformanceRecord>> {
    let rows = parse_csv_document(text)?;
    Ok(parse_rows(&rows, options))
}
