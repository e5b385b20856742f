use crate::error::{DashboardError, Result};
use crate::schema::{DateWindow, PerformanceRecord, Source};
use crate::utils::{last_day_of_month, month_end, months_back, months_spanned, parse_month_string};
use chrono::{Datelike, NaiveDate};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the dashboard's date window is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeSpec {
    /// The current month plus the `months - 1` months before it.
    LastMonths { months: u32 },
    /// January 1 of the current year through the end of the current month.
    YearToDate,
    /// Whole months from `start` through `end`, both "YYYY-MM". Stays
    /// unresolved until both bounds are supplied.
    Custom {
        start: Option<String>,
        end: Option<String>,
    },
}

impl Default for RangeSpec {
    fn default() -> Self {
        RangeSpec::LastMonths { months: 6 }
    }
}

impl FromStr for RangeSpec {
    type Err = DashboardError;

    /// Accepts "6m", "12m", "ytd", "YYYY-MM" or "YYYY-MM:YYYY-MM".
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("ytd") {
            return Ok(RangeSpec::YearToDate);
        }

        if let Some(count) = trimmed
            .strip_suffix('m')
            .or_else(|| trimmed.strip_suffix('M'))
            .and_then(|n| n.parse::<u32>().ok())
        {
            return Ok(RangeSpec::LastMonths { months: count });
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (start, end) = match parts.as_slice() {
            [single] => (*single, *single),
            [start, end] => (*start, *end),
            _ => {
                return Err(DashboardError::DateError(format!(
                    "Invalid range: {}. Expected '6m', 'ytd' or 'YYYY-MM:YYYY-MM'",
                    s
                )))
            }
        };
        parse_month_string(start)?;
        parse_month_string(end)?;

        Ok(RangeSpec::Custom {
            start: Some(start.trim().to_string()),
            end: Some(end.trim().to_string()),
        })
    }
}

/// Which sources pass the filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceFilter {
    #[default]
    All,
    Only(Source),
}

impl SourceFilter {
    pub fn matches(&self, source: &Source) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Only(wanted) => wanted == source,
        }
    }
}

impl From<&str> for SourceFilter {
    fn from(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("all") {
            SourceFilter::All
        } else {
            SourceFilter::Only(Source::new(tag))
        }
    }
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Calendar months touched by the window, counting partial months.
    pub fn month_span(&self) -> u32 {
        months_spanned(self.start, self.end)
    }

    /// The block of the same number of whole months ending the month before
    /// this window starts.
    pub fn preceding(&self) -> DateWindow {
        let span = self.month_span().max(1);
        let start = months_back(self.start, span);
        let end = month_end(months_back(self.start, 1));
        DateWindow::new(start, end)
    }
}

/// Resolves a range spec against `today`. `None` means the window is not
/// resolvable yet (an incomplete or inverted custom range).
pub fn resolve_window(spec: &RangeSpec, today: NaiveDate) -> Option<DateWindow> {
    match spec {
        RangeSpec::LastMonths { months } => {
            let back = months.saturating_sub(1);
            Some(DateWindow::new(months_back(today, back), month_end(today)))
        }
        RangeSpec::YearToDate => {
            let start = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
            Some(DateWindow::new(start, month_end(today)))
        }
        RangeSpec::Custom { start, end } => {
            let start = parse_month_string(start.as_deref()?).ok()?;
            let end_month = parse_month_string(end.as_deref()?).ok()?;
            let end = last_day_of_month(end_month.year(), end_month.month());
            if end < start {
                debug!("Custom range ends ({}) before it starts ({})", end, start);
                return None;
            }
            Some(DateWindow::new(start, end))
        }
    }
}

/// Keeps records inside the window whose source passes `source`, preserving
/// input order. An unresolved window keeps nothing.
pub fn filter_records(
    records: &[PerformanceRecord],
    window: Option<&DateWindow>,
    source: &SourceFilter,
) -> Vec<PerformanceRecord> {
    let Some(window) = window else {
        return Vec::new();
    };

    records
        .iter()
        .filter(|r| window.contains(r.date) && source.matches(&r.source))
        .cloned()
        .collect()
}
