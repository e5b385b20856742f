//! # Campaign Metrics
//!
//! A library for turning published ad-performance spreadsheets (Google Sheet
//! CSV exports) into dashboard-ready KPIs and monthly per-source series.
//!
//! ## Core Concepts
//!
//! - **Canonical Record**: One normalized row: date, source tag, spend, revenue, orders
//! - **Window**: Inclusive date range chosen as the last N months, year-to-date, or custom months
//! - **Period Summary**: Totals plus ROAS / AOV / CAC recomputed from those totals
//! - **KPI Set**: Current-period values with percent change against the preceding period
//! - **Month × Source Series**: Chronological buckets feeding bar, line and share charts
//!
//! ## Example
//!
//! ```rust,ignore
//! use campaign_metrics::*;
//! use chrono::NaiveDate;
//!
//! let csv = "date,source,spend,revenue,orders\n\
//!            2024-01-15,google,$100.00,$400,4\n\
//!            2024-01-20,meta,50,150,3\n";
//! let records = parse_csv_records(csv, &ParseOptions::default()).unwrap();
//!
//! let query = DashboardQuery {
//!     range: RangeSpec::LastMonths { months: 6 },
//!     ..Default::default()
//! };
//! let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let view = build_dashboard(&records, &query, today);
//!
//! assert_eq!(view.series.months, vec!["2024-01"]);
//! ```

pub mod clients;
pub mod error;
pub mod grouping;
pub mod ingestion;
pub mod kpi;
pub mod schema;
pub mod state;
pub mod summary;
pub mod utils;
pub mod window;

#[cfg(feature = "sheets")]
pub mod sheets;

pub use clients::{build_sheet_url, ClientDirectory, ClientEntry, ClientSummary, SheetLocator, SheetSelector};
pub use error::{DashboardError, Result};
pub use grouping::{best_month, group, known_slot_totals, totals_by_source, CellMetric};
pub use ingestion::*;
pub use kpi::{compare, compare_summaries, comparison_window, percent_change};
pub use schema::*;
pub use state::{ApplyOutcome, DatasetState, FetchTicket};
pub use summary::summarize;
pub use utils::safe_div;
pub use window::{filter_records, resolve_window, RangeSpec, SourceFilter};

#[cfg(feature = "sheets")]
pub use sheets::SheetsClient;

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Filter parameters for one dashboard render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub range: RangeSpec,
    #[serde(default)]
    pub source: SourceFilter,
    /// Explicit comparison range; only custom ranges need one.
    #[serde(default)]
    pub compare_to: Option<RangeSpec>,
}

pub struct DashboardProcessor;

impl DashboardProcessor {
    pub fn process(records: &[PerformanceRecord], query: &DashboardQuery, today: NaiveDate) -> DashboardView {
        let window = resolve_window(&query.range, today);
        let current = filter_records(records, window.as_ref(), &query.source);

        let comparison = window
            .as_ref()
            .and_then(|w| comparison_window(&query.range, w, query.compare_to.as_ref(), today));
        let previous = filter_records(records, comparison.as_ref(), &query.source);

        info!(
            "Building dashboard over {} of {} records ({:?}, source {:?})",
            current.len(),
            records.len(),
            query.range,
            query.source
        );
        debug!(
            "Current window {:?}, comparison window {:?} with {} records",
            window,
            comparison,
            previous.len()
        );

        let summary = summarize(&current);
        let kpis = compare_summaries(&summary, &summarize(&previous));
        let series = group(&current);
        let best = best_month(&series);

        DashboardView {
            window,
            comparison_window: comparison,
            summary,
            kpis,
            revenue_by_source: totals_by_source(&current),
            best_month: best,
            record_count: current.len(),
            series,
        }
    }

    /// Parses raw rows first, then builds the view.
    pub fn process_rows(
        rows: &[RawRow],
        options: &ParseOptions,
        query: &DashboardQuery,
        today: NaiveDate,
    ) -> DashboardView {
        let records = parse_rows(rows, options);
        Self::process(&records, query, today)
    }
}

pub fn build_dashboard(records: &[PerformanceRecord], query: &DashboardQuery, today: NaiveDate) -> DashboardView {
    DashboardProcessor::process(records, query, today)
}
