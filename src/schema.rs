use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One cell of a spreadsheet row as handed over by the CSV layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Empty,
}

impl RawValue {
    /// Empty cells and whitespace-only text do not count as a match during
    /// alias resolution.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(text) => text.trim().is_empty(),
            RawValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Text(text) => Some(text.trim().to_string()),
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Empty => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(value.to_string())
        }
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(value)
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// Column name -> raw cell. Column names are matched exactly.
pub type RawRow = BTreeMap<String, RawValue>;

/// Marketing channel tag. Always lower-cased and never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Source(String);

impl Source {
    pub const GOOGLE: &'static str = "google";
    pub const META: &'static str = "meta";
    pub const SHOPIFY: &'static str = "shopify";
    pub const UNKNOWN: &'static str = "unknown";

    /// Fixed chart slots, in display order.
    pub const KNOWN_SLOTS: [&'static str; 3] = [Self::GOOGLE, Self::META, Self::SHOPIFY];

    pub fn new(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase();
        if normalized.is_empty() {
            Self(Self::UNKNOWN.to_string())
        } else {
            Self(normalized)
        }
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known_slot(&self) -> bool {
        Self::KNOWN_SLOTS.contains(&self.0.as_str())
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Source {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceRecord {
    #[schemars(description = "Calendar day this row of activity belongs to")]
    pub date: NaiveDate,

    #[schemars(description = "Lower-cased channel tag (google, meta, shopify, ...), 'unknown' when absent")]
    pub source: Source,

    #[schemars(description = "Ad spend, summed across every spend column present in the row")]
    pub spend: f64,

    #[schemars(description = "Revenue / conversion value, summed across every revenue column present in the row")]
    pub revenue: f64,

    #[schemars(description = "Order count")]
    pub orders: u64,
}

impl PerformanceRecord {
    /// Builds a record, normalizing non-finite or negative amounts to 0.
    pub fn new(date: NaiveDate, source: Source, spend: f64, revenue: f64, orders: u64) -> Self {
        Self {
            date,
            source,
            spend: sanitize_amount(spend),
            revenue: sanitize_amount(revenue),
            orders,
        }
    }

    pub fn roas(&self) -> f64 {
        crate::utils::safe_div(self.revenue, self.spend)
    }

    pub fn aov(&self) -> f64 {
        crate::utils::safe_div(self.revenue, self.orders as f64)
    }

    pub fn cac(&self) -> f64 {
        crate::utils::safe_div(self.spend, self.orders as f64)
    }
}

pub(crate) fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PeriodSummary {
    pub revenue: f64,
    pub spend: f64,
    pub orders: u64,
    #[schemars(description = "revenue / spend, 0 when spend is 0")]
    pub roas: f64,
    #[schemars(description = "revenue / orders, 0 when orders is 0")]
    pub aov: f64,
    #[schemars(description = "spend / orders, 0 when orders is 0")]
    pub cac: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KpiMetric {
    Revenue,
    Spend,
    Orders,
    Roas,
    Aov,
    Cac,
}

impl KpiMetric {
    pub const ALL: [KpiMetric; 6] = [
        KpiMetric::Revenue,
        KpiMetric::Spend,
        KpiMetric::Orders,
        KpiMetric::Roas,
        KpiMetric::Aov,
        KpiMetric::Cac,
    ];

    pub fn value_of(&self, summary: &PeriodSummary) -> f64 {
        match self {
            KpiMetric::Revenue => summary.revenue,
            KpiMetric::Spend => summary.spend,
            KpiMetric::Orders => summary.orders as f64,
            KpiMetric::Roas => summary.roas,
            KpiMetric::Aov => summary.aov,
            KpiMetric::Cac => summary.cac,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KpiResult {
    #[schemars(description = "Metric value over the current period")]
    pub value: f64,
    #[schemars(description = "Percent change against the previous period; 0 when the previous value is 0")]
    pub change: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KpiSet {
    pub revenue: KpiResult,
    pub spend: KpiResult,
    pub orders: KpiResult,
    pub roas: KpiResult,
    pub aov: KpiResult,
    pub cac: KpiResult,
}

impl KpiSet {
    pub fn get(&self, metric: KpiMetric) -> &KpiResult {
        match metric {
            KpiMetric::Revenue => &self.revenue,
            KpiMetric::Spend => &self.spend,
            KpiMetric::Orders => &self.orders,
            KpiMetric::Roas => &self.roas,
            KpiMetric::Aov => &self.aov,
            KpiMetric::Cac => &self.cac,
        }
    }

    pub(crate) fn get_mut(&mut self, metric: KpiMetric) -> &mut KpiResult {
        match metric {
            KpiMetric::Revenue => &mut self.revenue,
            KpiMetric::Spend => &mut self.spend,
            KpiMetric::Orders => &mut self.orders,
            KpiMetric::Roas => &mut self.roas,
            KpiMetric::Aov => &mut self.aov,
            KpiMetric::Cac => &mut self.cac,
        }
    }
}

/// Totals for one (month, source) bucket. ROAS is derived from the bucket's
/// own totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceCell {
    pub revenue: f64,
    pub spend: f64,
    pub orders: u64,
    pub roas: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthSourceSeries {
    #[schemars(description = "Month keys in YYYY-MM format, strictly ascending")]
    pub months: Vec<String>,

    #[schemars(description = "Display labels aligned with `months`, e.g. 'Jan 2024'")]
    pub labels: Vec<String>,

    #[schemars(description = "Per-month cells keyed by source tag")]
    pub cells: BTreeMap<String, BTreeMap<Source, SourceCell>>,

    #[schemars(description = "Per-month totals across every source")]
    pub totals: BTreeMap<String, SourceCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BestMonth {
    pub month: String,
    pub label: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Everything a dashboard page renders for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardView {
    #[schemars(description = "Resolved current window; absent while a custom range is incomplete")]
    pub window: Option<DateWindow>,

    #[schemars(description = "Window the KPI deltas were measured against, if any")]
    pub comparison_window: Option<DateWindow>,

    pub summary: PeriodSummary,
    pub kpis: KpiSet,
    pub series: MonthSourceSeries,

    #[schemars(description = "Revenue per source across the current window, for share-of-total displays")]
    pub revenue_by_source: BTreeMap<Source, f64>,

    pub best_month: Option<BestMonth>,

    #[schemars(description = "Number of records inside the current window")]
    pub record_count: usize,
}

impl DashboardView {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DashboardView)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
