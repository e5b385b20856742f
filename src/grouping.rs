use crate::schema::{BestMonth, MonthSourceSeries, PerformanceRecord, Source, SourceCell};
use crate::utils::{month_key, month_label, month_start, safe_div};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-cell value selectable for chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellMetric {
    Revenue,
    Spend,
    Orders,
    Roas,
}

impl CellMetric {
    pub fn value_of(&self, cell: &SourceCell) -> f64 {
        match self {
            CellMetric::Revenue => cell.revenue,
            CellMetric::Spend => cell.spend,
            CellMetric::Orders => cell.orders as f64,
            CellMetric::Roas => cell.roas,
        }
    }
}

#[derive(Default)]
struct CellTotals {
    revenue: f64,
    spend: f64,
    orders: u64,
}

impl CellTotals {
    fn add(&mut self, record: &PerformanceRecord) {
        self.revenue += record.revenue;
        self.spend += record.spend;
        self.orders = self.orders.saturating_add(record.orders);
    }

    fn to_cell(&self) -> SourceCell {
        SourceCell {
            revenue: self.revenue,
            spend: self.spend,
            orders: self.orders,
            roas: safe_div(self.revenue, self.spend),
        }
    }
}

/// Buckets records by calendar month and source. Months come out in
/// ascending order whatever the input order; ROAS is taken from each
/// bucket's summed totals.
pub fn group(records: &[PerformanceRecord]) -> MonthSourceSeries {
    // Keyed by the first day of the month so ordering never depends on the label.
    let mut grid: BTreeMap<NaiveDate, BTreeMap<Source, CellTotals>> = BTreeMap::new();
    for record in records {
        grid.entry(month_start(record.date))
            .or_default()
            .entry(record.source.clone())
            .or_default()
            .add(record);
    }

    let mut series = MonthSourceSeries::default();
    for (month, sources) in grid {
        let key = month_key(month);

        let mut total = CellTotals::default();
        for cell in sources.values() {
            total.revenue += cell.revenue;
            total.spend += cell.spend;
            total.orders = total.orders.saturating_add(cell.orders);
        }

        series.months.push(key.clone());
        series.labels.push(month_label(month));
        series.totals.insert(key.clone(), total.to_cell());
        series.cells.insert(
            key,
            sources
                .into_iter()
                .map(|(source, cell)| (source, cell.to_cell()))
                .collect(),
        );
    }

    series
}

impl MonthSourceSeries {
    pub fn cell(&self, month: &str, source: &str) -> Option<&SourceCell> {
        self.cells.get(month)?.get(&Source::new(source))
    }

    /// Values for one known slot, aligned with `months`; missing months are 0.
    /// Sources outside the fixed slots have no series.
    pub fn slot_series(&self, source: &str, metric: CellMetric) -> Option<Vec<f64>> {
        let source = Source::new(source);
        if !source.is_known_slot() {
            return None;
        }

        Some(
            self.months
                .iter()
                .map(|month| {
                    self.cells
                        .get(month)
                        .and_then(|cells| cells.get(&source))
                        .map(|cell| metric.value_of(cell))
                        .unwrap_or(0.0)
                })
                .collect(),
        )
    }

    /// Cross-source totals, aligned with `months`.
    pub fn total_series(&self, metric: CellMetric) -> Vec<f64> {
        self.months
            .iter()
            .map(|month| {
                self.totals
                    .get(month)
                    .map(|cell| metric.value_of(cell))
                    .unwrap_or(0.0)
            })
            .collect()
    }
}

/// Revenue per source across all records, for share-of-total displays.
pub fn totals_by_source(records: &[PerformanceRecord]) -> BTreeMap<Source, f64> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(record.source.clone()).or_insert(0.0) += record.revenue;
    }
    totals
}

/// Revenue for the fixed chart slots only, in slot order.
pub fn known_slot_totals(totals: &BTreeMap<Source, f64>) -> Vec<(Source, f64)> {
    Source::KNOWN_SLOTS
        .iter()
        .map(|slot| {
            let source = Source::new(slot);
            let revenue = totals.get(&source).copied().unwrap_or(0.0);
            (source, revenue)
        })
        .collect()
}

/// Month with the highest cross-source revenue; the earliest month wins ties.
pub fn best_month(series: &MonthSourceSeries) -> Option<BestMonth> {
    let mut best: Option<BestMonth> = None;
    for (month, label) in series.months.iter().zip(series.labels.iter()) {
        let revenue = series.totals.get(month).map(|c| c.revenue).unwrap_or(0.0);
        let better = best.as_ref().map_or(true, |b| revenue > b.revenue);
        if better {
            best = Some(BestMonth {
                month: month.clone(),
                label: label.clone(),
                revenue,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(y: i32, m: u32, d: u32, source: &str, spend: f64, revenue: f64, orders: u64) -> PerformanceRecord {
        PerformanceRecord::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            Source::new(source),
            spend,
            revenue,
            orders,
        )
    }

    #[test]
    fn test_single_month_two_sources() {
        let records = vec![
            record(2024, 1, 15, "google", 100.0, 400.0, 4),
            record(2024, 1, 20, "meta", 50.0, 150.0, 3),
        ];
        let series = group(&records);

        assert_eq!(series.months, vec!["2024-01".to_string()]);
        assert_eq!(series.labels, vec!["Jan 2024".to_string()]);

        let google = series.cell("2024-01", "google").unwrap();
        assert_eq!(google.revenue, 400.0);
        assert_eq!(google.spend, 100.0);
        assert!((google.roas - 4.0).abs() < 1e-9);

        let meta = series.cell("2024-01", "meta").unwrap();
        assert_eq!(meta.revenue, 150.0);
        assert!((meta.roas - 3.0).abs() < 1e-9);

        let total = series.totals.get("2024-01").unwrap();
        assert_eq!(total.spend, 150.0);
        assert_eq!(total.revenue, 550.0);
        assert_eq!(total.orders, 7);
        assert!((total.roas - 550.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_months_are_ascending_for_any_input_order() {
        let records = vec![
            record(2024, 3, 1, "google", 1.0, 1.0, 0),
            record(2023, 12, 31, "meta", 1.0, 1.0, 0),
            record(2024, 1, 5, "google", 1.0, 1.0, 0),
            record(2024, 3, 20, "meta", 1.0, 1.0, 0),
        ];
        let expected = vec!["2023-12", "2024-01", "2024-03"];

        let forward = group(&records);
        assert_eq!(forward.months, expected);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(group(&reversed).months, expected);

        let mut rotated = records;
        rotated.rotate_left(2);
        assert_eq!(group(&rotated).months, expected);
    }

    #[test]
    fn test_cell_roas_is_not_an_average() {
        let records = vec![
            record(2024, 5, 1, "google", 100.0, 1000.0, 1),
            record(2024, 5, 2, "google", 900.0, 900.0, 1),
        ];
        let series = group(&records);
        let cell = series.cell("2024-05", "google").unwrap();
        // Per-record ROAS values are 10.0 and 1.0.
        assert!((cell.roas - 1.9).abs() < 1e-9);
    }

    #[test]
    fn test_slot_series_alignment() {
        let records = vec![
            record(2024, 1, 1, "google", 10.0, 40.0, 1),
            record(2024, 2, 1, "meta", 20.0, 60.0, 1),
            record(2024, 2, 1, "tiktok", 5.0, 5.0, 1),
        ];
        let series = group(&records);

        assert_eq!(series.slot_series("google", CellMetric::Spend), Some(vec![10.0, 0.0]));
        assert_eq!(series.slot_series("meta", CellMetric::Revenue), Some(vec![0.0, 60.0]));
        assert_eq!(series.slot_series("tiktok", CellMetric::Revenue), None);
        assert!(series.cell("2024-02", "tiktok").is_some());
        assert_eq!(series.total_series(CellMetric::Revenue), vec![40.0, 65.0]);
    }

    #[test]
    fn test_totals_by_source_sums_revenue_only() {
        let records = vec![
            record(2024, 1, 1, "google", 10.0, 40.0, 1),
            record(2024, 2, 1, "google", 10.0, 60.0, 1),
            record(2024, 2, 1, "tiktok", 99.0, 5.0, 1),
        ];
        let totals = totals_by_source(&records);
        assert_eq!(totals.get(&Source::new("google")), Some(&100.0));
        assert_eq!(totals.get(&Source::new("tiktok")), Some(&5.0));

        let slots = known_slot_totals(&totals);
        let names: Vec<&str> = slots.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["google", "meta", "shopify"]);
        assert_eq!(slots[0].1, 100.0);
        assert_eq!(slots[1].1, 0.0);
    }

    #[test]
    fn test_best_month() {
        assert!(best_month(&MonthSourceSeries::default()).is_none());

        let records = vec![
            record(2024, 1, 1, "google", 10.0, 500.0, 1),
            record(2024, 2, 1, "meta", 10.0, 700.0, 1),
            record(2024, 3, 1, "meta", 10.0, 700.0, 1),
        ];
        let best = best_month(&group(&records)).unwrap();
        assert_eq!(best.month, "2024-02");
        assert_eq!(best.label, "Feb 2024");
        assert_eq!(best.revenue, 700.0);
    }

    #[test]
    fn test_order_totals_saturate_instead_of_overflowing() {
        let rows: Vec<crate::schema::RawRow> = ["google", "google", "meta"]
            .iter()
            .map(|source| {
                [("date", "2024-01-10"), ("source", *source), ("orders", "1e19")]
                    .iter()
                    .map(|(k, v)| (k.to_string(), crate::schema::RawValue::from(*v)))
                    .collect()
            })
            .collect();
        let records = crate::ingestion::parse_rows(&rows, &Default::default());
        assert_eq!(records.len(), 3);

        let series = group(&records);
        assert_eq!(series.cell("2024-01", "google").unwrap().orders, u64::MAX);
        assert_eq!(series.totals.get("2024-01").unwrap().orders, u64::MAX);
    }
}
