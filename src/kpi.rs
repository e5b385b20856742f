use crate::schema::{DateWindow, KpiMetric, KpiResult, KpiSet, PerformanceRecord, PeriodSummary};
use crate::summary::summarize;
use crate::window::{resolve_window, RangeSpec};
use chrono::NaiveDate;

/// Percent change from `previous` to `current`. A zero baseline reports 0
/// rather than an undefined swing.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

pub fn compare_summaries(current: &PeriodSummary, previous: &PeriodSummary) -> KpiSet {
    let mut kpis = KpiSet::default();
    for metric in KpiMetric::ALL {
        let value = metric.value_of(current);
        *kpis.get_mut(metric) = KpiResult {
            value,
            change: percent_change(value, metric.value_of(previous)),
        };
    }
    kpis
}

pub fn compare(current: &[PerformanceRecord], previous: &[PerformanceRecord]) -> KpiSet {
    compare_summaries(&summarize(current), &summarize(previous))
}

/// Window the current period is measured against.
///
/// Relative and year-to-date windows compare against the equally long block
/// of months right before them. A custom window has no natural predecessor:
/// it uses `explicit` when given, otherwise there is no comparison.
pub fn comparison_window(
    spec: &RangeSpec,
    current: &DateWindow,
    explicit: Option<&RangeSpec>,
    today: NaiveDate,
) -> Option<DateWindow> {
    if let Some(explicit) = explicit {
        return resolve_window(explicit, today);
    }

    match spec {
        RangeSpec::LastMonths { .. } | RangeSpec::YearToDate => Some(current.preceding()),
        RangeSpec::Custom { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Source;

    fn record(y: i32, m: u32, spend: f64, revenue: f64, orders: u64) -> PerformanceRecord {
        PerformanceRecord::new(
            NaiveDate::from_ymd_opt(y, m, 10).unwrap(),
            Source::new("google"),
            spend,
            revenue,
            orders,
        )
    }

    #[test]
    fn test_percent_change() {
        assert!((percent_change(150.0, 100.0) - 50.0).abs() < 1e-9);
        assert!((percent_change(50.0, 100.0) + 50.0).abs() < 1e-9);
        assert_eq!(percent_change(100.0, 0.0), 0.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_compare_against_empty_previous() {
        let current = vec![record(2024, 3, 100.0, 400.0, 4), record(2024, 4, 50.0, 0.0, 0)];
        let kpis = compare(&current, &[]);

        for metric in KpiMetric::ALL {
            assert_eq!(kpis.get(metric).change, 0.0, "{:?} should have zero change", metric);
        }
        assert_eq!(kpis.revenue.value, 400.0);
        assert_eq!(kpis.spend.value, 150.0);
        assert_eq!(kpis.orders.value, 4.0);
    }

    #[test]
    fn test_compare_periods() {
        let current = vec![record(2024, 4, 200.0, 1000.0, 10)];
        let previous = vec![record(2024, 3, 100.0, 400.0, 8)];
        let kpis = compare(&current, &previous);

        assert!((kpis.revenue.change - 150.0).abs() < 1e-9);
        assert!((kpis.spend.change - 100.0).abs() < 1e-9);
        assert!((kpis.orders.change - 25.0).abs() < 1e-9);
        // ROAS 5.0 vs 4.0
        assert!((kpis.roas.value - 5.0).abs() < 1e-9);
        assert!((kpis.roas.change - 25.0).abs() < 1e-9);
        // AOV 100 vs 50
        assert!((kpis.aov.change - 100.0).abs() < 1e-9);
        // CAC 20 vs 12.5
        assert!((kpis.cac.change - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_comparison_window_for_relative_range() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();
        let spec = RangeSpec::LastMonths { months: 6 };
        let current = resolve_window(&spec, today).unwrap();
        let previous = comparison_window(&spec, &current, None, today).unwrap();

        assert_eq!(previous.start, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
        assert_eq!(previous.end, NaiveDate::from_ymd_opt(2023, 10, 31).unwrap());
        assert_eq!(previous.end.succ_opt().unwrap(), current.start);
    }

    #[test]
    fn test_comparison_window_for_custom_range() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let spec = RangeSpec::Custom {
            start: Some("2024-02".to_string()),
            end: Some("2024-03".to_string()),
        };
        let current = resolve_window(&spec, today).unwrap();
        assert!(comparison_window(&spec, &current, None, today).is_none());

        let explicit = RangeSpec::Custom {
            start: Some("2023-02".to_string()),
            end: Some("2023-03".to_string()),
        };
        let previous = comparison_window(&spec, &current, Some(&explicit), today).unwrap();
        assert_eq!(previous.start, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());
        assert_eq!(previous.end, NaiveDate::from_ymd_opt(2023, 3, 31).unwrap());
    }
}
