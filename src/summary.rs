use crate::schema::{PerformanceRecord, PeriodSummary};
use crate::utils::safe_div;

impl PeriodSummary {
    /// Builds a summary from raw totals, deriving the ratios.
    pub fn from_totals(revenue: f64, spend: f64, orders: u64) -> Self {
        Self {
            revenue,
            spend,
            orders,
            roas: safe_div(revenue, spend),
            aov: safe_div(revenue, orders as f64),
            cac: safe_div(spend, orders as f64),
        }
    }

    /// Sums the totals of two summaries and recomputes the ratios from the
    /// combined totals. Ratios are never averaged.
    pub fn combine(&self, other: &PeriodSummary) -> PeriodSummary {
        Self::from_totals(
            self.revenue + other.revenue,
            self.spend + other.spend,
            self.orders.saturating_add(other.orders),
        )
    }
}

pub fn summarize(records: &[PerformanceRecord]) -> PeriodSummary {
    let (revenue, spend, orders) = records.iter().fold((0.0, 0.0, 0u64), |acc, r| {
        (acc.0 + r.revenue, acc.1 + r.spend, acc.2.saturating_add(r.orders))
    });

    PeriodSummary::from_totals(revenue, spend, orders)
}
