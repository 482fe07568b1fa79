use crate::bucket::{bucket_by_month, MonthKey};
use crate::schema::ScheduleItem;
use crate::summary::{summarize, CashFlowSummary};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// One month of the reconciled cash-flow series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthFlow {
    pub key: MonthKey,
    pub planned: f64,
    pub actual: f64,
    /// `actual - planned`; positive means more cash went out than planned.
    pub variance: f64,
    /// Running total of actual payments up to and including this month.
    pub cumulative: f64,
    pub items: Vec<ScheduleItem>,
}

/// Buckets installments by month and walks the buckets in chronological
/// order, attaching the running paid total. The output is ordered ascending
/// by month and `cumulative` is monotonically non-decreasing.
pub fn monthly_cash_flow(items: &[ScheduleItem]) -> Vec<MonthFlow> {
    let buckets = bucket_by_month(items);

    let mut cumulative = 0.0;
    buckets
        .into_values()
        .map(|bucket| {
            cumulative += bucket.actual;
            MonthFlow {
                key: bucket.key,
                planned: bucket.planned,
                actual: bucket.actual,
                variance: bucket.actual - bucket.planned,
                cumulative,
                items: bucket.items,
            }
        })
        .collect()
}

/// The full derived output consumed by dashboards and exports: the monthly
/// series plus the top-line summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowReport {
    pub months: Vec<MonthFlow>,
    pub summary: CashFlowSummary,
}

impl CashFlowReport {
    /// Recomputed on every call from the installments handed in; nothing is
    /// cached. `today` anchors the overdue check.
    pub fn build(items: &[ScheduleItem], today: NaiveDate) -> Self {
        let months = monthly_cash_flow(items);
        let summary = summarize(items, today);
        debug!(
            "cash-flow report: {} installments across {} months, planned {:.0}, paid {:.0}",
            items.len(),
            months.len(),
            summary.total_planned,
            summary.total_paid
        );
        Self { months, summary }
    }
}
