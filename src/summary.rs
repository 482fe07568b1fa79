use crate::bucket::bucket_by_month;
use crate::schema::{ScheduleItem, ScheduleItemStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Top-line cash-flow totals. Computed over the full installment set, so
/// undated items count here even though they fall out of the monthly view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub total_planned: f64,
    pub total_paid: f64,
    pub remaining: f64,
    /// Total paid divided by the number of distinct months with nonzero
    /// actual payments; 0 when no month has any.
    pub average_monthly: f64,
    pub overdue_count: usize,
}

/// An installment is overdue when it is neither approved nor paid and its
/// target date is strictly before `today`. Date-only comparison.
pub fn is_overdue(item: &ScheduleItem, today: NaiveDate) -> bool {
    if item.status.is_settled() {
        return false;
    }
    match item.target_date {
        Some(target) => target < today,
        None => false,
    }
}

/// Computes the dashboard summary for a set of installments.
pub fn summarize(items: &[ScheduleItem], today: NaiveDate) -> CashFlowSummary {
    let total_planned: f64 = items.iter().map(|i| i.amount).sum();
    let total_paid: f64 = items
        .iter()
        .filter(|i| i.status == ScheduleItemStatus::Paid)
        .map(|i| i.settled_amount())
        .sum();

    let buckets = bucket_by_month(items);
    let months_with_actual = buckets.values().filter(|b| b.actual > 0.0).count();
    let average_monthly = if months_with_actual > 0 {
        total_paid / months_with_actual as f64
    } else {
        0.0
    };

    let overdue_count = items.iter().filter(|i| is_overdue(i, today)).count();

    CashFlowSummary {
        total_planned,
        total_paid,
        remaining: total_planned - total_paid,
        average_monthly,
        overdue_count,
    }
}

/// KPI block for the payments dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentKpis {
    pub total_scheduled: f64,
    pub total_paid: f64,
    pub total_approved: f64,
    pub total_pending: f64,
    /// Share of the scheduled total already paid, 0-100.
    pub paid_pct: f64,
    pub total_items: usize,
    pub paid_count: usize,
    pub approved_count: usize,
    pub pending_count: usize,
    pub overdue_count: usize,
}

pub fn payment_kpis(items: &[ScheduleItem], today: NaiveDate) -> PaymentKpis {
    let total_scheduled: f64 = items.iter().map(|i| i.amount).sum();

    let paid: Vec<&ScheduleItem> = items
        .iter()
        .filter(|i| i.status == ScheduleItemStatus::Paid)
        .collect();
    let total_paid: f64 = paid.iter().map(|i| i.settled_amount()).sum();

    let approved: Vec<&ScheduleItem> = items
        .iter()
        .filter(|i| i.status == ScheduleItemStatus::Approved)
        .collect();
    let total_approved: f64 = approved.iter().map(|i| i.amount).sum();

    let pending: Vec<&ScheduleItem> = items
        .iter()
        .filter(|i| i.status.is_outstanding())
        .collect();
    let total_pending: f64 = pending.iter().map(|i| i.amount).sum();

    let paid_pct = if total_scheduled > 0.0 {
        (total_paid / total_scheduled) * 100.0
    } else {
        0.0
    };

    PaymentKpis {
        total_scheduled,
        total_paid,
        total_approved,
        total_pending,
        paid_pct,
        total_items: items.len(),
        paid_count: paid.len(),
        approved_count: approved.len(),
        pending_count: pending.len(),
        overdue_count: items.iter().filter(|i| is_overdue(i, today)).count(),
    }
}

/// Rollup for a single schedule's progress view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_amount: f64,
    pub paid_amount: f64,
    pub approved_amount: f64,
    pub confirmed_amount: f64,
    pub pending_amount: f64,
    pub item_count: usize,
    pub paid_count: usize,
    /// Every installment is pegged to a milestone.
    pub all_linked_to_milestones: bool,
    /// Every installment uses a manually entered date.
    pub has_manual_dates_only: bool,
}

pub fn schedule_summary(items: &[ScheduleItem]) -> ScheduleSummary {
    let paid: Vec<&ScheduleItem> = items
        .iter()
        .filter(|i| i.status == ScheduleItemStatus::Paid)
        .collect();

    let sum_where = |pred: fn(&ScheduleItem) -> bool| -> f64 {
        items.iter().filter(|i| pred(i)).map(|i| i.amount).sum()
    };

    ScheduleSummary {
        total_amount: items.iter().map(|i| i.amount).sum(),
        paid_amount: paid.iter().map(|i| i.settled_amount()).sum(),
        approved_amount: sum_where(|i| i.status == ScheduleItemStatus::Approved),
        confirmed_amount: sum_where(|i| i.status == ScheduleItemStatus::MilestoneConfirmed),
        pending_amount: sum_where(|i| {
            matches!(
                i.status,
                ScheduleItemStatus::Pending | ScheduleItemStatus::InvoiceReceived
            )
        }),
        item_count: items.len(),
        paid_count: paid.len(),
        all_linked_to_milestones: !items.is_empty() && items.iter().all(|i| i.milestone_id.is_some()),
        has_manual_dates_only: !items.is_empty() && items.iter().all(|i| i.milestone_id.is_none()),
    }
}

/// Count and amount per lifecycle status, in lifecycle order. Paid slices
/// report settled amounts, all others the planned amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSlice {
    pub status: ScheduleItemStatus,
    pub count: usize,
    pub amount: f64,
}

pub fn status_breakdown(items: &[ScheduleItem]) -> Vec<StatusSlice> {
    ScheduleItemStatus::ALL
        .iter()
        .map(|&status| {
            let matching: Vec<&ScheduleItem> =
                items.iter().filter(|i| i.status == status).collect();
            let amount = matching
                .iter()
                .map(|i| {
                    if status == ScheduleItemStatus::Paid {
                        i.settled_amount()
                    } else {
                        i.amount
                    }
                })
                .sum();
            StatusSlice {
                status,
                count: matching.len(),
                amount,
            }
        })
        .collect()
}
