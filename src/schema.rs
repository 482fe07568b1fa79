use crate::error::{CostFlowError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single scheduled payment. Items move strictly forward,
/// one step at a time, and terminate at `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleItemStatus {
    Pending,
    MilestoneConfirmed,
    InvoiceReceived,
    Approved,
    Paid,
}

impl ScheduleItemStatus {
    pub const ALL: [ScheduleItemStatus; 5] = [
        ScheduleItemStatus::Pending,
        ScheduleItemStatus::MilestoneConfirmed,
        ScheduleItemStatus::InvoiceReceived,
        ScheduleItemStatus::Approved,
        ScheduleItemStatus::Paid,
    ];

    /// The following state in the lifecycle, or `None` once paid.
    pub fn next(self) -> Option<ScheduleItemStatus> {
        match self {
            ScheduleItemStatus::Pending => Some(ScheduleItemStatus::MilestoneConfirmed),
            ScheduleItemStatus::MilestoneConfirmed => Some(ScheduleItemStatus::InvoiceReceived),
            ScheduleItemStatus::InvoiceReceived => Some(ScheduleItemStatus::Approved),
            ScheduleItemStatus::Approved => Some(ScheduleItemStatus::Paid),
            ScheduleItemStatus::Paid => None,
        }
    }

    /// Approved or paid items are never flagged as overdue.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            ScheduleItemStatus::Approved | ScheduleItemStatus::Paid
        )
    }

    /// The "waiting" group on payment dashboards: anything before approval.
    pub fn is_outstanding(self) -> bool {
        matches!(
            self,
            ScheduleItemStatus::Pending
                | ScheduleItemStatus::MilestoneConfirmed
                | ScheduleItemStatus::InvoiceReceived
        )
    }
}

impl fmt::Display for ScheduleItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScheduleItemStatus::Pending => "pending",
            ScheduleItemStatus::MilestoneConfirmed => "milestone_confirmed",
            ScheduleItemStatus::InvoiceReceived => "invoice_received",
            ScheduleItemStatus::Approved => "approved",
            ScheduleItemStatus::Paid => "paid",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentScheduleStatus {
    Draft,
    Active,
}

/// One scheduled payment within a payment schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: String,
    pub schedule_id: String,
    pub cost_item_id: String,
    pub project_id: String,
    pub description: String,
    /// Planned amount for this installment.
    pub amount: f64,
    /// Share of the contract total, 0-100.
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    /// 1-based sequence within the schedule.
    pub order: u32,
    pub status: ScheduleItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<f64>,
}

impl ScheduleItem {
    /// The date that places this item in a calendar month: the paid date once
    /// paid, otherwise the target date. `None` means the item contributes to
    /// no monthly bucket.
    pub fn governing_date(&self) -> Option<NaiveDate> {
        if self.status == ScheduleItemStatus::Paid {
            if let Some(d) = self.paid_date {
                return Some(d);
            }
        }
        self.target_date
    }

    /// Actual cash out for a paid item; falls back to the planned amount when
    /// no explicit paid amount was recorded.
    pub fn settled_amount(&self) -> f64 {
        self.paid_amount.unwrap_or(self.amount)
    }

    /// Moves the item one step forward through the lifecycle.
    pub fn advance_status(&mut self) -> Result<ScheduleItemStatus> {
        match self.status.next() {
            Some(next) => {
                self.status = next;
                Ok(next)
            }
            None => Err(CostFlowError::TerminalStatus(self.id.clone())),
        }
    }

    /// Records a milestone sign-off, advancing a pending item.
    pub fn confirm_milestone(
        &mut self,
        confirmed_by: &str,
        confirmed_at: NaiveDate,
        note: Option<String>,
    ) {
        self.status = ScheduleItemStatus::MilestoneConfirmed;
        self.confirmed_by = Some(confirmed_by.to_string());
        self.confirmed_at = Some(confirmed_at);
        self.confirmed_note = note;
    }

    /// Terminal transition: sets the paid fields and the `Paid` status.
    /// Paid items are never re-opened.
    pub fn mark_paid(&mut self, paid_amount: f64, paid_date: NaiveDate) {
        self.status = ScheduleItemStatus::Paid;
        self.paid_amount = Some(paid_amount);
        self.paid_date = Some(paid_date);
    }
}

/// Groups the installments paid against one cost item's contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub id: String,
    pub cost_item_id: String,
    pub project_id: String,
    pub total_amount: f64,
    pub status: PaymentScheduleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Consultant,
    Supplier,
    Contractor,
    Fee,
}

/// A budget line: an estimate, and a contracted actual once a tender closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostItem {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub category: CostCategory,
    pub estimated_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_amount: Option<f64>,
}

impl CostItem {
    /// The amount schedules are authored against: the contracted actual when
    /// a contractor has been selected, the estimate until then.
    pub fn contract_amount(&self) -> f64 {
        self.actual_amount.unwrap_or(self.estimated_amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// A named project checkpoint an installment can be pegged to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMilestone {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub date: NaiveDate,
}
