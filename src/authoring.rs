use crate::error::{CostFlowError, Result};
use crate::schema::{ProjectMilestone, ScheduleItem, ScheduleItemStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Absolute tolerance, in currency units, between the installment total and
/// the contract amount at save time.
pub const AMOUNT_TOLERANCE: f64 = 1.0;

/// One row of a schedule being composed, before persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallmentDraft {
    pub description: String,
    pub amount: f64,
    /// Kept in sync with `amount`, 0-100 with two decimals.
    pub percentage: f64,
    pub milestone_id: Option<String>,
    pub milestone_name: Option<String>,
    pub target_date: Option<NaiveDate>,
    /// Carried over when editing an existing schedule so a paid installment
    /// stays paid through the rewrite.
    pub existing_status: Option<ScheduleItemStatus>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl InstallmentDraft {
    /// Sets the amount and recomputes the percentage share of the contract.
    pub fn set_amount(&mut self, amount: f64, contract_total: f64) {
        self.amount = amount;
        if contract_total > 0.0 {
            self.percentage = round2((amount / contract_total) * 100.0);
        }
    }

    /// Sets the percentage and recomputes the amount, rounded to whole
    /// currency.
    pub fn set_percentage(&mut self, percentage: f64, contract_total: f64) {
        self.percentage = percentage;
        if contract_total > 0.0 {
            self.amount = ((percentage / 100.0) * contract_total).round();
        }
    }

    /// Pegs this row to a milestone, copying its name and date.
    pub fn apply_milestone(&mut self, milestone: &ProjectMilestone) {
        self.milestone_id = Some(milestone.id.clone());
        self.milestone_name = Some(milestone.name.clone());
        self.target_date = Some(milestone.date);
    }

    /// Unlinks the row from its milestone; the date is kept as a manual one.
    pub fn clear_milestone(&mut self) {
        self.milestone_id = None;
        self.milestone_name = None;
    }
}

/// Spreads the contract total evenly over the rows using floor division;
/// the remainder goes entirely on the first row so the amounts sum exactly
/// to the contract total.
pub fn distribute_evenly(contract_total: f64, rows: &mut [InstallmentDraft]) {
    if rows.is_empty() || contract_total <= 0.0 {
        return;
    }

    let n = rows.len() as f64;
    let per_row = (contract_total / n).floor();
    let remainder = contract_total - per_row * n;

    for (idx, row) in rows.iter_mut().enumerate() {
        let amount = if idx == 0 { per_row + remainder } else { per_row };
        row.set_amount(amount, contract_total);
    }
}

/// Pre-save validation. Every row needs a description and a positive amount,
/// the total must stay within [`AMOUNT_TOLERANCE`] of the contract, and dates
/// must not decrease down the rows. Errors carry the 1-based row number.
pub fn validate(rows: &[InstallmentDraft], contract_total: f64) -> Result<()> {
    for (idx, row) in rows.iter().enumerate() {
        if row.description.trim().is_empty() {
            return Err(CostFlowError::InvalidInstallment {
                row: idx + 1,
                details: "description must not be empty".to_string(),
            });
        }
        if row.amount <= 0.0 {
            return Err(CostFlowError::InvalidInstallment {
                row: idx + 1,
                details: "amount must be positive".to_string(),
            });
        }
    }

    let total: f64 = rows.iter().map(|r| r.amount).sum();
    if (total - contract_total).abs() > AMOUNT_TOLERANCE {
        return Err(CostFlowError::UnbalancedSchedule {
            total,
            contract: contract_total,
            tolerance: AMOUNT_TOLERANCE,
        });
    }

    let mut prev: Option<(usize, NaiveDate)> = None;
    for (idx, row) in rows.iter().enumerate() {
        if let Some(date) = row.target_date {
            if let Some((prev_idx, prev_date)) = prev {
                if date < prev_date {
                    return Err(CostFlowError::DateOrder {
                        row: idx + 1,
                        prev_row: prev_idx + 1,
                    });
                }
            }
            prev = Some((idx, date));
        }
    }

    Ok(())
}

/// Converts validated drafts into schedule items for batch persistence.
/// Ids are left empty; the store assigns them on insert. Row order becomes
/// the 1-based `order`, and rows carried over from an edit keep their status.
pub fn build_items(
    rows: &[InstallmentDraft],
    schedule_id: &str,
    cost_item_id: &str,
    project_id: &str,
) -> Vec<ScheduleItem> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| ScheduleItem {
            id: String::new(),
            schedule_id: schedule_id.to_string(),
            cost_item_id: cost_item_id.to_string(),
            project_id: project_id.to_string(),
            description: row.description.trim().to_string(),
            amount: row.amount,
            percentage: row.percentage,
            milestone_id: row.milestone_id.clone(),
            milestone_name: row.milestone_name.clone(),
            target_date: row.target_date,
            order: (idx + 1) as u32,
            status: row.existing_status.unwrap_or(ScheduleItemStatus::Pending),
            confirmed_by: None,
            confirmed_at: None,
            confirmed_note: None,
            approved_by: None,
            approved_at: None,
            paid_date: None,
            paid_amount: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(description: &str, amount: f64) -> InstallmentDraft {
        InstallmentDraft {
            description: description.to_string(),
            amount,
            ..Default::default()
        }
    }

    #[test]
    fn test_amount_percentage_round_trip() {
        let mut row = draft("Advance", 0.0);
        row.set_amount(500.0, 2000.0);
        assert_eq!(row.percentage, 25.00);

        row.set_percentage(25.0, 2000.0);
        assert_eq!(row.amount, 500.0);
    }

    #[test]
    fn test_percentage_rounds_to_two_decimals() {
        let mut row = draft("Advance", 0.0);
        row.set_amount(1.0, 3.0);
        assert_eq!(row.percentage, 33.33);
    }

    #[test]
    fn test_distribute_evenly_exactness() {
        let mut rows = vec![draft("a", 0.0), draft("b", 0.0), draft("c", 0.0)];
        distribute_evenly(1000.0, &mut rows);

        let amounts: Vec<f64> = rows.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![334.0, 333.0, 333.0]);
        let total: f64 = amounts.iter().sum();
        assert_eq!(total, 1000.0);
    }

    #[test]
    fn test_distribute_evenly_no_remainder() {
        let mut rows = vec![draft("a", 0.0), draft("b", 0.0)];
        distribute_evenly(500.0, &mut rows);
        assert_eq!(rows[0].amount, 250.0);
        assert_eq!(rows[1].amount, 250.0);
        assert_eq!(rows[0].percentage, 50.0);
    }

    #[test]
    fn test_validate_rejects_blank_description() {
        let rows = vec![draft("  ", 100.0)];
        let err = validate(&rows, 100.0).unwrap_err();
        match err {
            CostFlowError::InvalidInstallment { row, .. } => assert_eq!(row, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_nonpositive_amount() {
        let rows = vec![draft("Advance", 100.0), draft("Final", 0.0)];
        let err = validate(&rows, 100.0).unwrap_err();
        match err {
            CostFlowError::InvalidInstallment { row, .. } => assert_eq!(row, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_tolerance_of_one_unit() {
        let rows = vec![draft("a", 333.0), draft("b", 333.0), draft("c", 333.0)];
        // 999 vs 1000 is within tolerance.
        assert!(validate(&rows, 1000.0).is_ok());
        // 999 vs 1001 is not.
        assert!(matches!(
            validate(&rows, 1001.0),
            Err(CostFlowError::UnbalancedSchedule { .. })
        ));
    }

    #[test]
    fn test_validate_date_order_names_offending_row() {
        let mut rows = vec![draft("a", 500.0), draft("b", 250.0), draft("c", 250.0)];
        rows[0].target_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        // Row 2 has no date; skipped by the ordering check.
        rows[2].target_date = NaiveDate::from_ymd_opt(2024, 2, 1);

        let err = validate(&rows, 1000.0).unwrap_err();
        match err {
            CostFlowError::DateOrder { row, prev_row } => {
                assert_eq!(row, 3);
                assert_eq!(prev_row, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_apply_milestone_copies_name_and_date() {
        let milestone = ProjectMilestone {
            id: "ms-1".to_string(),
            project_id: "p-1".to_string(),
            name: "Foundation complete".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        };
        let mut row = draft("Milestone 1", 100.0);
        row.apply_milestone(&milestone);
        assert_eq!(row.milestone_name.as_deref(), Some("Foundation complete"));
        assert_eq!(row.target_date, Some(milestone.date));

        row.clear_milestone();
        assert!(row.milestone_id.is_none());
        assert_eq!(row.target_date, Some(milestone.date));
    }

    #[test]
    fn test_build_items_assigns_order_and_preserves_status() {
        let mut rows = vec![draft("Advance", 500.0), draft("Final", 500.0)];
        rows[0].existing_status = Some(ScheduleItemStatus::Paid);

        let items = build_items(&rows, "ps-1", "ci-1", "p-1");
        assert_eq!(items[0].order, 1);
        assert_eq!(items[1].order, 2);
        assert_eq!(items[0].status, ScheduleItemStatus::Paid);
        assert_eq!(items[1].status, ScheduleItemStatus::Pending);
        assert_eq!(items[0].schedule_id, "ps-1");
    }
}
