use crate::schema::{CostItem, Project, ScheduleItem, ScheduleItemStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const UNKNOWN_COST_ITEM: &str = "Unknown cost item";
const UNKNOWN_PROJECT: &str = "Unknown project";

/// An installment joined to the name of its cost item and project, the shape
/// the monthly drill-down and export tables work with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedItem {
    pub item: ScheduleItem,
    pub cost_item_name: String,
    /// Resolved through the cost item; empty when the reference is missing.
    pub project_id: String,
    pub project_name: String,
}

/// Joins installments to cost items and projects via id lookup maps.
/// Installments referencing a missing cost item or project keep placeholder
/// names rather than being dropped.
pub fn enrich_items(
    items: &[ScheduleItem],
    cost_items: &[CostItem],
    projects: &[Project],
) -> Vec<EnrichedItem> {
    let cost_item_map: BTreeMap<&str, &CostItem> =
        cost_items.iter().map(|ci| (ci.id.as_str(), ci)).collect();
    let project_map: BTreeMap<&str, &Project> =
        projects.iter().map(|p| (p.id.as_str(), p)).collect();

    items
        .iter()
        .map(|item| {
            let cost_info = cost_item_map.get(item.cost_item_id.as_str());
            let project_id = cost_info
                .map(|ci| ci.project_id.clone())
                .unwrap_or_default();
            let project = project_map.get(project_id.as_str());

            EnrichedItem {
                item: item.clone(),
                cost_item_name: cost_info
                    .map(|ci| ci.name.clone())
                    .unwrap_or_else(|| UNKNOWN_COST_ITEM.to_string()),
                project_name: project
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| UNKNOWN_PROJECT.to_string()),
                project_id,
            }
        })
        .collect()
}

/// Restricts to a single project; `None` keeps everything.
pub fn filter_by_project<'a>(
    items: &'a [EnrichedItem],
    project_id: Option<&str>,
) -> Vec<&'a EnrichedItem> {
    match project_id {
        None => items.iter().collect(),
        Some(id) => items.iter().filter(|e| e.project_id == id).collect(),
    }
}

/// The distinct projects that actually have installments, in the order the
/// projects were given. Drives the project filter dropdown.
pub fn projects_with_items(items: &[EnrichedItem], projects: &[Project]) -> Vec<Project> {
    projects
        .iter()
        .filter(|p| items.iter().any(|e| e.project_id == p.id))
        .cloned()
        .collect()
}

/// Actionable-first rank for the payments table: approved items waiting to
/// be paid come first, then invoices, then confirmations, then untouched
/// pending rows; paid items sink to the bottom.
fn table_rank(status: ScheduleItemStatus) -> u8 {
    match status {
        ScheduleItemStatus::Approved => 0,
        ScheduleItemStatus::InvoiceReceived => 1,
        ScheduleItemStatus::MilestoneConfirmed => 2,
        ScheduleItemStatus::Pending => 3,
        ScheduleItemStatus::Paid => 4,
    }
}

/// Payments-table ordering: actionable statuses first (see [`table_rank`]),
/// then target date ascending with dated items before undated ones.
pub fn sort_for_payments_table(items: &mut [EnrichedItem]) {
    items.sort_by(|a, b| {
        table_rank(a.item.status)
            .cmp(&table_rank(b.item.status))
            .then_with(|| match (a.item.target_date, b.item.target_date) {
                (Some(da), Some(db)) => da.cmp(&db),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CostCategory, ScheduleItemStatus};
    use chrono::NaiveDate;

    fn item(id: &str, cost_item_id: &str) -> ScheduleItem {
        ScheduleItem {
            id: id.to_string(),
            schedule_id: "ps-1".to_string(),
            cost_item_id: cost_item_id.to_string(),
            project_id: "p-1".to_string(),
            description: String::new(),
            amount: 100.0,
            percentage: 0.0,
            milestone_id: None,
            milestone_name: None,
            target_date: None,
            order: 1,
            status: ScheduleItemStatus::Pending,
            confirmed_by: None,
            confirmed_at: None,
            confirmed_note: None,
            approved_by: None,
            approved_at: None,
            paid_date: None,
            paid_amount: None,
        }
    }

    fn cost_item(id: &str, project_id: &str, name: &str) -> CostItem {
        CostItem {
            id: id.to_string(),
            project_id: project_id.to_string(),
            name: name.to_string(),
            category: CostCategory::Contractor,
            estimated_amount: 1000.0,
            actual_amount: None,
        }
    }

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_enrichment_joins_names() {
        let items = vec![item("a", "ci-1")];
        let enriched = enrich_items(
            &items,
            &[cost_item("ci-1", "p-1", "Plumbing contractor")],
            &[project("p-1", "North Tower")],
        );
        assert_eq!(enriched[0].cost_item_name, "Plumbing contractor");
        assert_eq!(enriched[0].project_name, "North Tower");
        assert_eq!(enriched[0].project_id, "p-1");
    }

    #[test]
    fn test_enrichment_falls_back_on_missing_references() {
        let items = vec![item("a", "ci-missing")];
        let enriched = enrich_items(&items, &[], &[]);
        assert_eq!(enriched[0].cost_item_name, UNKNOWN_COST_ITEM);
        assert_eq!(enriched[0].project_name, UNKNOWN_PROJECT);
        assert!(enriched[0].project_id.is_empty());
    }

    #[test]
    fn test_project_filter() {
        let items = vec![item("a", "ci-1"), item("b", "ci-2")];
        let enriched = enrich_items(
            &items,
            &[
                cost_item("ci-1", "p-1", "Plumbing"),
                cost_item("ci-2", "p-2", "Electrical"),
            ],
            &[project("p-1", "North"), project("p-2", "South")],
        );

        assert_eq!(filter_by_project(&enriched, None).len(), 2);
        let only_p2 = filter_by_project(&enriched, Some("p-2"));
        assert_eq!(only_p2.len(), 1);
        assert_eq!(only_p2[0].item.id, "b");

        let with_items = projects_with_items(
            &enriched,
            &[project("p-1", "North"), project("p-2", "South"), project("p-3", "East")],
        );
        assert_eq!(with_items.len(), 2);
    }

    #[test]
    fn test_payments_table_sort_is_actionable_first() {
        let cost_items = [cost_item("ci-1", "p-1", "Plumbing")];
        let projects = [project("p-1", "North")];

        let with_status = |id: &str, status: ScheduleItemStatus| {
            let mut it = item(id, "ci-1");
            it.status = status;
            it
        };

        let items = vec![
            with_status("paid", ScheduleItemStatus::Paid),
            with_status("pending", ScheduleItemStatus::Pending),
            with_status("approved", ScheduleItemStatus::Approved),
            with_status("confirmed", ScheduleItemStatus::MilestoneConfirmed),
            with_status("invoiced", ScheduleItemStatus::InvoiceReceived),
        ];
        let mut enriched = enrich_items(&items, &cost_items, &projects);
        sort_for_payments_table(&mut enriched);

        let ids: Vec<&str> = enriched.iter().map(|e| e.item.id.as_str()).collect();
        // Waiting-to-be-paid work floats to the top, settled rows sink.
        assert_eq!(
            ids,
            vec!["approved", "invoiced", "confirmed", "pending", "paid"]
        );
    }

    #[test]
    fn test_payments_table_sort_by_date_within_status() {
        let cost_items = [cost_item("ci-1", "p-1", "Plumbing")];
        let projects = [project("p-1", "North")];

        let mut late = item("late", "ci-1");
        late.target_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let mut early = item("early", "ci-1");
        early.target_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        let undated = item("undated", "ci-1");

        let mut enriched = enrich_items(&[late, undated, early], &cost_items, &projects);
        sort_for_payments_table(&mut enriched);

        let ids: Vec<&str> = enriched.iter().map(|e| e.item.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late", "undated"]);
    }

    #[test]
    fn test_enriched_item_serde_round_trip() {
        let items = vec![item("a", "ci-1")];
        let enriched = enrich_items(
            &items,
            &[cost_item("ci-1", "p-1", "Plumbing contractor")],
            &[project("p-1", "North Tower")],
        );

        let json = serde_json::to_string(&enriched[0]).unwrap();
        assert_eq!(json.matches("\"project_id\"").count(), 2);

        let back: EnrichedItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.item.id, "a");
        assert_eq!(back.project_id, "p-1");
        assert_eq!(back.project_name, "North Tower");
    }
}
