use crate::authoring::{build_items, validate, InstallmentDraft};
use crate::error::{CostFlowError, Result};
use crate::schema::{CostItem, PaymentSchedule, PaymentScheduleStatus, ScheduleItem};
use chrono::NaiveDate;
use log::{debug, info, warn};

/// Partial update for a payment schedule.
#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
    pub total_amount: Option<f64>,
    pub status: Option<PaymentScheduleStatus>,
}

/// The persistence seam. Aggregation functions never touch this; they take
/// plain slices. Implementations are expected to hand back fresh copies on
/// every read.
pub trait ScheduleStore {
    fn schedules_by_project(&self, project_id: &str) -> Vec<PaymentSchedule>;
    fn schedule_by_cost_item(&self, cost_item_id: &str) -> Option<PaymentSchedule>;
    fn schedule_by_id(&self, id: &str) -> Option<PaymentSchedule>;

    /// Persists a schedule, assigning an id when the given one is empty.
    fn create_schedule(&mut self, schedule: PaymentSchedule) -> Result<PaymentSchedule>;
    fn update_schedule(&mut self, id: &str, patch: SchedulePatch) -> Result<()>;
    fn delete_schedule(&mut self, id: &str) -> Result<()>;

    /// Items of one schedule, ordered by their `order` field.
    fn items_by_schedule(&self, schedule_id: &str) -> Vec<ScheduleItem>;
    fn items_by_project(&self, project_id: &str) -> Vec<ScheduleItem>;
    fn items_by_milestone(&self, milestone_id: &str) -> Vec<ScheduleItem>;
    fn all_items(&self) -> Vec<ScheduleItem>;
    fn item_by_id(&self, id: &str) -> Option<ScheduleItem>;

    /// Persists a batch, assigning ids to items with empty ones.
    fn create_items_batch(&mut self, items: Vec<ScheduleItem>) -> Result<Vec<ScheduleItem>>;
    fn update_item(&mut self, updated: &ScheduleItem) -> Result<()>;
    fn delete_items_by_schedule(&mut self, schedule_id: &str) -> Result<usize>;

    /// Swaps a schedule's entire item set in one operation, so an
    /// implementation can make the replacement atomic instead of exposing a
    /// window where the schedule has no items.
    fn replace_items(
        &mut self,
        schedule_id: &str,
        items: Vec<ScheduleItem>,
    ) -> Result<Vec<ScheduleItem>>;

    /// Unlinks every item pegged to a deleted milestone. Dates are kept.
    fn nullify_milestone(&mut self, milestone_id: &str) -> Result<usize>;
}

/// In-memory store, the stand-in for the real persistence layer in tests
/// and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    schedules: Vec<PaymentSchedule>,
    items: Vec<ScheduleItem>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

impl ScheduleStore for MemoryStore {
    fn schedules_by_project(&self, project_id: &str) -> Vec<PaymentSchedule> {
        self.schedules
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect()
    }

    fn schedule_by_cost_item(&self, cost_item_id: &str) -> Option<PaymentSchedule> {
        self.schedules
            .iter()
            .find(|s| s.cost_item_id == cost_item_id)
            .cloned()
    }

    fn schedule_by_id(&self, id: &str) -> Option<PaymentSchedule> {
        self.schedules.iter().find(|s| s.id == id).cloned()
    }

    fn create_schedule(&mut self, mut schedule: PaymentSchedule) -> Result<PaymentSchedule> {
        if schedule.id.is_empty() {
            schedule.id = self.fresh_id("ps");
        }
        self.schedules.push(schedule.clone());
        Ok(schedule)
    }

    fn update_schedule(&mut self, id: &str, patch: SchedulePatch) -> Result<()> {
        let schedule = self
            .schedules
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CostFlowError::NotFound(format!("schedule {id}")))?;
        if let Some(total) = patch.total_amount {
            schedule.total_amount = total;
        }
        if let Some(status) = patch.status {
            schedule.status = status;
        }
        Ok(())
    }

    fn delete_schedule(&mut self, id: &str) -> Result<()> {
        let before = self.schedules.len();
        self.schedules.retain(|s| s.id != id);
        if self.schedules.len() == before {
            return Err(CostFlowError::NotFound(format!("schedule {id}")));
        }
        Ok(())
    }

    fn items_by_schedule(&self, schedule_id: &str) -> Vec<ScheduleItem> {
        let mut items: Vec<ScheduleItem> = self
            .items
            .iter()
            .filter(|i| i.schedule_id == schedule_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.order);
        items
    }

    fn items_by_project(&self, project_id: &str) -> Vec<ScheduleItem> {
        let mut items: Vec<ScheduleItem> = self
            .items
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.order);
        items
    }

    fn items_by_milestone(&self, milestone_id: &str) -> Vec<ScheduleItem> {
        self.items
            .iter()
            .filter(|i| i.milestone_id.as_deref() == Some(milestone_id))
            .cloned()
            .collect()
    }

    fn all_items(&self) -> Vec<ScheduleItem> {
        self.items.clone()
    }

    fn item_by_id(&self, id: &str) -> Option<ScheduleItem> {
        self.items.iter().find(|i| i.id == id).cloned()
    }

    fn create_items_batch(&mut self, items: Vec<ScheduleItem>) -> Result<Vec<ScheduleItem>> {
        let mut created = Vec::with_capacity(items.len());
        for mut item in items {
            if item.id.is_empty() {
                item.id = self.fresh_id("si");
            }
            self.items.push(item.clone());
            created.push(item);
        }
        Ok(created)
    }

    fn update_item(&mut self, updated: &ScheduleItem) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == updated.id)
            .ok_or_else(|| CostFlowError::NotFound(format!("schedule item {}", updated.id)))?;
        *item = updated.clone();
        Ok(())
    }

    fn delete_items_by_schedule(&mut self, schedule_id: &str) -> Result<usize> {
        let before = self.items.len();
        self.items.retain(|i| i.schedule_id != schedule_id);
        Ok(before - self.items.len())
    }

    fn replace_items(
        &mut self,
        schedule_id: &str,
        items: Vec<ScheduleItem>,
    ) -> Result<Vec<ScheduleItem>> {
        // Assign ids before touching the existing rows so a bad batch never
        // leaves the schedule empty.
        let mut incoming = Vec::with_capacity(items.len());
        for mut item in items {
            if item.id.is_empty() {
                item.id = self.fresh_id("si");
            }
            incoming.push(item);
        }
        self.items.retain(|i| i.schedule_id != schedule_id);
        self.items.extend(incoming.iter().cloned());
        Ok(incoming)
    }

    fn nullify_milestone(&mut self, milestone_id: &str) -> Result<usize> {
        let mut touched = 0;
        for item in &mut self.items {
            if item.milestone_id.as_deref() == Some(milestone_id) {
                item.milestone_id = None;
                item.milestone_name = None;
                touched += 1;
            }
        }
        Ok(touched)
    }
}

/// Saves an authored schedule for a cost item: validates the drafts, then
/// either creates a fresh schedule or updates the existing one and replaces
/// its installments wholesale. Partial edits do not exist; the batch is the
/// unit of persistence.
pub fn save_schedule(
    store: &mut dyn ScheduleStore,
    cost_item: &CostItem,
    drafts: &[InstallmentDraft],
) -> Result<(PaymentSchedule, Vec<ScheduleItem>)> {
    let contract_total = cost_item.contract_amount();
    validate(drafts, contract_total).map_err(|e| {
        warn!("rejected schedule for cost item {}: {e}", cost_item.id);
        e
    })?;

    let schedule = match store.schedule_by_cost_item(&cost_item.id) {
        Some(existing) => {
            debug!("replacing items of schedule {}", existing.id);
            store.update_schedule(
                &existing.id,
                SchedulePatch {
                    total_amount: Some(contract_total),
                    status: Some(PaymentScheduleStatus::Active),
                },
            )?;
            store
                .schedule_by_id(&existing.id)
                .ok_or_else(|| CostFlowError::NotFound(format!("schedule {}", existing.id)))?
        }
        None => store.create_schedule(PaymentSchedule {
            id: String::new(),
            cost_item_id: cost_item.id.clone(),
            project_id: cost_item.project_id.clone(),
            total_amount: contract_total,
            status: PaymentScheduleStatus::Active,
            created_by: None,
        })?,
    };

    let items = build_items(drafts, &schedule.id, &cost_item.id, &cost_item.project_id);
    let items = store.replace_items(&schedule.id, items)?;

    info!(
        "saved schedule {} for cost item {} with {} installments totalling {:.0}",
        schedule.id,
        cost_item.id,
        items.len(),
        items.iter().map(|i| i.amount).sum::<f64>()
    );
    Ok((schedule, items))
}

/// Records a milestone sign-off on one installment.
pub fn confirm_milestone_for_item(
    store: &mut dyn ScheduleStore,
    item_id: &str,
    confirmed_by: &str,
    confirmed_at: NaiveDate,
    note: Option<String>,
) -> Result<ScheduleItem> {
    let mut item = store
        .item_by_id(item_id)
        .ok_or_else(|| CostFlowError::NotFound(format!("schedule item {item_id}")))?;
    item.confirm_milestone(confirmed_by, confirmed_at, note);
    store.update_item(&item)?;
    Ok(item)
}

/// Advances one installment a single step through its lifecycle.
pub fn advance_item(store: &mut dyn ScheduleStore, item_id: &str) -> Result<ScheduleItem> {
    let mut item = store
        .item_by_id(item_id)
        .ok_or_else(|| CostFlowError::NotFound(format!("schedule item {item_id}")))?;
    let next = item.advance_status()?;
    store.update_item(&item)?;
    debug!("item {item_id} advanced to {next}");
    Ok(item)
}

/// Settles one installment, recording what was actually paid and when.
pub fn mark_item_paid(
    store: &mut dyn ScheduleStore,
    item_id: &str,
    paid_amount: f64,
    paid_date: NaiveDate,
) -> Result<ScheduleItem> {
    let mut item = store
        .item_by_id(item_id)
        .ok_or_else(|| CostFlowError::NotFound(format!("schedule item {item_id}")))?;
    item.mark_paid(paid_amount, paid_date);
    store.update_item(&item)?;
    info!("item {item_id} paid {paid_amount:.0} on {paid_date}");
    Ok(item)
}
