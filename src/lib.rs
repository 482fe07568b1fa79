//! # Costflow
//!
//! A library for reconciling construction payment schedules into monthly
//! cash-flow series and budget summaries.
//!
//! ## Core Concepts
//!
//! - **Cost Item**: a budget line (e.g., "electrical contractor") with an
//!   estimate and, once a tender closes, a contracted actual amount
//! - **Schedule**: the set of installments paid against a cost item's
//!   contract; authored as a batch and replaced wholesale on edit
//! - **Installment**: one scheduled payment with a five-state lifecycle
//!   (pending → milestone confirmed → invoice received → approved → paid)
//! - **Month Bucket**: a derived per-month aggregate of planned vs. actual
//!   amounts; recomputed on every read, never stored
//! - **Cash-Flow Report**: the ordered monthly series with variance and a
//!   running paid total, plus top-line dashboard totals
//!
//! ## Example
//!
//! ```rust,ignore
//! use costflow::*;
//! use chrono::NaiveDate;
//!
//! let mut store = MemoryStore::new();
//! let cost_item = CostItem {
//!     id: "ci-1".to_string(),
//!     project_id: "p-1".to_string(),
//!     name: "Electrical contractor".to_string(),
//!     category: CostCategory::Contractor,
//!     estimated_amount: 120_000.0,
//!     actual_amount: Some(115_000.0),
//! };
//!
//! let mut rows = vec![InstallmentDraft::default(); 3];
//! for (i, row) in rows.iter_mut().enumerate() {
//!     row.description = format!("Payment {}", i + 1);
//! }
//! distribute_evenly(cost_item.contract_amount(), &mut rows);
//!
//! let (_, items) = save_schedule(&mut store, &cost_item, &rows)?;
//! let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let report = CashFlowReport::build(&store.all_items(), today);
//! ```

pub mod authoring;
pub mod bucket;
pub mod cashflow;
pub mod enrich;
pub mod error;
pub mod schema;
pub mod store;
pub mod summary;

pub use authoring::{
    build_items, distribute_evenly, validate, InstallmentDraft, AMOUNT_TOLERANCE,
};
pub use bucket::{bucket_by_month, MonthBucket, MonthKey};
pub use cashflow::{monthly_cash_flow, CashFlowReport, MonthFlow};
pub use enrich::{
    enrich_items, filter_by_project, projects_with_items, sort_for_payments_table, EnrichedItem,
};
pub use error::{CostFlowError, Result};
pub use schema::{
    CostCategory, CostItem, PaymentSchedule, PaymentScheduleStatus, Project, ProjectMilestone,
    ScheduleItem, ScheduleItemStatus,
};
pub use store::{
    advance_item, confirm_milestone_for_item, mark_item_paid, save_schedule, MemoryStore,
    SchedulePatch, ScheduleStore,
};
pub use summary::{
    is_overdue, payment_kpis, schedule_summary, status_breakdown, summarize, CashFlowSummary,
    PaymentKpis, ScheduleSummary, StatusSlice,
};
