//! crates/training_plan_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the engine's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    ExerciseCandidate, ItemStatus, NewItemSpec, Plan, PlanItem, PlanStatus, ProposalSource, Tier,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The plan or item does not exist. Terminal for the operation.
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The row exists but belongs to a different owner. Terminal, never retried.
    #[error("Forbidden")]
    Forbidden,
    /// A gateway failure that is safe for the caller to retry; every mutating
    /// core operation is idempotent or clamp-bounded.
    #[error("Transient gateway error: {0}")]
    Transient(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Patch applied to a single plan item. The orchestrator always writes the
/// complete post-transition value set, which keeps retries idempotent.
#[derive(Debug, Clone)]
pub struct ItemPatch {
    pub sets_total: u32,
    pub sets_completed: u32,
    pub estimated_minutes: u32,
    pub status: ItemStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&PlanItem> for ItemPatch {
    fn from(item: &PlanItem) -> Self {
        Self {
            sets_total: item.sets_total,
            sets_completed: item.sets_completed,
            estimated_minutes: item.estimated_minutes,
            status: item.status,
            completed_at: item.completed_at,
        }
    }
}

/// Persistence gateway for plans and their items. All reads and writes are
/// scoped to the owning user; the orchestrator is the only writer.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Fetch the non-aborted plan for one owner and app-day key, if any.
    async fn get_plan(&self, owner_id: Uuid, plan_date: NaiveDate) -> PortResult<Option<Plan>>;

    /// Fetch one plan by id, verifying it belongs to `owner_id`.
    async fn get_plan_by_id(&self, owner_id: Uuid, plan_id: Uuid) -> PortResult<Plan>;

    async fn create_plan(
        &self,
        owner_id: Uuid,
        plan_date: NaiveDate,
        title: &str,
    ) -> PortResult<Plan>;

    async fn update_plan(
        &self,
        plan_id: Uuid,
        total_estimated_minutes: u32,
        status: PlanStatus,
    ) -> PortResult<()>;

    /// Fetch one item, verifying it belongs to `owner_id`. Returns
    /// `PortError::Forbidden` when the item exists under another owner.
    async fn get_item(&self, owner_id: Uuid, item_id: Uuid) -> PortResult<PlanItem>;

    /// List a plan's items ordered by `order_index`.
    async fn list_items(&self, plan_id: Uuid) -> PortResult<Vec<PlanItem>>;

    async fn insert_items(&self, plan_id: Uuid, specs: &[NewItemSpec]) -> PortResult<Vec<PlanItem>>;

    async fn update_item(&self, item_id: Uuid, patch: &ItemPatch) -> PortResult<()>;

    async fn delete_items(&self, plan_id: Uuid) -> PortResult<()>;
}

/// Supplies candidate exercises. The tier is advisory context for the
/// catalog; premium exclusion is the allocator's responsibility.
#[async_trait]
pub trait ExerciseCatalog: Send + Sync {
    async fn list_exercises(&self, tier: Tier) -> PortResult<Vec<ExerciseCandidate>>;
}

/// Cumulative user-level progress counters, applied exactly once per plan
/// completion via the idempotent plan-status guard.
#[async_trait]
pub trait ProgressRollup: Send + Sync {
    async fn add_active_minutes(&self, owner_id: Uuid, minutes: u32) -> PortResult<()>;

    async fn increment_training_days(&self, owner_id: Uuid, n: u32) -> PortResult<()>;
}

/// Bookkeeping of generation attempts, unique on `(owner, plan_date, source)`
/// so retries of the same logical trigger never create duplicate rows.
#[async_trait]
pub trait ProposalLedger: Send + Sync {
    async fn upsert_proposal(
        &self,
        owner_id: Uuid,
        plan_date: NaiveDate,
        source: ProposalSource,
        plan_id: Uuid,
    ) -> PortResult<()>;
}

/// Injectable time source so day-boundary and countdown logic are testable.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// The current local wall-clock time; day boundaries are local-midnight
    /// based.
    fn now_local(&self) -> NaiveDateTime;
}
