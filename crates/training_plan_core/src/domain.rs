//! crates/training_plan_core/src/domain.rs
//!
//! Defines the pure, core data structures for the training plan engine.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Bounds for the number of exercises in a daily plan.
pub const MIN_EXERCISES_PER_PLAN: u32 = 1;
pub const MAX_EXERCISES_PER_PLAN: u32 = 10;

/// Bounds for the number of sets on a single plan item.
pub const MIN_SETS_TOTAL: u32 = 1;
pub const MAX_SETS_TOTAL: u32 = 10;

/// Default rest between sets, in seconds.
pub const DEFAULT_REST_SECONDS: u32 = 30;

/// Category tags that get the heavier 4-set default; everything else gets 3.
pub const STRENGTH_CATEGORIES: &[&str] = &["strength", "upper_body", "lower_body", "core"];

//=========================================================================================
// Status Enums
//=========================================================================================

/// Lifecycle status of a daily plan.
///
/// A plan with no items yet is `Draft`; the first successful generation makes
/// it `Active`. `Completed` is reached exactly once, when every item is
/// completed. `Aborted` plans are superseded rows kept for history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    Draft,
    Active,
    Completed,
    Aborted,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "aborted" => Ok(Self::Aborted),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// Completion status of a single plan item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

impl FromStr for ItemStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// Which logical trigger produced a plan proposal. Part of the idempotency
/// key `(owner, plan_date, source)` so repeated triggers never duplicate
/// ledger rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalSource {
    /// An explicit, user-triggered generation.
    Manual,
    /// Silent background generation (`ensure_today_plan_if_empty`).
    Autogen,
}

impl fmt::Display for ProposalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Manual => "manual",
            Self::Autogen => "autogen",
        };
        f.write_str(s)
    }
}

impl FromStr for ProposalSource {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "autogen" => Ok(Self::Autogen),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// Subscription tier of the requesting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Free,
    Premium,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Free => "free",
            Self::Premium => "premium",
        };
        f.write_str(s)
    }
}

impl FromStr for Tier {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// Error returned when a persisted status string is not a known variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown status value: {0}")]
pub struct StatusParseError(pub String);

//=========================================================================================
// Persisted Entities
//=========================================================================================

/// One user's training plan for one app day.
///
/// `plan_date` is the app-day calendar key derived from the shifted day
/// boundary, not the raw wall-clock date. At most one non-aborted plan
/// exists per `(owner_id, plan_date)`.
#[derive(Debug, Clone)]
pub struct Plan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub plan_date: NaiveDate,
    pub title: String,
    pub total_estimated_minutes: u32,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single exercise assignment within a plan, tracked by sets completed.
///
/// `exercise_duration_seconds` is denormalised from the catalog at allocation
/// time so set-count edits can recompute `estimated_minutes` without a
/// catalog round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub exercise_ref: Uuid,
    pub order_index: i32,
    pub category_tag: String,
    pub sets_total: u32,
    pub sets_completed: u32,
    pub rest_seconds: u32,
    pub exercise_duration_seconds: u32,
    pub estimated_minutes: u32,
    pub status: ItemStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PlanItem {
    /// True if the user has recorded any progress on this item.
    pub fn has_progress(&self) -> bool {
        self.sets_completed > 0
    }
}

//=========================================================================================
// Value Objects (not persisted)
//=========================================================================================

/// The short survey driving plan generation.
#[derive(Debug, Clone)]
pub struct SurveyInput {
    /// Desired exercise count; clamped to [1, 10] at allocation time.
    pub exercises_count: u32,
    /// Category filter; empty means no filter.
    pub categories: Vec<String>,
    /// Minutes the user says they have available. Carried for the proposal
    /// record; selection does not consult it.
    pub time_minutes: u32,
    pub tier: Tier,
    /// Lets silent background generation include premium exercises for free
    /// users (they are inserted pre-completed, see the allocator).
    pub allow_premium_during_autogen: bool,
}

/// A candidate exercise as supplied by the catalog gateway.
#[derive(Debug, Clone)]
pub struct ExerciseCandidate {
    pub id: Uuid,
    pub duration_seconds: u32,
    pub category_tag: String,
    pub is_premium: bool,
}

/// A fully-sized item produced by the allocator, ready for batch insertion.
/// Identical to [`PlanItem`] minus the ids the store assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItemSpec {
    pub exercise_ref: Uuid,
    pub order_index: i32,
    pub category_tag: String,
    pub sets_total: u32,
    pub sets_completed: u32,
    pub rest_seconds: u32,
    pub exercise_duration_seconds: u32,
    pub estimated_minutes: u32,
    pub status: ItemStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Derived completion rollup for today's plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodaySummary {
    pub plan_id: Uuid,
    pub status: PlanStatus,
    pub total_items: u32,
    pub items_completed: u32,
    pub total_estimated_minutes: u32,
    /// Partial credit, prorated per item by its completed-sets ratio.
    pub minutes_completed: u32,
}

/// A plan together with its ordered items, as returned by the orchestrator.
#[derive(Debug, Clone)]
pub struct PlanWithItems {
    pub plan: Plan,
    pub items: Vec<PlanItem>,
}

//=========================================================================================
// Shared Arithmetic
//=========================================================================================

/// Estimated minutes for one item: all sets plus the rests between them,
/// rounded up to whole minutes.
///
/// `ceil((duration·sets + rest·max(0, sets−1)) / 60)`
pub fn estimated_minutes(duration_seconds: u32, sets_total: u32, rest_seconds: u32) -> u32 {
    let work = duration_seconds.saturating_mul(sets_total);
    let rest = rest_seconds.saturating_mul(sets_total.saturating_sub(1));
    work.saturating_add(rest).div_ceil(60)
}

/// The three-way status rule: completed when all sets are done, pending when
/// none are, in-progress otherwise. `Skipped` is terminal and never derived.
pub fn derive_status(sets_completed: u32, sets_total: u32) -> ItemStatus {
    if sets_completed >= sets_total {
        ItemStatus::Completed
    } else if sets_completed == 0 {
        ItemStatus::Pending
    } else {
        ItemStatus::InProgress
    }
}

/// True if the tag belongs to the fixed strength-like set.
pub fn is_strength_category(tag: &str) -> bool {
    STRENGTH_CATEGORIES.contains(&tag)
}
