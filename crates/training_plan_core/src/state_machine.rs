//! crates/training_plan_core/src/state_machine.rs
//!
//! Pure transitions over plans and items. Every function takes values and
//! returns values; persistence and the progress rollup gateway are the
//! orchestrator's concern. All transitions are clamp-bounded, so replaying
//! one with the same inputs produces the same end state.

use chrono::{DateTime, Utc};

use crate::domain::{
    self, ItemStatus, Plan, PlanItem, PlanStatus, TodaySummary, MAX_SETS_TOTAL, MIN_SETS_TOTAL,
};

/// Result of a set-completion update, with the notification points the
/// shell turns into progress events.
#[derive(Debug, Clone)]
pub struct SetOutcome {
    pub item: PlanItem,
    /// The item left `Pending` for the first time on this call.
    pub first_progress: bool,
    /// The item reached its full set count on this call.
    pub just_completed: bool,
}

/// User-level counters to apply when a plan finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupDelta {
    pub active_minutes: u32,
    pub training_days: u32,
}

/// Result of a finalization check. `rollup` is present only on the single
/// transition into `Completed`; repeated calls see an already-completed plan
/// and carry no delta, which is what makes the rollup exactly-once.
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub plan: Plan,
    pub rollup: Option<RollupDelta>,
}

/// Record completed sets on an item.
///
/// With `explicit` the value is clamped to `[0, sets_total]` and written as
/// is (idempotent under retries); without it the current count is
/// incremented by one, clamped. Status follows the three-way rule.
pub fn mark_set(item: &PlanItem, explicit: Option<u32>, now: DateTime<Utc>) -> SetOutcome {
    let old = item.sets_completed;
    let new = match explicit {
        Some(value) => value.min(item.sets_total),
        None => (old + 1).min(item.sets_total),
    };

    let status = match item.status {
        // Skipped is terminal; set updates do not resurrect the item.
        ItemStatus::Skipped => ItemStatus::Skipped,
        _ => domain::derive_status(new, item.sets_total),
    };

    let mut updated = item.clone();
    updated.sets_completed = new;
    updated.status = status;
    updated.completed_at = match status {
        ItemStatus::Completed => item.completed_at.or(Some(now)),
        _ => None,
    };

    SetOutcome {
        first_progress: new > old && old == 0,
        just_completed: new > old && new == item.sets_total,
        item: updated,
    }
}

/// Force-complete an item in one call. Idempotent: an already-completed item
/// keeps its original completion instant.
pub fn mark_item_completed(item: &PlanItem, now: DateTime<Utc>) -> PlanItem {
    let mut updated = item.clone();
    updated.sets_completed = item.sets_total;
    updated.status = ItemStatus::Completed;
    updated.completed_at = item.completed_at.or(Some(now));
    updated
}

/// Change an item's target set count.
///
/// The new total is clamped to `[1, 10]`; `sets_completed` is clamped down
/// if it now exceeds the total but is never raised. The estimate is
/// recomputed from the item's denormalised exercise duration.
pub fn update_sets_total(item: &PlanItem, new_total: u32, now: DateTime<Utc>) -> SetOutcome {
    let total = new_total.clamp(MIN_SETS_TOTAL, MAX_SETS_TOTAL);
    let completed = item.sets_completed.min(total);

    let status = match item.status {
        ItemStatus::Skipped => ItemStatus::Skipped,
        _ => domain::derive_status(completed, total),
    };

    let mut updated = item.clone();
    updated.sets_total = total;
    updated.sets_completed = completed;
    updated.estimated_minutes =
        domain::estimated_minutes(item.exercise_duration_seconds, total, item.rest_seconds);
    updated.status = status;
    updated.completed_at = match status {
        ItemStatus::Completed => item.completed_at.or(Some(now)),
        _ => None,
    };

    SetOutcome {
        // Shrinking the total can only complete an item, never start one.
        first_progress: false,
        just_completed: status == ItemStatus::Completed && item.status != ItemStatus::Completed,
        item: updated,
    }
}

/// Transition the plan to `Completed` once every item is completed.
///
/// No-op for an already-completed plan and for an item-less plan; the
/// returned rollup delta (sum of item estimates plus one training day) is
/// produced exactly once across repeated calls.
pub fn finalize_if_complete(plan: &Plan, items: &[PlanItem], now: DateTime<Utc>) -> FinalizeOutcome {
    let all_done = !items.is_empty() && items.iter().all(|i| i.status == ItemStatus::Completed);

    if plan.status == PlanStatus::Completed || !all_done {
        return FinalizeOutcome {
            plan: plan.clone(),
            rollup: None,
        };
    }

    let mut updated = plan.clone();
    updated.status = PlanStatus::Completed;
    updated.updated_at = now;

    FinalizeOutcome {
        plan: updated,
        rollup: Some(RollupDelta {
            active_minutes: items.iter().map(|i| i.estimated_minutes).sum(),
            training_days: 1,
        }),
    }
}

/// Aggregate today's completion state. Minutes are prorated per item by the
/// completed-sets ratio, rounded to the nearest minute.
pub fn today_summary(plan: &Plan, items: &[PlanItem]) -> TodaySummary {
    let minutes_completed = items
        .iter()
        .map(|i| {
            if i.sets_total == 0 {
                return 0;
            }
            let ratio = f64::from(i.sets_completed) / f64::from(i.sets_total);
            (f64::from(i.estimated_minutes) * ratio).round() as u32
        })
        .sum();

    TodaySummary {
        plan_id: plan.id,
        status: plan.status,
        total_items: items.len() as u32,
        items_completed: items
            .iter()
            .filter(|i| i.status == ItemStatus::Completed)
            .count() as u32,
        total_estimated_minutes: plan.total_estimated_minutes,
        minutes_completed,
    }
}
