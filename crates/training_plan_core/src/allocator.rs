//! crates/training_plan_core/src/allocator.rs
//!
//! Pure selection and sizing of plan items from a survey and a candidate
//! pool. The allocator never performs I/O: it receives the existing items
//! and the catalog's candidates as values and returns fully-sized item
//! specs ready for batch insertion.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::{
    self, ExerciseCandidate, ItemStatus, NewItemSpec, PlanItem, SurveyInput, Tier,
    DEFAULT_REST_SECONDS, MAX_EXERCISES_PER_PLAN, MIN_EXERCISES_PER_PLAN,
};

/// Recoverable allocation failures, surfaced to the caller, never silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    /// Zero eligible exercises remained after tier and category filtering.
    #[error("no candidate exercises match the survey filters")]
    NoCandidateExercises,
    /// Regeneration would destroy recorded progress; the caller must not
    /// overwrite.
    #[error("plan already has recorded progress")]
    PlanHasProgress,
}

/// The allocator's output: new item specs in insertion order, plus the
/// plan-level estimate across existing and new items.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub items: Vec<NewItemSpec>,
    pub total_estimated_minutes: u32,
}

/// Select and size the items needed to bring the plan to the survey's
/// target count.
///
/// Fresh generation passes an empty `existing`; append mode passes the
/// surviving items and only the shortfall is allocated, excluding already
/// used exercises until the pool runs out (then repeats are accepted).
pub fn allocate(
    existing: &[PlanItem],
    survey: &SurveyInput,
    candidates: &[ExerciseCandidate],
    now: DateTime<Utc>,
) -> Result<Allocation, AllocationError> {
    let pool = eligible_pool(survey, candidates);
    if pool.is_empty() {
        return Err(AllocationError::NoCandidateExercises);
    }

    let target = survey
        .exercises_count
        .clamp(MIN_EXERCISES_PER_PLAN, MAX_EXERCISES_PER_PLAN) as usize;

    let has_progress = existing.iter().any(PlanItem::has_progress);
    if !existing.is_empty() && has_progress && existing.len() >= target {
        return Err(AllocationError::PlanHasProgress);
    }

    let needed = target.saturating_sub(existing.len());

    // Unique-first pass: skip exercises already in the plan. If that leaves
    // too few, cycle the pool until the shortfall is covered, accepting
    // repeats (documented outcome for small pools, not a bug). The pool is
    // known non-empty, so the cycle terminates.
    let used: HashSet<Uuid> = existing.iter().map(|i| i.exercise_ref).collect();
    let mut selectable: Vec<&ExerciseCandidate> =
        pool.iter().filter(|c| !used.contains(&c.id)).copied().collect();
    if selectable.len() < needed {
        let shortfall = needed - selectable.len();
        selectable.extend(pool.iter().copied().cycle().take(shortfall));
    }

    let next_index = existing.iter().map(|i| i.order_index + 1).max().unwrap_or(0);

    let items: Vec<NewItemSpec> = selectable
        .into_iter()
        .take(needed)
        .enumerate()
        .map(|(offset, candidate)| build_spec(candidate, next_index + offset as i32, survey, now))
        .collect();

    let total_estimated_minutes = existing
        .iter()
        .map(|i| i.estimated_minutes)
        .chain(items.iter().map(|i| i.estimated_minutes))
        .sum();

    Ok(Allocation {
        items,
        total_estimated_minutes,
    })
}

/// Tier/category filtering followed by a stable ascending-duration sort, so
/// equal durations keep their catalog order.
fn eligible_pool<'a>(
    survey: &SurveyInput,
    candidates: &'a [ExerciseCandidate],
) -> Vec<&'a ExerciseCandidate> {
    let premium_blocked = survey.tier == Tier::Free && !survey.allow_premium_during_autogen;

    let mut pool: Vec<&ExerciseCandidate> = candidates
        .iter()
        .filter(|c| !(premium_blocked && c.is_premium))
        .filter(|c| {
            survey.categories.is_empty() || survey.categories.iter().any(|t| t == &c.category_tag)
        })
        .collect();

    pool.sort_by_key(|c| c.duration_seconds);
    pool
}

fn build_spec(
    candidate: &ExerciseCandidate,
    order_index: i32,
    survey: &SurveyInput,
    now: DateTime<Utc>,
) -> NewItemSpec {
    let sets_total = if domain::is_strength_category(&candidate.category_tag) {
        4
    } else {
        3
    };
    let rest_seconds = DEFAULT_REST_SECONDS;
    let estimated =
        domain::estimated_minutes(candidate.duration_seconds, sets_total, rest_seconds);

    // A premium exercise reaching a free user's plan was explicitly allowed
    // through by the autogen flag: insert it pre-completed so the day can
    // still reach 100% while playback access stays gated elsewhere.
    let pre_completed = survey.tier == Tier::Free && candidate.is_premium;

    NewItemSpec {
        exercise_ref: candidate.id,
        order_index,
        category_tag: candidate.category_tag.clone(),
        sets_total,
        sets_completed: if pre_completed { sets_total } else { 0 },
        rest_seconds,
        exercise_duration_seconds: candidate.duration_seconds,
        estimated_minutes: estimated,
        status: if pre_completed {
            ItemStatus::Completed
        } else {
            ItemStatus::Pending
        },
        completed_at: pre_completed.then_some(now),
    }
}
