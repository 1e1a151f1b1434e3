//! Tests for plan item selection and sizing.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use training_plan_core::allocator::{allocate, AllocationError};
use training_plan_core::domain::{
    estimated_minutes, ExerciseCandidate, ItemStatus, PlanItem, SurveyInput, Tier,
};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

fn candidate(duration: u32, category: &str, premium: bool) -> ExerciseCandidate {
    ExerciseCandidate {
        id: Uuid::new_v4(),
        duration_seconds: duration,
        category_tag: category.to_string(),
        is_premium: premium,
    }
}

fn survey(count: u32, tier: Tier) -> SurveyInput {
    SurveyInput {
        exercises_count: count,
        categories: Vec::new(),
        time_minutes: 30,
        tier,
        allow_premium_during_autogen: false,
    }
}

fn existing_item(order_index: i32, exercise_ref: Uuid, sets_completed: u32) -> PlanItem {
    PlanItem {
        id: Uuid::new_v4(),
        plan_id: Uuid::new_v4(),
        exercise_ref,
        order_index,
        category_tag: "cardio".to_string(),
        sets_total: 3,
        sets_completed,
        rest_seconds: 30,
        exercise_duration_seconds: 90,
        estimated_minutes: 6,
        status: if sets_completed > 0 {
            ItemStatus::InProgress
        } else {
            ItemStatus::Pending
        },
        completed_at: None,
    }
}

#[test]
fn fresh_generation_sorts_by_duration_and_pends_everything() {
    let pool = vec![
        candidate(180, "cardio", false),
        candidate(60, "mobility", false),
        candidate(120, "balance", false),
        candidate(240, "cardio", false),
        candidate(90, "cardio", false),
    ];
    let allocation = allocate(&[], &survey(3, Tier::Free), &pool, now()).unwrap();

    assert_eq!(allocation.items.len(), 3);
    let durations: Vec<u32> = allocation
        .items
        .iter()
        .map(|i| i.exercise_duration_seconds)
        .collect();
    assert_eq!(durations, vec![60, 90, 120]);
    assert!(allocation.items.iter().all(|i| i.status == ItemStatus::Pending));
    assert!(allocation.items.iter().all(|i| i.sets_completed == 0));
    let order: Vec<i32> = allocation.items.iter().map(|i| i.order_index).collect();
    assert_eq!(order, vec![0, 1, 2]);
}

#[test]
fn equal_durations_keep_catalog_order() {
    let a = candidate(120, "cardio", false);
    let b = candidate(120, "mobility", false);
    let c = candidate(120, "balance", false);
    let pool = vec![a.clone(), b.clone(), c.clone()];

    let allocation = allocate(&[], &survey(3, Tier::Free), &pool, now()).unwrap();
    let refs: Vec<Uuid> = allocation.items.iter().map(|i| i.exercise_ref).collect();
    assert_eq!(refs, vec![a.id, b.id, c.id]);
}

#[test]
fn strength_like_categories_get_four_sets_others_three() {
    let pool = vec![
        candidate(60, "strength", false),
        candidate(70, "cardio", false),
        candidate(80, "core", false),
        candidate(90, "mobility", false),
    ];
    let allocation = allocate(&[], &survey(4, Tier::Premium), &pool, now()).unwrap();

    for item in &allocation.items {
        let expected = match item.category_tag.as_str() {
            "strength" | "core" => 4,
            _ => 3,
        };
        assert_eq!(item.sets_total, expected, "category {}", item.category_tag);
        assert_eq!(item.rest_seconds, 30);
    }
}

#[test]
fn estimate_matches_the_ceiling_formula() {
    // 120s x 4 sets + 30s x 3 rests = 570s -> 10 minutes.
    assert_eq!(estimated_minutes(120, 4, 30), 10);

    let pool = vec![candidate(120, "strength", false)];
    let allocation = allocate(&[], &survey(1, Tier::Premium), &pool, now()).unwrap();
    assert_eq!(allocation.items[0].estimated_minutes, 10);
    assert_eq!(allocation.total_estimated_minutes, 10);
}

#[test]
fn estimate_saturates_on_absurd_durations() {
    // A corrupt catalog row must not panic the engine; the estimate pins at
    // the representable maximum instead.
    assert_eq!(estimated_minutes(u32::MAX, 10, 30), u32::MAX.div_ceil(60));
    assert_eq!(estimated_minutes(u32::MAX, 1, u32::MAX), u32::MAX.div_ceil(60));
}

#[test]
fn free_tier_excludes_premium_candidates() {
    let pool = vec![
        candidate(60, "cardio", true),
        candidate(90, "cardio", false),
    ];
    let allocation = allocate(&[], &survey(2, Tier::Free), &pool, now()).unwrap();

    // Only the free exercise is eligible; the shortfall wraps around to it.
    assert!(allocation
        .items
        .iter()
        .all(|i| i.exercise_ref == pool[1].id));
}

#[test]
fn all_premium_pool_on_free_tier_is_no_candidates() {
    let pool = vec![candidate(60, "cardio", true), candidate(90, "core", true)];
    let err = allocate(&[], &survey(2, Tier::Free), &pool, now()).unwrap_err();
    assert_eq!(err, AllocationError::NoCandidateExercises);
}

#[test]
fn category_filter_keeps_only_matching_tags() {
    let pool = vec![
        candidate(60, "cardio", false),
        candidate(70, "mobility", false),
        candidate(80, "cardio", false),
    ];
    let mut s = survey(2, Tier::Free);
    s.categories = vec!["cardio".to_string()];

    let allocation = allocate(&[], &s, &pool, now()).unwrap();
    assert!(allocation.items.iter().all(|i| i.category_tag == "cardio"));
}

#[test]
fn empty_filtered_pool_is_an_error_not_an_empty_plan() {
    let pool = vec![candidate(60, "cardio", false)];
    let mut s = survey(2, Tier::Free);
    s.categories = vec!["yoga".to_string()];

    assert_eq!(
        allocate(&[], &s, &pool, now()).unwrap_err(),
        AllocationError::NoCandidateExercises
    );
}

#[test]
fn progressed_full_plan_refuses_regeneration_untouched() {
    let pool = vec![candidate(60, "cardio", false)];
    let existing = vec![
        existing_item(0, Uuid::new_v4(), 2),
        existing_item(1, Uuid::new_v4(), 0),
    ];
    let before = existing.clone();

    let err = allocate(&existing, &survey(2, Tier::Free), &pool, now()).unwrap_err();
    assert_eq!(err, AllocationError::PlanHasProgress);
    // The refusal leaves the inputs byte-for-byte alone.
    assert_eq!(existing, before);
}

#[test]
fn append_mode_fills_the_shortfall_and_continues_order() {
    let kept = candidate(60, "cardio", false);
    let fresh = candidate(90, "mobility", false);
    let pool = vec![kept.clone(), fresh.clone()];
    let existing = vec![existing_item(0, kept.id, 1)];

    let allocation = allocate(&existing, &survey(2, Tier::Free), &pool, now()).unwrap();
    assert_eq!(allocation.items.len(), 1);
    assert_eq!(allocation.items[0].exercise_ref, fresh.id);
    assert_eq!(allocation.items[0].order_index, 1);
}

#[test]
fn append_mode_wraps_around_when_pool_is_exhausted() {
    let only = candidate(60, "cardio", false);
    let pool = vec![only.clone()];
    let existing = vec![existing_item(0, only.id, 1)];

    // Target 3 with one progressed item: two more are needed, and the single
    // eligible exercise repeats. Duplicates are the documented outcome here.
    let allocation = allocate(&existing, &survey(3, Tier::Free), &pool, now()).unwrap();
    assert_eq!(allocation.items.len(), 2);
    assert!(allocation.items.iter().all(|i| i.exercise_ref == only.id));
    let order: Vec<i32> = allocation.items.iter().map(|i| i.order_index).collect();
    assert_eq!(order, vec![1, 2]);
}

#[test]
fn wraparound_cycles_the_pool_until_the_target_is_met() {
    let only = candidate(60, "cardio", false);
    let pool = vec![only.clone()];
    let existing = vec![existing_item(0, only.id, 1)];

    // A shortfall of four against a pool of one needs several full passes.
    let allocation = allocate(&existing, &survey(5, Tier::Free), &pool, now()).unwrap();
    assert_eq!(allocation.items.len(), 4);
    assert!(allocation.items.iter().all(|i| i.exercise_ref == only.id));
    let order: Vec<i32> = allocation.items.iter().map(|i| i.order_index).collect();
    assert_eq!(order, vec![1, 2, 3, 4]);
}

#[test]
fn autogen_premium_on_free_tier_is_inserted_pre_completed() {
    let premium = candidate(60, "strength", true);
    let pool = vec![premium.clone()];
    let mut s = survey(1, Tier::Free);
    s.allow_premium_during_autogen = true;

    let allocation = allocate(&[], &s, &pool, now()).unwrap();
    let item = &allocation.items[0];
    assert_eq!(item.status, ItemStatus::Completed);
    assert_eq!(item.sets_completed, item.sets_total);
    assert_eq!(item.completed_at, Some(now()));
}

#[test]
fn premium_tier_premium_exercise_is_a_normal_pending_item() {
    let premium = candidate(60, "strength", true);
    let allocation = allocate(&[], &survey(1, Tier::Premium), &[premium], now()).unwrap();
    assert_eq!(allocation.items[0].status, ItemStatus::Pending);
    assert_eq!(allocation.items[0].sets_completed, 0);
}

#[test]
fn target_count_is_clamped_to_bounds() {
    let pool: Vec<ExerciseCandidate> =
        (0..15).map(|i| candidate(60 + i, "cardio", false)).collect();

    let allocation = allocate(&[], &survey(25, Tier::Free), &pool, now()).unwrap();
    assert_eq!(allocation.items.len(), 10);

    let allocation = allocate(&[], &survey(0, Tier::Free), &pool, now()).unwrap();
    assert_eq!(allocation.items.len(), 1);
}

#[test]
fn total_estimate_includes_existing_items() {
    let fresh = candidate(120, "strength", false);
    let existing = vec![existing_item(0, Uuid::new_v4(), 1)]; // 6 minutes
    let allocation = allocate(&existing, &survey(2, Tier::Free), &[fresh], now()).unwrap();
    assert_eq!(allocation.total_estimated_minutes, 6 + 10);
}
