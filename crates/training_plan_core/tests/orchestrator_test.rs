//! Orchestrator tests against in-memory fake gateways.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

use training_plan_core::domain::{
    ExerciseCandidate, ItemStatus, NewItemSpec, Plan, PlanItem, PlanStatus, ProposalSource,
    SurveyInput, Tier,
};
use training_plan_core::orchestrator::{EngineConfig, EngineError, PlanOrchestrator};
use training_plan_core::ports::{
    Clock, ExerciseCatalog, ItemPatch, PlanStore, PortError, PortResult, ProgressRollup,
    ProposalLedger,
};

//=========================================================================================
// Fakes
//=========================================================================================

#[derive(Default)]
struct MemStore {
    plans: Mutex<Vec<Plan>>,
    items: Mutex<Vec<PlanItem>>,
}

#[async_trait]
impl PlanStore for MemStore {
    async fn get_plan(&self, owner_id: Uuid, plan_date: NaiveDate) -> PortResult<Option<Plan>> {
        Ok(self
            .plans
            .lock()
            .unwrap()
            .iter()
            .find(|p| {
                p.owner_id == owner_id
                    && p.plan_date == plan_date
                    && p.status != PlanStatus::Aborted
            })
            .cloned())
    }

    async fn get_plan_by_id(&self, owner_id: Uuid, plan_id: Uuid) -> PortResult<Plan> {
        let plans = self.plans.lock().unwrap();
        let plan = plans
            .iter()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| PortError::NotFound(format!("plan {plan_id}")))?;
        if plan.owner_id != owner_id {
            return Err(PortError::Forbidden);
        }
        Ok(plan.clone())
    }

    async fn create_plan(
        &self,
        owner_id: Uuid,
        plan_date: NaiveDate,
        title: &str,
    ) -> PortResult<Plan> {
        let plan = Plan {
            id: Uuid::new_v4(),
            owner_id,
            plan_date,
            title: title.to_string(),
            total_estimated_minutes: 0,
            status: PlanStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.plans.lock().unwrap().push(plan.clone());
        Ok(plan)
    }

    async fn update_plan(
        &self,
        plan_id: Uuid,
        total_estimated_minutes: u32,
        status: PlanStatus,
    ) -> PortResult<()> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| PortError::NotFound(format!("plan {plan_id}")))?;
        plan.total_estimated_minutes = total_estimated_minutes;
        plan.status = status;
        plan.updated_at = Utc::now();
        Ok(())
    }

    async fn get_item(&self, owner_id: Uuid, item_id: Uuid) -> PortResult<PlanItem> {
        let items = self.items.lock().unwrap();
        let item = items
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| PortError::NotFound(format!("item {item_id}")))?;
        let plans = self.plans.lock().unwrap();
        let owner_ok = plans
            .iter()
            .any(|p| p.id == item.plan_id && p.owner_id == owner_id);
        if !owner_ok {
            return Err(PortError::Forbidden);
        }
        Ok(item.clone())
    }

    async fn list_items(&self, plan_id: Uuid) -> PortResult<Vec<PlanItem>> {
        let mut out: Vec<PlanItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.plan_id == plan_id)
            .cloned()
            .collect();
        out.sort_by_key(|i| i.order_index);
        Ok(out)
    }

    async fn insert_items(
        &self,
        plan_id: Uuid,
        specs: &[NewItemSpec],
    ) -> PortResult<Vec<PlanItem>> {
        let mut inserted = Vec::new();
        for spec in specs {
            inserted.push(PlanItem {
                id: Uuid::new_v4(),
                plan_id,
                exercise_ref: spec.exercise_ref,
                order_index: spec.order_index,
                category_tag: spec.category_tag.clone(),
                sets_total: spec.sets_total,
                sets_completed: spec.sets_completed,
                rest_seconds: spec.rest_seconds,
                exercise_duration_seconds: spec.exercise_duration_seconds,
                estimated_minutes: spec.estimated_minutes,
                status: spec.status,
                completed_at: spec.completed_at,
            });
        }
        self.items.lock().unwrap().extend(inserted.clone());
        Ok(inserted)
    }

    async fn update_item(&self, item_id: Uuid, patch: &ItemPatch) -> PortResult<()> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| PortError::NotFound(format!("item {item_id}")))?;
        item.sets_total = patch.sets_total;
        item.sets_completed = patch.sets_completed;
        item.estimated_minutes = patch.estimated_minutes;
        item.status = patch.status;
        item.completed_at = patch.completed_at;
        Ok(())
    }

    async fn delete_items(&self, plan_id: Uuid) -> PortResult<()> {
        self.items.lock().unwrap().retain(|i| i.plan_id != plan_id);
        Ok(())
    }
}

struct MemCatalog {
    exercises: Vec<ExerciseCandidate>,
}

#[async_trait]
impl ExerciseCatalog for MemCatalog {
    async fn list_exercises(&self, _tier: Tier) -> PortResult<Vec<ExerciseCandidate>> {
        Ok(self.exercises.clone())
    }
}

#[derive(Default)]
struct MemRollup {
    minutes: AtomicU32,
    days: AtomicU32,
}

#[async_trait]
impl ProgressRollup for MemRollup {
    async fn add_active_minutes(&self, _owner_id: Uuid, minutes: u32) -> PortResult<()> {
        self.minutes.fetch_add(minutes, Ordering::SeqCst);
        Ok(())
    }

    async fn increment_training_days(&self, _owner_id: Uuid, n: u32) -> PortResult<()> {
        self.days.fetch_add(n, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct MemLedger {
    rows: Mutex<HashMap<(Uuid, NaiveDate, String), Uuid>>,
}

#[async_trait]
impl ProposalLedger for MemLedger {
    async fn upsert_proposal(
        &self,
        owner_id: Uuid,
        plan_date: NaiveDate,
        source: ProposalSource,
        plan_id: Uuid,
    ) -> PortResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert((owner_id, plan_date, source.to_string()), plan_id);
        Ok(())
    }
}

struct FixedClock {
    utc: DateTime<Utc>,
    local: NaiveDateTime,
}

impl FixedClock {
    fn noon() -> Self {
        let utc = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        Self {
            utc,
            local: utc.naive_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.utc
    }

    fn now_local(&self) -> NaiveDateTime {
        self.local
    }
}

//=========================================================================================
// Harness
//=========================================================================================

struct Harness {
    engine: PlanOrchestrator,
    store: Arc<MemStore>,
    rollup: Arc<MemRollup>,
    ledger: Arc<MemLedger>,
}

fn free_pool() -> Vec<ExerciseCandidate> {
    [(60, "mobility"), (90, "cardio"), (120, "strength"), (150, "cardio"), (180, "core")]
        .into_iter()
        .map(|(duration, tag)| ExerciseCandidate {
            id: Uuid::new_v4(),
            duration_seconds: duration,
            category_tag: tag.to_string(),
            is_premium: false,
        })
        .collect()
}

fn harness(exercises: Vec<ExerciseCandidate>) -> Harness {
    let store = Arc::new(MemStore::default());
    let rollup = Arc::new(MemRollup::default());
    let ledger = Arc::new(MemLedger::default());
    let engine = PlanOrchestrator::new(
        store.clone(),
        Arc::new(MemCatalog { exercises }),
        rollup.clone(),
        ledger.clone(),
        Arc::new(FixedClock::noon()),
        EngineConfig {
            day_offset_hours: 3,
            default_exercise_count: 5,
        },
    );
    Harness {
        engine,
        store,
        rollup,
        ledger,
    }
}

fn survey(count: u32) -> SurveyInput {
    SurveyInput {
        exercises_count: count,
        categories: Vec::new(),
        time_minutes: 30,
        tier: Tier::Free,
        allow_premium_during_autogen: false,
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn generate_creates_todays_plan_with_items() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let result = h
        .engine
        .generate_from_survey(owner, &survey(3), ProposalSource::Manual)
        .await
        .unwrap();

    assert_eq!(result.items.len(), 3);
    assert_eq!(result.plan.status, PlanStatus::Active);
    assert!(result.plan.total_estimated_minutes > 0);
    // The ledger recorded the (owner, day, source) attempt exactly once.
    assert_eq!(h.ledger.rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn regenerate_without_progress_discards_and_replaces() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let first = h
        .engine
        .generate_from_survey(owner, &survey(3), ProposalSource::Manual)
        .await
        .unwrap();
    let second = h
        .engine
        .generate_from_survey(owner, &survey(2), ProposalSource::Manual)
        .await
        .unwrap();

    assert_eq!(second.plan.id, first.plan.id);
    assert_eq!(second.items.len(), 2);
    // Only the replacement items remain persisted.
    let stored = h.store.list_items(second.plan.id).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn regenerate_with_progress_is_refused() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let plan = h
        .engine
        .generate_from_survey(owner, &survey(3), ProposalSource::Manual)
        .await
        .unwrap();
    h.engine
        .mark_set_completed(owner, plan.items[0].id, None)
        .await
        .unwrap();

    let err = h
        .engine
        .generate_from_survey(owner, &survey(3), ProposalSource::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PlanHasProgress));

    // Progressed items survive the refused attempt.
    let stored = h.store.list_items(plan.plan.id).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].sets_completed, 1);
}

#[tokio::test]
async fn generate_appends_up_to_target_when_progress_exists() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let plan = h
        .engine
        .generate_from_survey(owner, &survey(2), ProposalSource::Manual)
        .await
        .unwrap();
    h.engine
        .mark_set_completed(owner, plan.items[0].id, None)
        .await
        .unwrap();

    let topped = h
        .engine
        .generate_from_survey(owner, &survey(4), ProposalSource::Manual)
        .await
        .unwrap();
    assert_eq!(topped.items.len(), 4);
    let order: Vec<i32> = topped.items.iter().map(|i| i.order_index).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
    // The progressed item is untouched by the append.
    assert_eq!(topped.items[0].sets_completed, 1);
}

#[tokio::test]
async fn failed_generate_leaves_existing_items_in_place() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let plan = h
        .engine
        .generate_from_survey(owner, &survey(3), ProposalSource::Manual)
        .await
        .unwrap();

    // A category filter matching nothing must refuse without touching the
    // stored items, even though none of them carry progress yet.
    let mut narrow = survey(3);
    narrow.categories = vec!["yoga".to_string()];
    let err = h
        .engine
        .generate_from_survey(owner, &narrow, ProposalSource::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoCandidateExercises));

    let stored = h.store.list_items(plan.plan.id).await.unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn empty_catalog_surfaces_no_candidates() {
    let h = harness(Vec::new());
    let err = h
        .engine
        .generate_from_survey(Uuid::new_v4(), &survey(3), ProposalSource::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoCandidateExercises));
}

#[tokio::test]
async fn ensure_generates_when_missing_and_noops_when_full() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let generated = h
        .engine
        .ensure_today_plan_if_empty(owner, Tier::Free)
        .await
        .unwrap()
        .expect("first ensure should generate");
    assert_eq!(generated.items.len(), 5);

    let again = h
        .engine
        .ensure_today_plan_if_empty(owner, Tier::Free)
        .await
        .unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn ensure_appends_when_a_progressed_plan_is_short() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let plan = h
        .engine
        .generate_from_survey(owner, &survey(5), ProposalSource::Manual)
        .await
        .unwrap();
    for item in &plan.items {
        h.engine
            .mark_set_completed(owner, item.id, Some(1))
            .await
            .unwrap();
    }
    // Drop one item so the count is below the default target of 5.
    h.store
        .items
        .lock()
        .unwrap()
        .retain(|i| i.id != plan.items[4].id);

    // 4 progressed items against a target of 5: the silent path appends the
    // shortfall instead of touching the progressed items.
    let topped = h
        .engine
        .ensure_today_plan_if_empty(owner, Tier::Free)
        .await
        .unwrap()
        .expect("ensure should top up a short plan");
    assert_eq!(topped.items.len(), 5);
    assert!(topped.items.iter().take(4).all(|i| i.sets_completed == 1));
}

#[tokio::test]
async fn ensure_leaves_an_overfull_progressed_plan_alone() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();
    let plan = h
        .engine
        .generate_from_survey(owner, &survey(6), ProposalSource::Manual)
        .await
        .unwrap();
    h.engine
        .mark_set_completed(owner, plan.items[0].id, None)
        .await
        .unwrap();

    // 6 items with progress, target 5: a plain no-op for the passive check.
    let result = h
        .engine
        .ensure_today_plan_if_empty(owner, Tier::Free)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn mark_sets_to_completion_rolls_up_once() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let plan = h
        .engine
        .generate_from_survey(owner, &survey(2), ProposalSource::Manual)
        .await
        .unwrap();

    for item in &plan.items {
        let total = item.sets_total;
        let update = h
            .engine
            .mark_set_completed(owner, item.id, Some(total))
            .await
            .unwrap();
        assert_eq!(update.item.sets_completed, total);
    }

    let summary = h
        .engine
        .get_today_summary(owner)
        .await
        .unwrap()
        .expect("plan exists");
    assert_eq!(summary.status, PlanStatus::Completed);
    assert_eq!(summary.items_completed, 2);

    assert_eq!(
        h.rollup.minutes.load(Ordering::SeqCst),
        plan.plan.total_estimated_minutes
    );
    assert_eq!(h.rollup.days.load(Ordering::SeqCst), 1);

    // Replaying the final explicit write must not double-count.
    let last = plan.items.last().unwrap();
    h.engine
        .mark_set_completed(owner, last.id, Some(last.sets_total))
        .await
        .unwrap();
    assert_eq!(h.rollup.days.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.rollup.minutes.load(Ordering::SeqCst),
        plan.plan.total_estimated_minutes
    );
}

#[tokio::test]
async fn mark_item_completed_finishes_in_one_call() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let plan = h
        .engine
        .generate_from_survey(owner, &survey(1), ProposalSource::Manual)
        .await
        .unwrap();
    let update = h
        .engine
        .mark_item_completed(owner, plan.items[0].id)
        .await
        .unwrap();

    assert_eq!(update.item.status, ItemStatus::Completed);
    assert_eq!(update.summary.status, PlanStatus::Completed);
    assert_eq!(h.rollup.days.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn update_sets_total_recomputes_and_can_complete() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();

    let plan = h
        .engine
        .generate_from_survey(owner, &survey(1), ProposalSource::Manual)
        .await
        .unwrap();
    let item = &plan.items[0];
    h.engine
        .mark_set_completed(owner, item.id, Some(2))
        .await
        .unwrap();

    // Shrinking the target to the completed count finishes the item.
    let update = h
        .engine
        .update_item_sets_total(owner, item.id, 2)
        .await
        .unwrap();
    assert_eq!(update.item.sets_total, 2);
    assert_eq!(update.item.status, ItemStatus::Completed);
    assert_eq!(update.summary.status, PlanStatus::Completed);
}

#[tokio::test]
async fn foreign_items_are_forbidden() {
    let h = harness(free_pool());
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();

    let plan = h
        .engine
        .generate_from_survey(owner, &survey(1), ProposalSource::Manual)
        .await
        .unwrap();

    let err = h
        .engine
        .mark_set_completed(intruder, plan.items[0].id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden));
}

#[tokio::test]
async fn summary_is_none_without_a_plan() {
    let h = harness(free_pool());
    assert!(h
        .engine
        .get_today_summary(Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}
