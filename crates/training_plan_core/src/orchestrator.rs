//! crates/training_plan_core/src/orchestrator.rs
//!
//! The façade callers use: a thin imperative shell that loads state through
//! the ports, runs the pure allocator/state-machine functions, and persists
//! the results. Every mutating operation is idempotent or clamp-bounded, so
//! a caller-imposed retry is always safe.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::allocator::{self, AllocationError};
use crate::day_boundary;
use crate::domain::{
    ItemStatus, Plan, PlanItem, PlanStatus, PlanWithItems, ProposalSource, SurveyInput, Tier,
    TodaySummary, MAX_EXERCISES_PER_PLAN, MIN_EXERCISES_PER_PLAN,
};
use crate::ports::{
    Clock, ExerciseCatalog, ItemPatch, PlanStore, PortError, ProgressRollup, ProposalLedger,
};
use crate::state_machine::{self, SetOutcome};

//=========================================================================================
// Errors
//=========================================================================================

/// Typed failures of the orchestrator operations, passed through to the
/// caller unchanged (the silent autogen path downgrades `PlanHasProgress`
/// to a no-op).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no candidate exercises match the survey filters")]
    NoCandidateExercises,
    #[error("plan already has recorded progress")]
    PlanHasProgress,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden")]
    Forbidden,
    #[error("transient gateway error: {0}")]
    Transient(String),
}

impl From<PortError> for EngineError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => Self::NotFound(what),
            PortError::Forbidden => Self::Forbidden,
            PortError::Transient(reason) => Self::Transient(reason),
        }
    }
}

impl From<AllocationError> for EngineError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::NoCandidateExercises => Self::NoCandidateExercises,
            AllocationError::PlanHasProgress => Self::PlanHasProgress,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

//=========================================================================================
// Configuration and Construction
//=========================================================================================

/// Engine-level knobs, passed explicitly (no global config singletons).
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Hours past local midnight at which the app day starts.
    pub day_offset_hours: i64,
    /// Target item count for silent background generation.
    pub default_exercise_count: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            day_offset_hours: 3,
            default_exercise_count: 5,
        }
    }
}

/// The updated item plus the recomputed summary, returned by every item
/// mutation so the caller never needs a second round-trip.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub item: PlanItem,
    pub summary: TodaySummary,
}

/// Composes the pure plan logic with the persistence, catalog, rollup, and
/// ledger gateways. The only writer of plan and item rows.
pub struct PlanOrchestrator {
    store: Arc<dyn PlanStore>,
    catalog: Arc<dyn ExerciseCatalog>,
    progress: Arc<dyn ProgressRollup>,
    ledger: Arc<dyn ProposalLedger>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl PlanOrchestrator {
    pub fn new(
        store: Arc<dyn PlanStore>,
        catalog: Arc<dyn ExerciseCatalog>,
        progress: Arc<dyn ProgressRollup>,
        ledger: Arc<dyn ProposalLedger>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            progress,
            ledger,
            clock,
            config,
        }
    }

    /// Today's app-day calendar key.
    pub fn today_key(&self) -> NaiveDate {
        day_boundary::plan_date(self.clock.now_local(), self.config.day_offset_hours)
    }

    //=====================================================================================
    // Generation
    //=====================================================================================

    /// Generate (or top up) today's plan from a survey.
    ///
    /// Existing items with zero recorded progress are discarded and replaced;
    /// items with progress survive and only the shortfall is appended. When
    /// progress exists and the plan already meets the target, the call fails
    /// with `PlanHasProgress` and leaves every row untouched.
    pub async fn generate_from_survey(
        &self,
        owner_id: Uuid,
        survey: &SurveyInput,
        source: ProposalSource,
    ) -> EngineResult<PlanWithItems> {
        let plan_date = self.today_key();
        let plan = self.load_or_create_plan(owner_id, plan_date).await?;
        let mut existing = self.store.list_items(plan.id).await?;

        // A fresh generation replaces untouched items wholesale; the
        // allocator only ever sees items worth preserving. The delete is
        // deferred until the allocation has succeeded, so a refused or
        // empty-pool attempt leaves the stored plan exactly as it was.
        let replace_untouched =
            !existing.is_empty() && !existing.iter().any(PlanItem::has_progress);
        let kept: &[PlanItem] = if replace_untouched { &[] } else { &existing };

        let candidates = self.catalog.list_exercises(survey.tier).await?;
        let allocation = allocator::allocate(kept, survey, &candidates, self.clock.now_utc())?;

        if replace_untouched {
            debug!(plan_id = %plan.id, discarded = existing.len(), "discarding untouched items before regeneration");
            self.store.delete_items(plan.id).await?;
            existing.clear();
        }

        let inserted = self.store.insert_items(plan.id, &allocation.items).await?;
        self.store
            .update_plan(plan.id, allocation.total_estimated_minutes, PlanStatus::Active)
            .await?;
        self.ledger
            .upsert_proposal(owner_id, plan_date, source, plan.id)
            .await?;

        info!(
            owner = %owner_id,
            plan_id = %plan.id,
            %source,
            new_items = inserted.len(),
            "plan generated"
        );

        let mut plan = plan;
        plan.total_estimated_minutes = allocation.total_estimated_minutes;
        plan.status = PlanStatus::Active;
        let mut items = existing;
        items.extend(inserted);

        Ok(PlanWithItems { plan, items })
    }

    /// Silent background variant: only acts when today's plan has fewer
    /// items than the default target, and treats `PlanHasProgress` as a
    /// benign no-op. A passive check never surfaces that refusal.
    pub async fn ensure_today_plan_if_empty(
        &self,
        owner_id: Uuid,
        tier: Tier,
    ) -> EngineResult<Option<PlanWithItems>> {
        let target = self
            .config
            .default_exercise_count
            .clamp(MIN_EXERCISES_PER_PLAN, MAX_EXERCISES_PER_PLAN);

        let plan_date = self.today_key();
        if let Some(plan) = self.store.get_plan(owner_id, plan_date).await? {
            let items = self.store.list_items(plan.id).await?;
            if items.len() as u32 >= target {
                return Ok(None);
            }
        }

        let survey = SurveyInput {
            exercises_count: target,
            categories: Vec::new(),
            time_minutes: 0,
            tier,
            allow_premium_during_autogen: true,
        };

        match self
            .generate_from_survey(owner_id, &survey, ProposalSource::Autogen)
            .await
        {
            Ok(plan) => Ok(Some(plan)),
            Err(EngineError::PlanHasProgress) => {
                debug!(owner = %owner_id, "autogen skipped: plan already has progress");
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    //=====================================================================================
    // Item Mutations
    //=====================================================================================

    /// Record completed sets on one item. With `explicit` the value is
    /// written as is (clamped), which is the retry-safe form; without it
    /// the stored count is incremented by one.
    pub async fn mark_set_completed(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        explicit: Option<u32>,
    ) -> EngineResult<ItemUpdate> {
        let item = self.store.get_item(owner_id, item_id).await?;
        let outcome = state_machine::mark_set(&item, explicit, self.clock.now_utc());
        self.apply_item_outcome(owner_id, outcome).await
    }

    /// Force-complete one item regardless of its current set count.
    pub async fn mark_item_completed(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
    ) -> EngineResult<ItemUpdate> {
        let item = self.store.get_item(owner_id, item_id).await?;
        let now = self.clock.now_utc();
        let updated = state_machine::mark_item_completed(&item, now);
        let outcome = SetOutcome {
            first_progress: item.status == ItemStatus::Pending,
            just_completed: item.status != ItemStatus::Completed,
            item: updated,
        };
        self.apply_item_outcome(owner_id, outcome).await
    }

    /// Change an item's target set count, clamped to the allowed range.
    pub async fn update_item_sets_total(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        new_total: u32,
    ) -> EngineResult<ItemUpdate> {
        let item = self.store.get_item(owner_id, item_id).await?;
        let outcome = state_machine::update_sets_total(&item, new_total, self.clock.now_utc());
        self.apply_item_outcome(owner_id, outcome).await
    }

    /// Completion state of today's plan, or `None` when no plan exists yet
    /// for the current app day.
    pub async fn get_today_summary(&self, owner_id: Uuid) -> EngineResult<Option<TodaySummary>> {
        let Some(plan) = self.store.get_plan(owner_id, self.today_key()).await? else {
            return Ok(None);
        };
        let items = self.store.list_items(plan.id).await?;
        Ok(Some(state_machine::today_summary(&plan, &items)))
    }

    //=====================================================================================
    // Internals
    //=====================================================================================

    async fn load_or_create_plan(&self, owner_id: Uuid, plan_date: NaiveDate) -> EngineResult<Plan> {
        if let Some(plan) = self.store.get_plan(owner_id, plan_date).await? {
            return Ok(plan);
        }
        let title = format!("Training for {plan_date}");
        let plan = self.store.create_plan(owner_id, plan_date, &title).await?;
        info!(owner = %owner_id, plan_id = %plan.id, %plan_date, "created today's plan");
        Ok(plan)
    }

    /// Persist an item transition, then run the unconditional finalize pass
    /// and recompute the summary. The rollup counters are applied only when
    /// the finalize call reports the single Active→Completed transition.
    async fn apply_item_outcome(
        &self,
        owner_id: Uuid,
        outcome: SetOutcome,
    ) -> EngineResult<ItemUpdate> {
        let item = outcome.item;
        self.store
            .update_item(item.id, &ItemPatch::from(&item))
            .await?;

        if outcome.first_progress {
            debug!(item_id = %item.id, "item started");
        }
        if outcome.just_completed {
            info!(item_id = %item.id, "item completed");
        }

        let plan = self.store.get_plan_by_id(owner_id, item.plan_id).await?;
        let items = self.store.list_items(plan.id).await?;
        let finalized = state_machine::finalize_if_complete(&plan, &items, self.clock.now_utc());

        if let Some(rollup) = finalized.rollup {
            // The status write is the idempotency guard: once the plan row
            // reads Completed, later finalize passes carry no delta.
            self.store
                .update_plan(plan.id, plan.total_estimated_minutes, PlanStatus::Completed)
                .await?;
            self.progress
                .add_active_minutes(owner_id, rollup.active_minutes)
                .await?;
            self.progress
                .increment_training_days(owner_id, rollup.training_days)
                .await?;
            info!(
                owner = %owner_id,
                plan_id = %plan.id,
                minutes = rollup.active_minutes,
                "plan completed, progress rolled up"
            );
        }

        let summary = state_machine::today_summary(&finalized.plan, &items);
        Ok(ItemUpdate { item, summary })
    }
}
