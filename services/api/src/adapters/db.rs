//! services/api/src/adapters/db.rs
//!
//! This module contains the plan-store adapter, which is the concrete
//! implementation of the `PlanStore` port from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use training_plan_core::domain::{ItemStatus, NewItemSpec, Plan, PlanItem, PlanStatus};
use training_plan_core::ports::{ItemPatch, PlanStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `PlanStore` port.
#[derive(Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    /// Creates a new `PgPlanStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn to_transient(e: sqlx::Error) -> PortError {
    PortError::Transient(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PlanRecord {
    id: Uuid,
    owner_id: Uuid,
    plan_date: NaiveDate,
    title: String,
    total_estimated_minutes: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PlanRecord {
    fn to_domain(self) -> PortResult<Plan> {
        let status: PlanStatus = self
            .status
            .parse()
            .map_err(|e: training_plan_core::domain::StatusParseError| {
                PortError::Transient(e.to_string())
            })?;
        Ok(Plan {
            id: self.id,
            owner_id: self.owner_id,
            plan_date: self.plan_date,
            title: self.title,
            total_estimated_minutes: self.total_estimated_minutes.max(0) as u32,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ItemRecord {
    id: Uuid,
    plan_id: Uuid,
    exercise_ref: Uuid,
    order_index: i32,
    category_tag: String,
    sets_total: i32,
    sets_completed: i32,
    rest_seconds: i32,
    exercise_duration_seconds: i32,
    estimated_minutes: i32,
    status: String,
    completed_at: Option<DateTime<Utc>>,
}

impl ItemRecord {
    fn to_domain(self) -> PortResult<PlanItem> {
        let status: ItemStatus = self
            .status
            .parse()
            .map_err(|e: training_plan_core::domain::StatusParseError| {
                PortError::Transient(e.to_string())
            })?;
        Ok(PlanItem {
            id: self.id,
            plan_id: self.plan_id,
            exercise_ref: self.exercise_ref,
            order_index: self.order_index,
            category_tag: self.category_tag,
            sets_total: self.sets_total.max(0) as u32,
            sets_completed: self.sets_completed.max(0) as u32,
            rest_seconds: self.rest_seconds.max(0) as u32,
            exercise_duration_seconds: self.exercise_duration_seconds.max(0) as u32,
            estimated_minutes: self.estimated_minutes.max(0) as u32,
            status,
            completed_at: self.completed_at,
        })
    }
}

/// Item row joined with its plan's owner, used to tell "not yours" apart
/// from "does not exist".
#[derive(FromRow)]
struct OwnedItemRecord {
    #[sqlx(flatten)]
    item: ItemRecord,
    plan_owner_id: Uuid,
}

const ITEM_COLUMNS: &str = "id, plan_id, exercise_ref, order_index, category_tag, sets_total, \
     sets_completed, rest_seconds, exercise_duration_seconds, estimated_minutes, status, \
     completed_at";

//=========================================================================================
// `PlanStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn get_plan(&self, owner_id: Uuid, plan_date: NaiveDate) -> PortResult<Option<Plan>> {
        let record = sqlx::query_as::<_, PlanRecord>(
            "SELECT id, owner_id, plan_date, title, total_estimated_minutes, status, \
             created_at, updated_at \
             FROM plans \
             WHERE owner_id = $1 AND plan_date = $2 AND status <> 'aborted'",
        )
        .bind(owner_id)
        .bind(plan_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(to_transient)?;

        record.map(PlanRecord::to_domain).transpose()
    }

    async fn get_plan_by_id(&self, owner_id: Uuid, plan_id: Uuid) -> PortResult<Plan> {
        let record = sqlx::query_as::<_, PlanRecord>(
            "SELECT id, owner_id, plan_date, title, total_estimated_minutes, status, \
             created_at, updated_at \
             FROM plans WHERE id = $1",
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(to_transient)?
        .ok_or_else(|| PortError::NotFound(format!("Plan {} not found", plan_id)))?;

        if record.owner_id != owner_id {
            return Err(PortError::Forbidden);
        }
        record.to_domain()
    }

    async fn create_plan(
        &self,
        owner_id: Uuid,
        plan_date: NaiveDate,
        title: &str,
    ) -> PortResult<Plan> {
        let record = sqlx::query_as::<_, PlanRecord>(
            "INSERT INTO plans (id, owner_id, plan_date, title, total_estimated_minutes, status) \
             VALUES ($1, $2, $3, $4, 0, 'draft') \
             RETURNING id, owner_id, plan_date, title, total_estimated_minutes, status, \
             created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(plan_date)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(to_transient)?;

        record.to_domain()
    }

    async fn update_plan(
        &self,
        plan_id: Uuid,
        total_estimated_minutes: u32,
        status: PlanStatus,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE plans SET total_estimated_minutes = $1, status = $2, updated_at = now() \
             WHERE id = $3",
        )
        .bind(total_estimated_minutes as i32)
        .bind(status.to_string())
        .bind(plan_id)
        .execute(&self.pool)
        .await
        .map_err(to_transient)?;
        Ok(())
    }

    async fn get_item(&self, owner_id: Uuid, item_id: Uuid) -> PortResult<PlanItem> {
        let record = sqlx::query_as::<_, OwnedItemRecord>(
            "SELECT i.id, i.plan_id, i.exercise_ref, i.order_index, i.category_tag, \
             i.sets_total, i.sets_completed, i.rest_seconds, i.exercise_duration_seconds, \
             i.estimated_minutes, i.status, i.completed_at, p.owner_id AS plan_owner_id \
             FROM plan_items i JOIN plans p ON p.id = i.plan_id \
             WHERE i.id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(to_transient)?
        .ok_or_else(|| PortError::NotFound(format!("Item {} not found", item_id)))?;

        if record.plan_owner_id != owner_id {
            return Err(PortError::Forbidden);
        }
        record.item.to_domain()
    }

    async fn list_items(&self, plan_id: Uuid) -> PortResult<Vec<PlanItem>> {
        let records = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM plan_items WHERE plan_id = $1 ORDER BY order_index ASC"
        ))
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await
        .map_err(to_transient)?;

        records.into_iter().map(ItemRecord::to_domain).collect()
    }

    async fn insert_items(
        &self,
        plan_id: Uuid,
        specs: &[NewItemSpec],
    ) -> PortResult<Vec<PlanItem>> {
        // One transaction for the whole batch: a mid-batch failure must not
        // leave a partially populated plan behind.
        let mut tx = self.pool.begin().await.map_err(to_transient)?;
        let mut inserted = Vec::with_capacity(specs.len());
        for spec in specs {
            let record = sqlx::query_as::<_, ItemRecord>(&format!(
                "INSERT INTO plan_items (id, plan_id, exercise_ref, order_index, category_tag, \
                 sets_total, sets_completed, rest_seconds, exercise_duration_seconds, \
                 estimated_minutes, status, completed_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 RETURNING {ITEM_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(plan_id)
            .bind(spec.exercise_ref)
            .bind(spec.order_index)
            .bind(&spec.category_tag)
            .bind(spec.sets_total as i32)
            .bind(spec.sets_completed as i32)
            .bind(spec.rest_seconds as i32)
            .bind(spec.exercise_duration_seconds as i32)
            .bind(spec.estimated_minutes as i32)
            .bind(spec.status.to_string())
            .bind(spec.completed_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(to_transient)?;

            inserted.push(record.to_domain()?);
        }
        tx.commit().await.map_err(to_transient)?;
        Ok(inserted)
    }

    async fn update_item(&self, item_id: Uuid, patch: &ItemPatch) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE plan_items SET sets_total = $1, sets_completed = $2, \
             estimated_minutes = $3, status = $4, completed_at = $5 \
             WHERE id = $6",
        )
        .bind(patch.sets_total as i32)
        .bind(patch.sets_completed as i32)
        .bind(patch.estimated_minutes as i32)
        .bind(patch.status.to_string())
        .bind(patch.completed_at)
        .bind(item_id)
        .execute(&self.pool)
        .await
        .map_err(to_transient)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Item {} not found", item_id)));
        }
        Ok(())
    }

    async fn delete_items(&self, plan_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM plan_items WHERE plan_id = $1")
            .bind(plan_id)
            .execute(&self.pool)
            .await
            .map_err(to_transient)?;
        Ok(())
    }
}
