//! services/api/src/adapters/progress.rs
//!
//! Concrete implementation of the `ProgressRollup` port: cumulative
//! per-user counters in the `user_progress` table.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use training_plan_core::ports::{PortError, PortResult, ProgressRollup};

/// A database adapter that implements the `ProgressRollup` port.
#[derive(Clone)]
pub struct PgProgressRollup {
    pool: PgPool,
}

impl PgProgressRollup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressRollup for PgProgressRollup {
    async fn add_active_minutes(&self, owner_id: Uuid, minutes: u32) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_progress (owner_id, active_minutes, training_days) \
             VALUES ($1, $2, 0) \
             ON CONFLICT (owner_id) \
             DO UPDATE SET active_minutes = user_progress.active_minutes + EXCLUDED.active_minutes, \
             updated_at = now()",
        )
        .bind(owner_id)
        .bind(minutes as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Transient(e.to_string()))?;
        Ok(())
    }

    async fn increment_training_days(&self, owner_id: Uuid, n: u32) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_progress (owner_id, active_minutes, training_days) \
             VALUES ($1, 0, $2) \
             ON CONFLICT (owner_id) \
             DO UPDATE SET training_days = user_progress.training_days + EXCLUDED.training_days, \
             updated_at = now()",
        )
        .bind(owner_id)
        .bind(n as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Transient(e.to_string()))?;
        Ok(())
    }
}
