//! services/api/src/adapters/catalog.rs
//!
//! Concrete implementation of the `ExerciseCatalog` port against the
//! `exercises` table.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use training_plan_core::domain::{ExerciseCandidate, Tier};
use training_plan_core::ports::{ExerciseCatalog, PortError, PortResult};

/// A database adapter that implements the `ExerciseCatalog` port.
#[derive(Clone)]
pub struct PgExerciseCatalog {
    pool: PgPool,
}

impl PgExerciseCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ExerciseRecord {
    id: Uuid,
    duration_seconds: i32,
    category_tag: String,
    is_premium: bool,
}

impl ExerciseRecord {
    fn to_domain(self) -> ExerciseCandidate {
        ExerciseCandidate {
            id: self.id,
            duration_seconds: self.duration_seconds.max(0) as u32,
            category_tag: self.category_tag,
            is_premium: self.is_premium,
        }
    }
}

#[async_trait]
impl ExerciseCatalog for PgExerciseCatalog {
    /// Returns every published exercise with its premium flag intact. The
    /// tier is advisory context; premium exclusion is the allocator's call,
    /// since autogen may deliberately let premium items through.
    async fn list_exercises(&self, _tier: Tier) -> PortResult<Vec<ExerciseCandidate>> {
        let records = sqlx::query_as::<_, ExerciseRecord>(
            "SELECT id, duration_seconds, category_tag, is_premium \
             FROM exercises WHERE published \
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Transient(e.to_string()))?;

        Ok(records.into_iter().map(ExerciseRecord::to_domain).collect())
    }
}
