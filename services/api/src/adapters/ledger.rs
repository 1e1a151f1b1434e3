//! services/api/src/adapters/ledger.rs
//!
//! Concrete implementation of the `ProposalLedger` port. The unique
//! constraint on `(owner_id, plan_date, source)` is what makes repeated
//! generation attempts from the same logical trigger idempotent.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use training_plan_core::domain::ProposalSource;
use training_plan_core::ports::{PortError, PortResult, ProposalLedger};

/// A database adapter that implements the `ProposalLedger` port.
#[derive(Clone)]
pub struct PgProposalLedger {
    pool: PgPool,
}

impl PgProposalLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalLedger for PgProposalLedger {
    async fn upsert_proposal(
        &self,
        owner_id: Uuid,
        plan_date: NaiveDate,
        source: ProposalSource,
        plan_id: Uuid,
    ) -> PortResult<()> {
        let idempotency_key = format!("{owner_id}:{plan_date}:{source}");
        sqlx::query(
            "INSERT INTO plan_proposals (id, owner_id, plan_date, source, plan_id, idempotency_key) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (owner_id, plan_date, source) \
             DO UPDATE SET plan_id = EXCLUDED.plan_id, updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(plan_date)
        .bind(source.to_string())
        .bind(plan_id)
        .bind(idempotency_key)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Transient(e.to_string()))?;
        Ok(())
    }
}
