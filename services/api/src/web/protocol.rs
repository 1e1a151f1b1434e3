//! services/api/src/web/protocol.rs
//!
//! Defines the wire types shared by the REST handlers and the countdown
//! WebSocket: request payloads, response bodies, and the typed WS messages
//! between the mobile client and the server.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use training_plan_core::countdown::CountdownSnapshot;
use training_plan_core::domain::{
    Plan, PlanItem, PlanWithItems, SurveyInput, Tier, TodaySummary,
};

//=========================================================================================
// REST Request Payloads
//=========================================================================================

/// The generation survey as sent by the client.
#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct SurveyDto {
    /// Desired exercise count; the engine clamps it to [1, 10].
    pub exercises_count: u32,
    /// Category tags to restrict selection to; empty means no filter.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Minutes the user has available.
    #[serde(default)]
    pub time_minutes: u32,
    /// `"free"` or `"premium"`.
    pub tier: TierDto,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TierDto {
    Free,
    Premium,
}

impl From<TierDto> for Tier {
    fn from(dto: TierDto) -> Self {
        match dto {
            TierDto::Free => Tier::Free,
            TierDto::Premium => Tier::Premium,
        }
    }
}

impl SurveyDto {
    /// An explicit user-triggered survey never auto-admits premium content.
    pub fn into_survey(self) -> SurveyInput {
        SurveyInput {
            exercises_count: self.exercises_count,
            categories: self.categories,
            time_minutes: self.time_minutes,
            tier: self.tier.into(),
            allow_premium_during_autogen: false,
        }
    }
}

/// Body of `POST /plans/ensure`.
#[derive(Deserialize, Debug, ToSchema)]
pub struct EnsureRequest {
    pub tier: TierDto,
}

/// Body of `POST /items/{id}/sets`. Without `value` the stored count is
/// incremented by one; with it the count is set outright (the retry-safe
/// form).
#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateSetsRequest {
    #[serde(default)]
    pub value: Option<u32>,
}

/// Body of `PATCH /items/{id}/sets-total`.
#[derive(Deserialize, Debug, ToSchema)]
pub struct SetsTotalRequest {
    pub sets_total: u32,
}

//=========================================================================================
// REST Response Bodies
//=========================================================================================

#[derive(Serialize, Debug, ToSchema)]
pub struct PlanResponse {
    pub id: Uuid,
    pub plan_date: chrono::NaiveDate,
    pub title: String,
    pub status: String,
    pub total_estimated_minutes: u32,
    pub items: Vec<ItemResponse>,
}

impl PlanResponse {
    pub fn from_domain(plan: &Plan, items: &[PlanItem]) -> Self {
        Self {
            id: plan.id,
            plan_date: plan.plan_date,
            title: plan.title.clone(),
            status: plan.status.to_string(),
            total_estimated_minutes: plan.total_estimated_minutes,
            items: items.iter().map(ItemResponse::from_domain).collect(),
        }
    }
}

impl From<&PlanWithItems> for PlanResponse {
    fn from(value: &PlanWithItems) -> Self {
        Self::from_domain(&value.plan, &value.items)
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub exercise_ref: Uuid,
    pub order_index: i32,
    pub category_tag: String,
    pub sets_total: u32,
    pub sets_completed: u32,
    pub rest_seconds: u32,
    pub estimated_minutes: u32,
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ItemResponse {
    pub fn from_domain(item: &PlanItem) -> Self {
        Self {
            id: item.id,
            exercise_ref: item.exercise_ref,
            order_index: item.order_index,
            category_tag: item.category_tag.clone(),
            sets_total: item.sets_total,
            sets_completed: item.sets_completed,
            rest_seconds: item.rest_seconds,
            estimated_minutes: item.estimated_minutes,
            status: item.status.to_string(),
            completed_at: item.completed_at,
        }
    }
}

/// An item mutation response: the new item state plus the recomputed
/// day summary, so the client never needs a follow-up request.
#[derive(Serialize, Debug, ToSchema)]
pub struct ItemUpdateResponse {
    pub item: ItemResponse,
    pub summary: SummaryResponse,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SummaryResponse {
    pub plan_id: Uuid,
    pub status: String,
    pub total_items: u32,
    pub items_completed: u32,
    pub total_estimated_minutes: u32,
    pub minutes_completed: u32,
}

impl From<&TodaySummary> for SummaryResponse {
    fn from(summary: &TodaySummary) -> Self {
        Self {
            plan_id: summary.plan_id,
            status: summary.status.to_string(),
            total_items: summary.total_items,
            items_completed: summary.items_completed,
            total_estimated_minutes: summary.total_estimated_minutes,
            minutes_completed: summary.minutes_completed,
        }
    }
}

/// One-shot countdown read model (`GET /countdown`) and the payload of the
/// WebSocket `Tick` message.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct CountdownResponse {
    pub hours_remaining: i64,
    pub minutes_remaining: i64,
    pub seconds_remaining: i64,
    pub formatted: String,
    pub is_elapsed: bool,
    pub next_reset: NaiveDateTime,
}

impl From<&CountdownSnapshot> for CountdownResponse {
    fn from(snap: &CountdownSnapshot) -> Self {
        Self {
            hours_remaining: snap.hours_remaining,
            minutes_remaining: snap.minutes_remaining,
            seconds_remaining: snap.seconds_remaining,
            formatted: snap.formatted.clone(),
            is_elapsed: snap.is_elapsed,
            next_reset: snap.next_reset,
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Client TO the Server (countdown WebSocket)
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Initializes the countdown stream. This must be the first message sent
    /// on the connection.
    Init { tier: TierDto },

    /// Sent when the app returns to the foreground: forces an immediate
    /// canonical recomputation instead of waiting for the next tick, since
    /// elapsed time while suspended is not reliably tracked.
    Resync,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (countdown WebSocket)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One countdown update, sent on a 1-second cadence and on resync.
    Tick { countdown: CountdownResponse },

    /// The day boundary was crossed and the silent ensure pass ran; carries
    /// the regenerated plan id when one was produced.
    PlanEnsured { plan_id: Option<Uuid> },

    /// Reports a fatal error to the client, which should display an error message.
    Error { message: String },
}
