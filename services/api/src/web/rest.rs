//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::protocol::{
    CountdownResponse, EnsureRequest, ItemResponse, ItemUpdateResponse, PlanResponse,
    SetsTotalRequest, SummaryResponse, SurveyDto, TierDto, UpdateSetsRequest,
};
use crate::web::state::AppState;
use training_plan_core::countdown::CountdownState;
use training_plan_core::domain::ProposalSource;
use training_plan_core::orchestrator::EngineError;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_plan_handler,
        ensure_plan_handler,
        today_summary_handler,
        mark_set_handler,
        complete_item_handler,
        sets_total_handler,
        countdown_handler,
    ),
    components(
        schemas(
            SurveyDto,
            TierDto,
            EnsureRequest,
            UpdateSetsRequest,
            SetsTotalRequest,
            PlanResponse,
            ItemResponse,
            ItemUpdateResponse,
            SummaryResponse,
            CountdownResponse,
        )
    ),
    tags(
        (name = "Training Plan API", description = "Daily training plan generation, completion tracking and reset countdown.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Plan Handlers
//=========================================================================================

/// Generate (or top up) today's plan from a survey.
///
/// Items with recorded progress are never destroyed: a conflicting request
/// is refused with 409 rather than overwriting them.
#[utoipa::path(
    post,
    path = "/plans/generate",
    request_body = SurveyDto,
    responses(
        (status = 201, description = "Plan generated", body = PlanResponse),
        (status = 409, description = "Existing plan has recorded progress"),
        (status = 422, description = "No candidate exercises match the survey filters"),
        (status = 401, description = "Missing or malformed x-user-id header")
    )
)]
pub async fn generate_plan_handler(
    State(state): State<AppState>,
    Extension(owner_id): Extension<Uuid>,
    Json(survey): Json<SurveyDto>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .engine
        .generate_from_survey(owner_id, &survey.into_survey(), ProposalSource::Manual)
        .await?;
    Ok((StatusCode::CREATED, Json(PlanResponse::from(&result))))
}

/// Silent ensure: generate today's plan only if it is missing or short.
///
/// This is the endpoint background triggers call; a plan with recorded
/// progress is left untouched and reported as a no-op, never as an error.
#[utoipa::path(
    post,
    path = "/plans/ensure",
    request_body = EnsureRequest,
    responses(
        (status = 201, description = "Plan generated", body = PlanResponse),
        (status = 204, description = "Nothing to do: today's plan is already populated"),
        (status = 401, description = "Missing or malformed x-user-id header")
    )
)]
pub async fn ensure_plan_handler(
    State(state): State<AppState>,
    Extension(owner_id): Extension<Uuid>,
    Json(body): Json<EnsureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state
        .engine
        .ensure_today_plan_if_empty(owner_id, body.tier.into())
        .await?
    {
        Some(result) => {
            info!(owner = %owner_id, plan_id = %result.plan.id, "ensure generated a plan");
            Ok((StatusCode::CREATED, Json(PlanResponse::from(&result))).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Completion state of today's plan.
#[utoipa::path(
    get,
    path = "/plans/today/summary",
    responses(
        (status = 200, description = "Today's completion summary", body = SummaryResponse),
        (status = 404, description = "No plan exists yet for today"),
        (status = 401, description = "Missing or malformed x-user-id header")
    )
)]
pub async fn today_summary_handler(
    State(state): State<AppState>,
    Extension(owner_id): Extension<Uuid>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state
        .engine
        .get_today_summary(owner_id)
        .await?
        .ok_or_else(|| ApiError::Engine(EngineError::NotFound("today's plan".to_string())))?;
    Ok(Json(SummaryResponse::from(&summary)))
}

//=========================================================================================
// Item Handlers
//=========================================================================================

/// Record completed sets on one item.
#[utoipa::path(
    post,
    path = "/items/{item_id}/sets",
    params(("item_id" = Uuid, Path, description = "The plan item to update")),
    request_body = UpdateSetsRequest,
    responses(
        (status = 200, description = "Updated item and recomputed summary", body = ItemUpdateResponse),
        (status = 404, description = "Item not found"),
        (status = 403, description = "Item belongs to another user"),
        (status = 401, description = "Missing or malformed x-user-id header")
    )
)]
pub async fn mark_set_handler(
    State(state): State<AppState>,
    Extension(owner_id): Extension<Uuid>,
    Path(item_id): Path<Uuid>,
    Json(body): Json<UpdateSetsRequest>,
) -> Result<Json<ItemUpdateResponse>, ApiError> {
    let update = state
        .engine
        .mark_set_completed(owner_id, item_id, body.value)
        .await?;
    Ok(Json(ItemUpdateResponse {
        item: ItemResponse::from_domain(&update.item),
        summary: SummaryResponse::from(&update.summary),
    }))
}

/// Force-complete one item in a single call.
#[utoipa::path(
    post,
    path = "/items/{item_id}/complete",
    params(("item_id" = Uuid, Path, description = "The plan item to complete")),
    responses(
        (status = 200, description = "Updated item and recomputed summary", body = ItemUpdateResponse),
        (status = 404, description = "Item not found"),
        (status = 403, description = "Item belongs to another user"),
        (status = 401, description = "Missing or malformed x-user-id header")
    )
)]
pub async fn complete_item_handler(
    State(state): State<AppState>,
    Extension(owner_id): Extension<Uuid>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemUpdateResponse>, ApiError> {
    let update = state.engine.mark_item_completed(owner_id, item_id).await?;
    Ok(Json(ItemUpdateResponse {
        item: ItemResponse::from_domain(&update.item),
        summary: SummaryResponse::from(&update.summary),
    }))
}

/// Change an item's target set count (clamped to [1, 10]).
#[utoipa::path(
    patch,
    path = "/items/{item_id}/sets-total",
    params(("item_id" = Uuid, Path, description = "The plan item to resize")),
    request_body = SetsTotalRequest,
    responses(
        (status = 200, description = "Updated item and recomputed summary", body = ItemUpdateResponse),
        (status = 404, description = "Item not found"),
        (status = 403, description = "Item belongs to another user"),
        (status = 401, description = "Missing or malformed x-user-id header")
    )
)]
pub async fn sets_total_handler(
    State(state): State<AppState>,
    Extension(owner_id): Extension<Uuid>,
    Path(item_id): Path<Uuid>,
    Json(body): Json<SetsTotalRequest>,
) -> Result<Json<ItemUpdateResponse>, ApiError> {
    let update = state
        .engine
        .update_item_sets_total(owner_id, item_id, body.sets_total)
        .await?;
    Ok(Json(ItemUpdateResponse {
        item: ItemResponse::from_domain(&update.item),
        summary: SummaryResponse::from(&update.summary),
    }))
}

//=========================================================================================
// Countdown Handler
//=========================================================================================

/// One-shot snapshot of the time remaining until the next daily reset.
/// The live, drift-corrected stream is the `/ws/countdown` WebSocket.
#[utoipa::path(
    get,
    path = "/countdown",
    responses(
        (status = 200, description = "Time remaining until the next reset", body = CountdownResponse)
    )
)]
pub async fn countdown_handler(State(state): State<AppState>) -> Json<CountdownResponse> {
    let now = state.clock.now_local();
    let mut countdown = CountdownState::new(now, state.config.day_offset_hours);
    let snapshot = countdown.tick(now);
    Json(CountdownResponse::from(&snapshot))
}
