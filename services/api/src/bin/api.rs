//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{PgExerciseCatalog, PgPlanStore, PgProposalLedger, PgProgressRollup, SystemClock},
    config::Config,
    error::ApiError,
    web::{
        complete_item_handler, countdown_handler, countdown_ws_handler, ensure_plan_handler,
        generate_plan_handler, mark_set_handler, require_owner, rest::ApiDoc, sets_total_handler,
        state::AppState, today_summary_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use training_plan_core::orchestrator::{EngineConfig, PlanOrchestrator};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let plan_store = Arc::new(PgPlanStore::new(db_pool.clone()));
    info!("Running database migrations...");
    plan_store
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!("Database migrations complete.");

    // --- 3. Build the Plan Engine ---
    let engine = Arc::new(PlanOrchestrator::new(
        plan_store,
        Arc::new(PgExerciseCatalog::new(db_pool.clone())),
        Arc::new(PgProgressRollup::new(db_pool.clone())),
        Arc::new(PgProposalLedger::new(db_pool)),
        Arc::new(SystemClock),
        EngineConfig {
            day_offset_hours: config.day_offset_hours,
            default_exercise_count: config.default_exercise_count,
        },
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = AppState {
        engine,
        clock: Arc::new(SystemClock),
        config: config.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no owner header required)
    let public_routes = Router::new().route("/countdown", get(countdown_handler));

    // Owner-scoped routes
    let protected_routes = Router::new()
        .route("/plans/generate", post(generate_plan_handler))
        .route("/plans/ensure", post(ensure_plan_handler))
        .route("/plans/today/summary", get(today_summary_handler))
        .route("/items/{item_id}/sets", post(mark_set_handler))
        .route("/items/{item_id}/complete", post(complete_item_handler))
        .route("/items/{item_id}/sets-total", patch(sets_total_handler))
        .route("/ws/countdown", get(countdown_ws_handler))
        .layer(axum_middleware::from_fn(require_owner));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
