//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use crate::config::Config;
use training_plan_core::orchestrator::PlanOrchestrator;
use training_plan_core::ports::Clock;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PlanOrchestrator>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}
