pub mod allocator;
pub mod countdown;
pub mod day_boundary;
pub mod domain;
pub mod orchestrator;
pub mod ports;
pub mod state_machine;

pub use domain::{
    ExerciseCandidate, ItemStatus, NewItemSpec, Plan, PlanItem, PlanStatus, PlanWithItems,
    ProposalSource, SurveyInput, Tier, TodaySummary,
};
pub use orchestrator::{EngineConfig, EngineError, EngineResult, ItemUpdate, PlanOrchestrator};
pub use ports::{
    Clock, ExerciseCatalog, ItemPatch, PlanStore, PortError, PortResult, ProgressRollup,
    ProposalLedger,
};
