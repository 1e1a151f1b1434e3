pub mod countdown_task;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible to the binary that
// builds the web server router.
pub use countdown_task::countdown_ws_handler;
pub use middleware::require_owner;
pub use rest::{
    complete_item_handler, countdown_handler, ensure_plan_handler, generate_plan_handler,
    mark_set_handler, sets_total_handler, today_summary_handler,
};
