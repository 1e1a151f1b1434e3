pub mod catalog;
pub mod clock;
pub mod db;
pub mod ledger;
pub mod progress;

pub use catalog::PgExerciseCatalog;
pub use clock::SystemClock;
pub use db::PgPlanStore;
pub use ledger::PgProposalLedger;
pub use progress::PgProgressRollup;
