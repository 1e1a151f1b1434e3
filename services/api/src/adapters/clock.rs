//! services/api/src/adapters/clock.rs
//!
//! The real wall-clock implementation of the `Clock` port. Tests inject
//! fixed clocks instead.

use chrono::{DateTime, Local, NaiveDateTime, Utc};

use training_plan_core::ports::Clock;

#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
