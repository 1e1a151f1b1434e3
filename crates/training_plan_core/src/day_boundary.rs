//! crates/training_plan_core/src/day_boundary.rs
//!
//! Pure arithmetic for the "app day": a virtual calendar day whose boundary
//! is local midnight shifted by a configurable offset. The daily reset and
//! the plan calendar key are both derived from it. No side effects, no
//! failure modes; the offset may be any integer, including zero or negative.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Start instants of the current and next app day for a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppDayBoundary {
    pub day_start: NaiveDateTime,
    pub next_day_start: NaiveDateTime,
}

/// The most recent shifted-midnight at or before `now`.
///
/// Boundaries repeat every 24 hours, so only the offset's daily phase
/// matters: an offset of 27 behaves like 3, and -2 like 22. Take local
/// midnight of `now`'s calendar date and add the phase; if the shifted
/// instant is still after `now`, the app day began yesterday.
pub fn day_start(now: NaiveDateTime, offset_hours: i64) -> NaiveDateTime {
    let phase = Duration::hours(offset_hours.rem_euclid(24));
    let shifted = midnight_of(now) + phase;
    if shifted > now {
        shifted - Duration::days(1)
    } else {
        shifted
    }
}

/// The next reset instant: exactly 24 hours after the current day start.
pub fn next_day_start(now: NaiveDateTime, offset_hours: i64) -> NaiveDateTime {
    day_start(now, offset_hours) + Duration::hours(24)
}

/// Both boundaries at once.
pub fn boundary(now: NaiveDateTime, offset_hours: i64) -> AppDayBoundary {
    let start = day_start(now, offset_hours);
    AppDayBoundary {
        day_start: start,
        next_day_start: start + Duration::hours(24),
    }
}

/// The calendar key a moment belongs to: the date of its app-day start.
/// This is the `plan_date` used to look up and create daily plans.
pub fn plan_date(now: NaiveDateTime, offset_hours: i64) -> NaiveDate {
    day_start(now, offset_hours).date()
}

/// Time left until the next reset. Always positive for a valid `now`.
pub fn remaining(now: NaiveDateTime, offset_hours: i64) -> Duration {
    next_day_start(now, offset_hours) - now
}

fn midnight_of(instant: NaiveDateTime) -> NaiveDateTime {
    instant.date().and_time(NaiveTime::MIN)
}
