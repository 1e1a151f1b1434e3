//! crates/training_plan_core/src/countdown.rs
//!
//! The pure state behind the live reset countdown. The service layer drives
//! it from a repeating timer; this module only decides what the countdown
//! shows and when the day boundary has been crossed.

use chrono::NaiveDateTime;

use crate::day_boundary;

/// A read model of the countdown at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownSnapshot {
    pub hours_remaining: i64,
    pub minutes_remaining: i64,
    pub seconds_remaining: i64,
    /// `"HH:MM:SS"`, hours zero-padded to two digits.
    pub formatted: String,
    /// True on the tick that crossed the boundary; the snapshot already
    /// counts down to the following reset.
    pub is_elapsed: bool,
    pub next_reset: NaiveDateTime,
}

/// Caches the target boundary between ticks so a change in the canonical
/// value (clock jump, offset change, suspended process) is detectable.
#[derive(Debug, Clone)]
pub struct CountdownState {
    offset_hours: i64,
    target: NaiveDateTime,
}

impl CountdownState {
    pub fn new(now: NaiveDateTime, offset_hours: i64) -> Self {
        Self {
            offset_hours,
            target: day_boundary::next_day_start(now, offset_hours),
        }
    }

    /// Advance the countdown to `now` and report whether the cached target
    /// was passed since the previous tick.
    ///
    /// Every tick recomputes the canonical `next_day_start`; if it differs
    /// from the cached target the cache is replaced before the remaining
    /// time is computed. This is the drift-correction rule: the countdown
    /// never diverges from the canonical boundary for more than one tick,
    /// regardless of tick granularity. A forced call (e.g. on resume from
    /// suspend) is just an extra tick.
    pub fn tick(&mut self, now: NaiveDateTime) -> CountdownSnapshot {
        let canonical = day_boundary::next_day_start(now, self.offset_hours);
        // The boundary was crossed iff `now` reached the target we were
        // counting down to.
        let rolled_over = now >= self.target;
        self.target = canonical;

        let remaining = self.target - now;
        let total_seconds = remaining.num_seconds().max(0);
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        CountdownSnapshot {
            hours_remaining: hours,
            minutes_remaining: minutes,
            seconds_remaining: seconds,
            formatted: format!("{hours:02}:{minutes:02}:{seconds:02}"),
            is_elapsed: rolled_over,
            next_reset: self.target,
        }
    }

    /// The boundary currently counted down to.
    pub fn target(&self) -> NaiveDateTime {
        self.target
    }
}
