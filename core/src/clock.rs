//! Game clock: the engine's only source of wall time.
//!
//! RULE: nothing in the economy reads the system time directly.
//! Calendar-day logic (streaks, daily rollups) and the scheduler both
//! go through a `GameClock`, so tests can drive time by hand.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use std::cell::Cell;
use std::rc::Rc;

pub trait GameClock {
    /// Current device-local wall time.
    fn now(&self) -> NaiveDateTime;

    /// Current device-local calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Move time forward by hand. Only manual clocks can; the rest
    /// return false and keep following the wall. A manual clock also
    /// returns false when the move would leave the calendar range.
    fn try_advance(&self, _by: Duration) -> bool {
        false
    }
}

/// Production clock backed by the local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl GameClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Hand-driven clock. Clones share the same instant, so a test can keep
/// one handle while the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { now: Rc::new(Cell::new(start)) }
    }

    /// Midnight of the given calendar day.
    pub fn at_day(day: NaiveDate) -> Self {
        Self::new(day.and_time(chrono::NaiveTime::MIN))
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }

    /// False, with the time unchanged, when `by` overflows the calendar.
    pub fn advance(&self, by: Duration) -> bool {
        match self.now.get().checked_add_signed(by) {
            Some(next) => {
                self.now.set(next);
                true
            }
            None => false,
        }
    }

    pub fn advance_millis(&self, millis: i64) -> bool {
        Duration::try_milliseconds(millis).is_some_and(|by| self.advance(by))
    }

    pub fn advance_days(&self, days: i64) -> bool {
        Duration::try_days(days).is_some_and(|by| self.advance(by))
    }
}

impl GameClock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }

    fn try_advance(&self, by: Duration) -> bool {
        self.advance(by)
    }
}

/// Whole calendar days from `from` to `to` (negative if `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
