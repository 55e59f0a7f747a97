//! Periodic and delayed task scheduler.
//!
//! RULE: at most one task per slot. Scheduling a slot replaces whatever
//! was there, so a restart is always cancel-then-reschedule in one step
//! and a stale periodic source can never double-fire.
//!
//! The scheduler owns no thread and reads no clock. The engine asks it
//! for due work with `pop_due(now)`, runs the task, then asks again;
//! a task that reschedules itself mid-pump is seen by the next pop.
//!
//! `pop_due_batch` folds the missed periods of an accumulating slot into
//! one fire per calendar day, so a long catch-up costs one settlement
//! per day instead of one per period.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

/// Stable task slots, one per periodic concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskSlot {
    /// Passive coin accrual.
    Accrual,
    /// Play-time accumulation.
    PlayTime,
    /// Mini-game countdown.
    Countdown,
    /// Mini-game mismatched pair turning face-down.
    FlipBack,
}

impl TaskSlot {
    /// Slots whose missed periods add up and can settle together.
    pub fn accumulates(self) -> bool {
        matches!(self, TaskSlot::Accrual | TaskSlot::PlayTime)
    }
}

#[derive(Debug, Clone)]
struct Task {
    due: NaiveDateTime,
    period: Option<Duration>,
    generation: u64,
}

/// A task that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub slot: TaskSlot,
    /// Scheduled instant of this firing (not the pump time). For a
    /// batch, the instant of its last period.
    pub at: NaiveDateTime,
    pub generation: u64,
    /// Periods settled by this fire; 1 unless batched.
    pub count: u32,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: BTreeMap<TaskSlot, Task>,
    next_generation: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every `period`, first at `now + period`. Replaces any task in `slot`.
    pub fn schedule_repeating(&mut self, slot: TaskSlot, period: Duration, now: NaiveDateTime) -> u64 {
        let period = period.max(Duration::milliseconds(1));
        self.insert(slot, now + period, Some(period))
    }

    /// Fire once at `now + delay`. Replaces any task in `slot`.
    pub fn schedule_once(&mut self, slot: TaskSlot, delay: Duration, now: NaiveDateTime) -> u64 {
        self.insert(slot, now + delay, None)
    }

    /// Returns true if a task was removed.
    pub fn cancel(&mut self, slot: TaskSlot) -> bool {
        self.tasks.remove(&slot).is_some()
    }

    pub fn is_scheduled(&self, slot: TaskSlot) -> bool {
        self.tasks.contains_key(&slot)
    }

    pub fn period(&self, slot: TaskSlot) -> Option<Duration> {
        self.tasks.get(&slot).and_then(|t| t.period)
    }

    pub fn next_due(&self, slot: TaskSlot) -> Option<NaiveDateTime> {
        self.tasks.get(&slot).map(|t| t.due)
    }

    pub fn generation(&self, slot: TaskSlot) -> Option<u64> {
        self.tasks.get(&slot).map(|t| t.generation)
    }

    pub fn active_slots(&self) -> Vec<TaskSlot> {
        self.tasks.keys().copied().collect()
    }

    /// Take the earliest task due at or before `now`.
    /// Repeating tasks advance by one period; one-shot tasks are removed.
    /// Ties resolve in slot order.
    pub fn pop_due(&mut self, now: NaiveDateTime) -> Option<Fired> {
        self.pop(now, false)
    }

    /// Like `pop_due`, but an accumulating slot takes every period due by
    /// `now` that falls on the same calendar day as its first one.
    pub fn pop_due_batch(&mut self, now: NaiveDateTime) -> Option<Fired> {
        self.pop(now, true)
    }

    fn pop(&mut self, now: NaiveDateTime, batch: bool) -> Option<Fired> {
        let (slot, due) = self
            .tasks
            .iter()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(slot, t)| (t.due, **slot))
            .map(|(slot, t)| (*slot, t.due))?;

        let task = self.tasks.get_mut(&slot)?;
        let generation = task.generation;
        match task.period {
            Some(period) => {
                let count = if batch && slot.accumulates() { same_day_periods(due, period, now) } else { 1 };
                let last = due + span_of(period, count - 1);
                task.due = last + period;
                Some(Fired { slot, at: last, generation, count })
            }
            None => {
                self.tasks.remove(&slot);
                Some(Fired { slot, at: due, generation, count: 1 })
            }
        }
    }

    fn insert(&mut self, slot: TaskSlot, due: NaiveDateTime, period: Option<Duration>) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        if self.tasks.insert(slot, Task { due, period, generation }).is_some() {
            log::debug!("scheduler: replaced {slot:?} task");
        }
        generation
    }
}

/// Periods `first + k × period` (k ≥ 0) that are due by `now` and fall
/// before the midnight after `first`. At least 1.
fn same_day_periods(first: NaiveDateTime, period: Duration, now: NaiveDateTime) -> u32 {
    let limit = match first.date().succ_opt() {
        Some(next_day) if next_day.and_time(NaiveTime::MIN) <= now => {
            next_day.and_time(NaiveTime::MIN) - Duration::nanoseconds(1)
        }
        _ => now,
    };
    match ((limit - first).num_nanoseconds(), period.num_nanoseconds()) {
        (Some(span), Some(step)) if step > 0 && span >= 0 => {
            u32::try_from(span / step + 1).unwrap_or(u32::MAX)
        }
        _ => 1,
    }
}

/// `period × n`, within one day so never near the Duration bounds.
fn span_of(period: Duration, n: u32) -> Duration {
    period
        .num_nanoseconds()
        .map(|step| Duration::nanoseconds(step.saturating_mul(i64::from(n))))
        .unwrap_or(period)
}
