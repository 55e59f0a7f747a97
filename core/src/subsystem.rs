//! Reacting-subsystem trait.
//!
//! RULE: Every subsystem that reacts to economy events implements
//! EconomySubsystem. The engine calls handle() on each of them, in the
//! dispatch order documented in engine.rs, for every event.

use crate::{event::EconomyEvent, scheduler::Scheduler};
use chrono::{NaiveDate, NaiveDateTime};

/// What a subsystem may touch while handling an event.
pub struct DispatchContext<'a> {
    /// Logical time of the mutation (the scheduled instant for timer work).
    pub now: NaiveDateTime,
    pub scheduler: &'a mut Scheduler,
}

impl DispatchContext<'_> {
    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

/// The contract every reacting subsystem must fulfill.
pub trait EconomySubsystem {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per dispatched event.
    ///
    /// Returns follow-up events; the engine queues them behind the
    /// events already waiting, so propagation is breadth-first.
    fn handle(&mut self, event: &EconomyEvent, ctx: &mut DispatchContext<'_>) -> Vec<EconomyEvent>;
}
