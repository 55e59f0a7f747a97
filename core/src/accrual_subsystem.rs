//! Coin income formulas and the passive accrual schedule.
//!
//! Manual tap:   round(base × power × (1 + bonus × level(tap)))
//! Accrual tick: round(base × power × max(1, level(click)))
//! Interval:     max(min, base_interval − step × level(speed))
//!
//! Accrual runs only while click or speed has at least one level. The
//! subsystem keeps its own copy of the levels and the active power,
//! updated from UpgradePurchased / SkinActivated events.
//!
//! Execution: first in dispatch order, so the schedule is current before
//!   statistics and achievements see the same event.

use crate::{
    config::AccrualConfig,
    event::EconomyEvent,
    scheduler::{Scheduler, TaskSlot},
    subsystem::{DispatchContext, EconomySubsystem},
    types::Coins,
    upgrade_subsystem::{UpgradeKind, UpgradeLevels},
};
use chrono::{Duration, NaiveDateTime};

pub struct AccrualSubsystem {
    config: AccrualConfig,
    power: f64,
    click_level: u32,
    tap_level: u32,
    speed_level: u32,
    paused: bool,
}

impl AccrualSubsystem {
    pub fn new(config: AccrualConfig, power: f64, levels: UpgradeLevels) -> Self {
        Self {
            config,
            power,
            click_level: levels.get(UpgradeKind::Click),
            tap_level: levels.get(UpgradeKind::Tap),
            speed_level: levels.get(UpgradeKind::Speed),
            paused: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.click_level > 0 || self.speed_level > 0
    }

    pub fn interval(&self) -> Duration {
        let reduced = self.config.base_interval_ms - self.config.interval_step_ms * i64::from(self.speed_level);
        Duration::milliseconds(reduced.max(self.config.min_interval_ms))
    }

    pub fn amount_per_tick(&self) -> Coins {
        let multiplier = f64::from(self.click_level.max(1));
        (self.config.base_reward * self.power * multiplier).round() as Coins
    }

    pub fn tap_reward(&self) -> Coins {
        let multiplier = 1.0 + self.config.tap_bonus_per_level * f64::from(self.tap_level);
        (self.config.base_reward * self.power * multiplier).round() as Coins
    }

    /// Cancel any running accrual task, then start a fresh one if accrual
    /// is active and not paused. The new task's first fire is one full
    /// interval after `now`.
    pub fn restart(&mut self, scheduler: &mut Scheduler, now: NaiveDateTime) -> EconomyEvent {
        scheduler.cancel(TaskSlot::Accrual);
        if self.paused || !self.is_active() {
            return EconomyEvent::AccrualStopped;
        }
        let interval = self.interval();
        scheduler.schedule_repeating(TaskSlot::Accrual, interval, now);
        log::debug!(
            "accrual: every {}ms for {}",
            interval.num_milliseconds(),
            self.amount_per_tick()
        );
        EconomyEvent::AccrualRescheduled {
            interval_ms: interval.num_milliseconds(),
            amount_per_tick: self.amount_per_tick(),
        }
    }

    /// Stop accrual until `resume`. Cancels the running task.
    pub fn pause(&mut self, scheduler: &mut Scheduler) {
        self.paused = true;
        scheduler.cancel(TaskSlot::Accrual);
    }

    pub fn resume(&mut self, scheduler: &mut Scheduler, now: NaiveDateTime) -> EconomyEvent {
        self.paused = false;
        self.restart(scheduler, now)
    }
}

impl EconomySubsystem for AccrualSubsystem {
    fn name(&self) -> &'static str {
        "accrual"
    }

    fn handle(&mut self, event: &EconomyEvent, ctx: &mut DispatchContext<'_>) -> Vec<EconomyEvent> {
        match event {
            EconomyEvent::UpgradePurchased { kind, level, .. } => {
                match kind {
                    UpgradeKind::Click => self.click_level = *level,
                    UpgradeKind::Tap => self.tap_level = *level,
                    UpgradeKind::Speed => self.speed_level = *level,
                }
                if kind.drives_accrual() {
                    return vec![self.restart(ctx.scheduler, ctx.now)];
                }
                vec![]
            }
            // Amount is computed at fire time; the interval is unaffected.
            EconomyEvent::SkinActivated { power, .. } => {
                self.power = *power;
                vec![]
            }
            _ => vec![],
        }
    }
}
