//! The economy engine: owns every subsystem and drives the event bus.
//!
//! DISPATCH ORDER (fixed, documented, never reordered):
//!   1. Accrual       (reschedules before anyone reads the new rate)
//!   2. Statistics    (counters, per-day rollup)
//!   3. Achievements  (recompute against the updated counters)
//!
//! RULES:
//!   - Player operations and timer fires mutate exactly one owner
//!     (ledger, cosmetics, upgrades, daily streak, mini-game) and hand
//!     the resulting events to dispatch().
//!   - Follow-up events join the back of the same FIFO queue.
//!   - Gameplay operations never fail. Rejections return a sentinel,
//!     persistence errors are logged by the store handle.
//!   - Time comes only from the injected GameClock; periodic work only
//!     from the Scheduler, advanced by pump().

use crate::{
    accrual_subsystem::AccrualSubsystem,
    achievement_subsystem::AchievementSubsystem,
    clock::{GameClock, ManualClock},
    config::EconomyConfig,
    cosmetic_subsystem::{CosmeticSubsystem, SelectOutcome, SkinId},
    daily_streak_subsystem::DailyStreakSubsystem,
    error::EconomyResult,
    event::{CoinSource, EconomyEvent, EventLogEntry},
    ledger_subsystem::Ledger,
    minigame_subsystem::MiniGameSubsystem,
    scheduler::{Fired, Scheduler, TaskSlot},
    snapshot::EconomySnapshot,
    statistics_subsystem::StatisticsSubsystem,
    store::{GameStore, ProfileStore},
    subsystem::{DispatchContext, EconomySubsystem},
    types::{Coins, ProfileId},
    upgrade_subsystem::{UpgradeKind, UpgradeSubsystem},
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::VecDeque;
use std::rc::Rc;

/// Longest single hand-driven advance: one leap year.
pub const MAX_ADVANCE_MILLIS: i64 = 366 * 24 * 60 * 60 * 1_000;

pub struct EconomyEngine {
    profile_id: ProfileId,
    config: EconomyConfig,
    clock: Box<dyn GameClock>,
    store: Rc<GameStore>,
    scheduler: Scheduler,
    ledger: Ledger,
    cosmetics: CosmeticSubsystem,
    upgrades: UpgradeSubsystem,
    accrual: AccrualSubsystem,
    statistics: StatisticsSubsystem,
    achievements: AchievementSubsystem,
    daily: DailyStreakSubsystem,
    minigame: MiniGameSubsystem,
    suspended: bool,
    /// Last event-log sequence number for this profile.
    seq: u64,
}

impl EconomyEngine {
    /// Load (or create) `profile_id` from the store and start the
    /// periodic tasks. The store must already be migrated.
    pub fn open(
        store: Rc<GameStore>,
        profile_id: &str,
        config: EconomyConfig,
        clock: Box<dyn GameClock>,
    ) -> EconomyResult<Self> {
        if store.ensure_profile(profile_id, env!("CARGO_PKG_VERSION"))? {
            log::info!("engine: created profile {profile_id}");
        }
        let handle = ProfileStore::new(Rc::clone(&store), profile_id.to_string());
        let now = clock.now();

        let ledger = Ledger::load(handle.clone());
        let cosmetics = CosmeticSubsystem::load(handle.clone());
        let upgrades = UpgradeSubsystem::load(handle.clone(), config.upgrades.max_level);
        let accrual = AccrualSubsystem::new(config.accrual.clone(), cosmetics.active_power(), upgrades.levels());
        let statistics = StatisticsSubsystem::load(handle.clone(), config.statistics.clone());
        let achievements = AchievementSubsystem::load(handle.clone());
        let daily = DailyStreakSubsystem::load(handle.clone(), now.date());
        let minigame = MiniGameSubsystem::load(handle, config.minigame.clone(), config.seed);
        let seq = store.last_event_seq(profile_id)?;

        let mut engine = Self {
            profile_id: profile_id.to_string(),
            config,
            clock,
            store,
            scheduler: Scheduler::new(),
            ledger,
            cosmetics,
            upgrades,
            accrual,
            statistics,
            achievements,
            daily,
            minigame,
            suspended: false,
            seq,
        };
        engine.start_periodic(now);
        log::debug!(
            "engine: profile {} open, balance {}",
            engine.profile_id,
            engine.ledger.balance()
        );
        Ok(engine)
    }

    /// In-memory store, test config, manual clock. Keep a clone of
    /// `clock` to drive time from the test.
    pub fn build_test(profile_id: &str, clock: ManualClock) -> EconomyResult<Self> {
        let store = GameStore::in_memory()?;
        store.migrate()?;
        Self::open(Rc::new(store), profile_id, EconomyConfig::default_test(), Box::new(clock))
    }

    // ── Player operations ──────────────────────────────────────

    /// Manual tap. Always succeeds; returns the coins earned.
    pub fn tap(&mut self) -> Coins {
        let reward = self.accrual.tap_reward();
        let credited = self.ledger.credit(reward, CoinSource::Tap);
        self.dispatch("ledger", vec![EconomyEvent::TapRegistered { reward }, credited]);
        reward
    }

    /// Buy one level of `kind`. False (and nothing changed) when maxed
    /// or unaffordable.
    pub fn upgrade(&mut self, kind: UpgradeKind) -> bool {
        let events = self.upgrades.purchase(kind, &mut self.ledger);
        if events.is_empty() {
            return false;
        }
        self.dispatch("upgrades", events);
        true
    }

    pub fn select_or_buy(&mut self, skin: SkinId) -> SelectOutcome {
        let (outcome, events) = self.cosmetics.select_or_buy(skin, &mut self.ledger);
        self.dispatch("cosmetics", events);
        outcome
    }

    /// Claim a completed achievement and credit its reward. Returns 0
    /// when there is nothing to claim.
    pub fn claim_achievement(&mut self, id: &str) -> Coins {
        let reward = self.achievements.claim(id);
        if reward == 0 {
            return 0;
        }
        let credited = self.ledger.credit(reward, CoinSource::AchievementReward);
        self.dispatch(
            "achievements",
            vec![EconomyEvent::AchievementClaimed { id: id.to_string(), reward }, credited],
        );
        reward
    }

    /// Claim `day` of the daily table for today and credit it. Returns 0
    /// when `day` is not claimable.
    pub fn claim_daily_reward(&mut self, day: u32) -> Coins {
        let reward = self.daily.claim(day, self.clock.today());
        if reward == 0 {
            return 0;
        }
        let claimed = EconomyEvent::DailyRewardClaimed { day, reward, streak: self.daily.streak() };
        let credited = self.ledger.credit(reward, CoinSource::DailyReward);
        self.dispatch("daily", vec![claimed, credited]);
        reward
    }

    /// Re-evaluate the daily table against the clock's current day.
    pub fn refresh_daily(&mut self) -> Option<u32> {
        self.daily.evaluate(self.clock.today())
    }

    /// False when the level is locked or the engine is suspended.
    pub fn start_minigame(&mut self, level: u32) -> bool {
        if self.suspended {
            log::debug!("engine: no mini-game while suspended");
            return false;
        }
        let now = self.clock.now();
        match self.minigame.start(level, &mut self.scheduler, now) {
            Some(started) => {
                self.dispatch("minigame", vec![started]);
                true
            }
            None => false,
        }
    }

    pub fn flip_card(&mut self, index: usize) {
        let now = self.clock.now();
        if let Some(won) = self.minigame.flip(index, &mut self.scheduler, now) {
            self.dispatch("minigame", vec![won]);
        }
    }

    /// Settle a decided round: credit the win reward or apply the loss
    /// penalty. Returns the signed amount requested (0 if undecided).
    pub fn confirm_minigame(&mut self) -> Coins {
        let amount = self.minigame.confirm(&mut self.scheduler);
        let source = match amount {
            0 => return 0,
            a if a > 0 => CoinSource::MiniGameReward,
            _ => CoinSource::MiniGamePenalty,
        };
        let credited = self.ledger.credit(amount, source);
        self.dispatch("minigame", vec![credited]);
        amount
    }

    pub fn back_to_level_selection(&mut self) {
        self.minigame.back_to_level_selection(&mut self.scheduler);
    }

    // ── Time and lifecycle ─────────────────────────────────────

    /// Run every task due at the clock's current time, in due order.
    /// Missed accrual and play-time periods settle one calendar day at a
    /// time. Returns the number of fires.
    pub fn pump(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some(task) = self.scheduler.pop_due_batch(now) {
            fired += task.count as usize;
            self.fire(task);
        }
        self.daily.evaluate(now.date());
        fired
    }

    /// Move a manual clock forward and pump. On a wall clock this only pumps.
    /// Negative steps and steps over MAX_ADVANCE_MILLIS are refused and
    /// leave the clock where it was.
    pub fn advance(&mut self, millis: i64) -> usize {
        if !(0..=MAX_ADVANCE_MILLIS).contains(&millis) {
            log::warn!("engine: refusing to advance by {millis} ms");
        } else if !self.clock.try_advance(Duration::milliseconds(millis)) {
            log::debug!("engine: clock not advanced by {millis} ms");
        }
        self.pump()
    }

    /// Backgrounded: stop accrual, play time and the mini-game countdown.
    pub fn suspend(&mut self) {
        if self.suspended {
            return;
        }
        self.pump();
        self.accrual.pause(&mut self.scheduler);
        self.scheduler.cancel(TaskSlot::PlayTime);
        self.minigame.pause(&mut self.scheduler);
        self.suspended = true;
        log::debug!("engine: suspended");
    }

    /// Foregrounded: restart the stopped tasks from now. Time spent
    /// suspended earns nothing.
    pub fn resume(&mut self) {
        if !self.suspended {
            return;
        }
        self.suspended = false;
        let now = self.clock.now();
        let accrual = self.accrual.resume(&mut self.scheduler, now);
        self.start_play_time(now);
        self.minigame.resume(&mut self.scheduler, now);
        self.daily.evaluate(now.date());
        self.dispatch("accrual", vec![accrual]);
        log::debug!("engine: resumed");
    }

    fn start_periodic(&mut self, now: NaiveDateTime) {
        let accrual = self.accrual.restart(&mut self.scheduler, now);
        self.start_play_time(now);
        self.dispatch("accrual", vec![accrual]);
    }

    fn start_play_time(&mut self, now: NaiveDateTime) {
        let tick = Duration::milliseconds(self.config.statistics.play_time_tick_ms);
        self.scheduler.schedule_repeating(TaskSlot::PlayTime, tick, now);
    }

    fn fire(&mut self, task: Fired) {
        match task.slot {
            TaskSlot::Accrual => {
                let amount = self.accrual.amount_per_tick().saturating_mul(i64::from(task.count));
                let credited = self.ledger.credit(amount, CoinSource::Accrual);
                self.dispatch_at(task.at, "accrual", vec![credited]);
            }
            TaskSlot::PlayTime => {
                let millis = self.config.statistics.play_time_tick_ms.saturating_mul(i64::from(task.count));
                self.dispatch_at(task.at, "statistics", vec![EconomyEvent::PlayTimeAccrued { millis }]);
            }
            TaskSlot::Countdown => {
                if let Some(lost) = self.minigame.countdown_tick(&mut self.scheduler) {
                    self.dispatch_at(task.at, "minigame", vec![lost]);
                }
            }
            TaskSlot::FlipBack => self.minigame.flip_back(),
        }
    }

    // ── Event bus ──────────────────────────────────────────────

    fn dispatch(&mut self, origin: &'static str, events: Vec<EconomyEvent>) {
        let now = self.clock.now();
        self.dispatch_at(now, origin, events);
    }

    /// Deliver `events`, and everything they cause, to the reacting
    /// subsystems in dispatch order.
    fn dispatch_at(&mut self, now: NaiveDateTime, origin: &'static str, events: Vec<EconomyEvent>) {
        let mut queue: VecDeque<(&'static str, EconomyEvent)> =
            events.into_iter().map(|e| (origin, e)).collect();

        while let Some((source, event)) = queue.pop_front() {
            self.record(source, &event);

            let mut ctx = DispatchContext { now, scheduler: &mut self.scheduler };
            let reactors: [&mut dyn EconomySubsystem; 3] =
                [&mut self.accrual, &mut self.statistics, &mut self.achievements];
            for subsystem in reactors {
                let name = subsystem.name();
                queue.extend(subsystem.handle(&event, &mut ctx).into_iter().map(|e| (name, e)));
            }
        }
    }

    fn record(&mut self, source: &'static str, event: &EconomyEvent) {
        if !self.config.record_events {
            return;
        }
        let payload = match serde_json::to_string(event) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("engine: cannot encode {}: {e}", event.type_name());
                return;
            }
        };
        self.seq += 1;
        let entry = EventLogEntry {
            id: None,
            profile_id: self.profile_id.clone(),
            seq: self.seq,
            subsystem: source.to_string(),
            event_type: event.type_name().to_string(),
            payload,
        };
        if let Err(e) = self.store.append_event(&entry) {
            log::warn!("engine: event log write failed: {e}");
        }
    }

    // ── Read accessors ─────────────────────────────────────────

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn balance(&self) -> Coins {
        self.ledger.balance()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn cosmetics(&self) -> &CosmeticSubsystem {
        &self.cosmetics
    }

    pub fn upgrades(&self) -> &UpgradeSubsystem {
        &self.upgrades
    }

    pub fn accrual(&self) -> &AccrualSubsystem {
        &self.accrual
    }

    pub fn statistics(&self) -> &StatisticsSubsystem {
        &self.statistics
    }

    pub fn achievements(&self) -> &AchievementSubsystem {
        &self.achievements
    }

    pub fn daily(&self) -> &DailyStreakSubsystem {
        &self.daily
    }

    pub fn minigame(&self) -> &MiniGameSubsystem {
        &self.minigame
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    /// Recorded events for this profile, oldest first.
    pub fn event_log(&self) -> EconomyResult<Vec<EventLogEntry>> {
        self.store.events_for_profile(&self.profile_id)
    }

    pub fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot::capture(self)
    }
}
