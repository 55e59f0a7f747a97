//! Statistics aggregator: cumulative counters and per-day rollups.
//!
//! Counts gross income: every positive credit adds to the coin total,
//! debits and penalties never subtract from it. Play time grows only
//! through PlayTimeAccrued events, one fixed increment per timer fire.
//!
//! Every mutation persists immediately and emits StatisticsUpdated so the
//! achievement engine recomputes against the new totals.
//!
//! Execution: after accrual, before achievements.
//! Depends on: CoinsCredited, TapRegistered, PlayTimeAccrued, MiniGameWon.

use crate::{
    config::StatisticsConfig,
    event::EconomyEvent,
    store::{keys, ProfileStore},
    subsystem::{DispatchContext, EconomySubsystem},
    types::Coins,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsCounters {
    pub total_coins_earned: Coins,
    pub total_taps: u64,
    pub play_time_ms: i64,
    pub max_daily_earnings: Coins,
    pub best_minigame_level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgressEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub coins_earned: Coins,
    #[serde(default)]
    pub taps: u64,
}

pub struct StatisticsSubsystem {
    config: StatisticsConfig,
    counters: StatisticsCounters,
    /// Oldest first, one entry per calendar day.
    progress: Vec<DailyProgressEntry>,
    store: ProfileStore,
}

impl StatisticsSubsystem {
    pub fn load(store: ProfileStore, config: StatisticsConfig) -> Self {
        let counters = store
            .read_record::<StatisticsCounters>(keys::STATS_COUNTERS)
            .unwrap_or_default();
        let mut progress = store
            .read_record::<Vec<DailyProgressEntry>>(keys::STATS_DAILY_PROGRESS)
            .unwrap_or_default();
        progress.sort_by_key(|e| e.date);
        progress.dedup_by_key(|e| e.date);
        let mut stats = Self { config, counters, progress, store };
        stats.trim_history();
        stats
    }

    // ── Read accessors ─────────────────────────────────────────

    pub fn counters(&self) -> &StatisticsCounters {
        &self.counters
    }

    pub fn total_coins_earned(&self) -> Coins {
        self.counters.total_coins_earned
    }

    pub fn total_taps(&self) -> u64 {
        self.counters.total_taps
    }

    pub fn play_time_secs(&self) -> u64 {
        u64::try_from(self.counters.play_time_ms / 1_000).unwrap_or(0)
    }

    pub fn max_daily_earnings(&self) -> Coins {
        self.counters.max_daily_earnings
    }

    pub fn best_minigame_level(&self) -> u32 {
        self.counters.best_minigame_level
    }

    pub fn daily_progress(&self) -> &[DailyProgressEntry] {
        &self.progress
    }

    pub fn today_coins(&self, today: NaiveDate) -> Coins {
        self.entry(today).map(|e| e.coins_earned).unwrap_or(0)
    }

    /// Today and the 6 days before it.
    pub fn weekly_progress(&self, today: NaiveDate) -> Vec<DailyProgressEntry> {
        self.progress_within(today, 7)
    }

    /// Today and the 29 days before it.
    pub fn monthly_progress(&self, today: NaiveDate) -> Vec<DailyProgressEntry> {
        self.progress_within(today, 30)
    }

    /// Entries strictly after `today - days`; the boundary day is out.
    fn progress_within(&self, today: NaiveDate, days: i64) -> Vec<DailyProgressEntry> {
        let cutoff = today - Duration::days(days);
        self.progress.iter().filter(|e| e.date > cutoff).cloned().collect()
    }

    fn entry(&self, day: NaiveDate) -> Option<&DailyProgressEntry> {
        self.progress.iter().find(|e| e.date == day)
    }

    // ── Mutations ──────────────────────────────────────────────

    fn add_coins(&mut self, amount: Coins, today: NaiveDate) {
        self.counters.total_coins_earned += amount;
        self.bump_day(today, amount, 0);
        let today_coins = self.today_coins(today);
        if today_coins > self.counters.max_daily_earnings {
            self.counters.max_daily_earnings = today_coins;
        }
    }

    fn add_tap(&mut self, today: NaiveDate) {
        self.counters.total_taps += 1;
        self.bump_day(today, 0, 1);
    }

    fn bump_day(&mut self, day: NaiveDate, coins: Coins, taps: u64) {
        match self.progress.binary_search_by_key(&day, |e| e.date) {
            Ok(i) => {
                self.progress[i].coins_earned += coins;
                self.progress[i].taps += taps;
            }
            Err(i) => self.progress.insert(
                i,
                DailyProgressEntry { date: day, coins_earned: coins, taps },
            ),
        }
        self.trim_history();
        self.store.write_record(keys::STATS_DAILY_PROGRESS, &self.progress);
    }

    fn trim_history(&mut self) {
        let cap = self.config.progress_history_days;
        if self.progress.len() > cap {
            let excess = self.progress.len() - cap;
            self.progress.drain(..excess);
        }
    }

    fn updated(&self) -> EconomyEvent {
        self.store.write_record(keys::STATS_COUNTERS, &self.counters);
        EconomyEvent::StatisticsUpdated {
            total_coins: self.counters.total_coins_earned,
            total_taps: self.counters.total_taps,
            play_time_secs: self.play_time_secs(),
        }
    }
}

/// "HH:MM:SS"; hours are not wrapped at 24.
pub fn format_play_time(secs: u64) -> String {
    let hours = secs / 3_600;
    let minutes = secs / 60 % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

impl EconomySubsystem for StatisticsSubsystem {
    fn name(&self) -> &'static str {
        "statistics"
    }

    fn handle(&mut self, event: &EconomyEvent, ctx: &mut DispatchContext<'_>) -> Vec<EconomyEvent> {
        match event {
            EconomyEvent::CoinsCredited { amount, .. } if *amount > 0 => {
                self.add_coins(*amount, ctx.today());
                vec![self.updated()]
            }
            EconomyEvent::TapRegistered { .. } => {
                self.add_tap(ctx.today());
                vec![self.updated()]
            }
            EconomyEvent::PlayTimeAccrued { millis } if *millis > 0 => {
                self.counters.play_time_ms += millis;
                vec![self.updated()]
            }
            EconomyEvent::MiniGameWon { level } => {
                if *level > self.counters.best_minigame_level {
                    self.counters.best_minigame_level = *level;
                    log::info!("statistics: best mini-game level now {level}");
                }
                vec![self.updated()]
            }
            _ => vec![],
        }
    }
}
