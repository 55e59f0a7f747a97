//! Snapshot: the serializable read model of one profile.
//!
//! Built from the engine's read accessors after any operation. It is
//! what a rendering layer (or the runner) consumes; nothing reads it back.

use crate::{
    cosmetic_subsystem::SkinId,
    daily_streak_subsystem::DailyReward,
    engine::EconomyEngine,
    minigame_subsystem::{Card, MiniGameLevel, Phase},
    statistics_subsystem::{format_play_time, DailyProgressEntry},
    types::{Coins, ProfileId},
    upgrade_subsystem::UpgradeKind,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct EconomySnapshot {
    pub profile_id: ProfileId,
    pub now: NaiveDateTime,
    pub suspended: bool,
    pub balance: Coins,
    pub tap_reward: Coins,
    pub skins: SkinsView,
    pub upgrades: Vec<UpgradeView>,
    pub accrual: AccrualView,
    pub statistics: StatisticsView,
    pub achievements: Vec<AchievementView>,
    pub daily: DailyView,
    pub minigame: MiniGameView,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkinsView {
    pub active: SkinId,
    pub power: f64,
    pub owned: Vec<SkinId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpgradeView {
    pub kind: UpgradeKind,
    pub level: u32,
    pub price: Coins,
    pub maxed: bool,
    pub affordable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccrualView {
    pub active: bool,
    pub interval_ms: i64,
    pub amount_per_tick: Coins,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsView {
    pub total_coins_earned: Coins,
    pub total_taps: u64,
    pub play_time_secs: u64,
    pub play_time: String,
    pub max_daily_earnings: Coins,
    pub best_minigame_level: u32,
    pub today_coins: Coins,
    pub weekly: Vec<DailyProgressEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementView {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub current: i64,
    pub target: i64,
    pub progress: f64,
    pub reward: Coins,
    pub completed: bool,
    pub claimed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyView {
    pub streak: u32,
    pub last_claim: Option<NaiveDate>,
    pub claimable_day: Option<u32>,
    pub next_reward_day: u32,
    pub streak_bonus: Coins,
    pub days_until_next_reward: u32,
    pub rewards: Vec<DailyReward>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MiniGameView {
    pub phase: Phase,
    pub level: Option<u32>,
    pub time_remaining: u32,
    pub cards: Vec<Card>,
    pub levels: Vec<MiniGameLevel>,
}

impl EconomySnapshot {
    pub fn capture(engine: &EconomyEngine) -> Self {
        let today = engine.today();
        let cosmetics = engine.cosmetics();
        let upgrades = engine.upgrades();
        let accrual = engine.accrual();
        let stats = engine.statistics();
        let daily = engine.daily();
        let minigame = engine.minigame();

        Self {
            profile_id: engine.profile_id().to_string(),
            now: engine.now(),
            suspended: engine.is_suspended(),
            balance: engine.balance(),
            tap_reward: accrual.tap_reward(),
            skins: SkinsView {
                active: cosmetics.active(),
                power: cosmetics.active_power(),
                owned: cosmetics.owned().collect(),
            },
            upgrades: UpgradeKind::ALL
                .iter()
                .map(|&kind| UpgradeView {
                    kind,
                    level: upgrades.level(kind),
                    price: upgrades.price(kind),
                    maxed: upgrades.is_maxed(kind),
                    affordable: !upgrades.is_maxed(kind) && engine.ledger().can_afford(upgrades.price(kind)),
                })
                .collect(),
            accrual: AccrualView {
                active: accrual.is_active(),
                interval_ms: accrual.interval().num_milliseconds(),
                amount_per_tick: accrual.amount_per_tick(),
            },
            statistics: StatisticsView {
                total_coins_earned: stats.total_coins_earned(),
                total_taps: stats.total_taps(),
                play_time_secs: stats.play_time_secs(),
                play_time: format_play_time(stats.play_time_secs()),
                max_daily_earnings: stats.max_daily_earnings(),
                best_minigame_level: stats.best_minigame_level(),
                today_coins: stats.today_coins(today),
                weekly: stats.weekly_progress(today),
            },
            achievements: engine
                .achievements()
                .all()
                .iter()
                .map(|a| AchievementView {
                    id: a.id,
                    title: a.def().title,
                    description: a.def().description,
                    current: a.current,
                    target: a.target(),
                    progress: a.progress(),
                    reward: a.reward(),
                    completed: a.completed,
                    claimed: a.claimed,
                })
                .collect(),
            daily: DailyView {
                streak: daily.streak(),
                last_claim: daily.last_claim(),
                claimable_day: daily.claimable_day(),
                next_reward_day: daily.next_reward_day(),
                streak_bonus: daily.streak_bonus(),
                days_until_next_reward: daily.days_until_next_reward(today),
                rewards: daily.rewards().to_vec(),
            },
            minigame: MiniGameView {
                phase: minigame.phase(),
                level: minigame.current_level(),
                time_remaining: minigame.time_remaining(),
                cards: minigame.cards().to_vec(),
                levels: minigame.levels(),
            },
        }
    }
}
