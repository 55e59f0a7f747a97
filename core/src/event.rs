//! The event bus: all cross-subsystem propagation.
//!
//! RULE: Subsystems react to each other ONLY through events.
//! A mutation returns the events it caused; the engine dispatches them
//! to the reacting subsystems in a fixed order (see engine.rs).

use crate::{
    cosmetic_subsystem::SkinId,
    types::{Coins, ProfileId},
    upgrade_subsystem::UpgradeKind,
};
use serde::{Deserialize, Serialize};

/// Every event emitted by the economy.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EconomyEvent {
    // ── Ledger ─────────────────────────────────────
    CoinsCredited {
        amount: Coins,
        source: CoinSource,
        balance: Coins,
    },
    CoinsDebited {
        amount: Coins,
        reason: DebitReason,
        balance: Coins,
    },

    // ── Income ─────────────────────────────────────
    TapRegistered {
        reward: Coins,
    },
    AccrualRescheduled {
        interval_ms: i64,
        amount_per_tick: Coins,
    },
    AccrualStopped,

    // ── Purchases ──────────────────────────────────
    UpgradePurchased {
        kind: UpgradeKind,
        level: u32,
        price: Coins,
        total_levels: u32,
    },
    SkinPurchased {
        skin: SkinId,
        price: Coins,
        owned_count: usize,
    },
    SkinActivated {
        skin: SkinId,
        power: f64,
    },

    // ── Statistics ─────────────────────────────────
    StatisticsUpdated {
        total_coins: Coins,
        total_taps: u64,
        play_time_secs: u64,
    },
    PlayTimeAccrued {
        millis: i64,
    },

    // ── Achievements ───────────────────────────────
    AchievementCompleted {
        id: String,
    },
    AchievementClaimed {
        id: String,
        reward: Coins,
    },

    // ── Daily rewards ──────────────────────────────
    DailyRewardClaimed {
        day: u32,
        reward: Coins,
        streak: u32,
    },

    // ── Mini-game ──────────────────────────────────
    MiniGameStarted {
        level: u32,
    },
    MiniGameWon {
        level: u32,
    },
    MiniGameLost {
        level: u32,
    },
}

impl EconomyEvent {
    /// Stable string name, used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CoinsCredited { .. } => "coins_credited",
            Self::CoinsDebited { .. } => "coins_debited",
            Self::TapRegistered { .. } => "tap_registered",
            Self::AccrualRescheduled { .. } => "accrual_rescheduled",
            Self::AccrualStopped => "accrual_stopped",
            Self::UpgradePurchased { .. } => "upgrade_purchased",
            Self::SkinPurchased { .. } => "skin_purchased",
            Self::SkinActivated { .. } => "skin_activated",
            Self::StatisticsUpdated { .. } => "statistics_updated",
            Self::PlayTimeAccrued { .. } => "play_time_accrued",
            Self::AchievementCompleted { .. } => "achievement_completed",
            Self::AchievementClaimed { .. } => "achievement_claimed",
            Self::DailyRewardClaimed { .. } => "daily_reward_claimed",
            Self::MiniGameStarted { .. } => "minigame_started",
            Self::MiniGameWon { .. } => "minigame_won",
            Self::MiniGameLost { .. } => "minigame_lost",
        }
    }
}

/// Where a credit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinSource {
    Tap,
    Accrual,
    DailyReward,
    AchievementReward,
    MiniGameReward,
    MiniGamePenalty,
}

/// What a guarded debit paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebitReason {
    Upgrade,
    Skin,
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub profile_id: ProfileId,
    /// Dispatch sequence number within the engine session.
    pub seq: u64,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized EconomyEvent
}
