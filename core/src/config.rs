//! Tunable economy parameters.
//!
//! Catalog identity (skins, upgrade kinds, achievements, reward table) is
//! fixed data living next to the subsystem that owns it. Everything here
//! is a knob: formulas' constants, timer periods and mini-game payouts.

use crate::{
    error::{EconomyError, EconomyResult},
    types::Coins,
};
use serde::{Deserialize, Serialize};

// ── Accrual and tap ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccrualConfig {
    /// Coins per tap/tick before the skin multiplier.
    pub base_reward: f64,
    /// Period of the auto-accrual task at speed level 0.
    pub base_interval_ms: i64,
    /// Interval shaved off per speed level.
    pub interval_step_ms: i64,
    /// Lower bound on the accrual period.
    pub min_interval_ms: i64,
    /// Manual tap bonus per tap upgrade level (0.25 = +25%).
    pub tap_bonus_per_level: f64,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            base_reward: 10.0,
            base_interval_ms: 1_500,
            interval_step_ms: 40,
            min_interval_ms: 200,
            tap_bonus_per_level: 0.25,
        }
    }
}

// ── Upgrades ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpgradeConfig {
    pub max_level: u32,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self { max_level: 25 }
    }
}

// ── Statistics ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Period of the play-time task; each fire adds exactly this much.
    pub play_time_tick_ms: i64,
    /// Per-day rollup entries kept (oldest evicted first).
    pub progress_history_days: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            play_time_tick_ms: 1_000,
            progress_history_days: 30,
        }
    }
}

// ── Mini-game ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MiniGameConfig {
    pub level_count: u32,
    pub countdown_tick_ms: i64,
    /// Delay before a mismatched pair turns face-down again.
    pub flip_back_delay_ms: i64,
    pub reward_per_level: Coins,
    pub loss_penalty: Coins,
    /// Distinct card faces available for the board.
    pub card_types: u32,
}

impl Default for MiniGameConfig {
    fn default() -> Self {
        Self {
            level_count: 10,
            countdown_tick_ms: 1_000,
            flip_back_delay_ms: 800,
            reward_per_level: 1_000,
            loss_penalty: 1_000,
            card_types: 6,
        }
    }
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EconomyConfig {
    /// Master seed for every deterministic RNG stream.
    pub seed: u64,
    /// Append every dispatched event to the persistent event log.
    pub record_events: bool,
    pub accrual: AccrualConfig,
    pub upgrades: UpgradeConfig,
    pub statistics: StatisticsConfig,
    pub minigame: MiniGameConfig,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            record_events: false,
            accrual: AccrualConfig::default(),
            upgrades: UpgradeConfig::default(),
            statistics: StatisticsConfig::default(),
            minigame: MiniGameConfig::default(),
        }
    }
}

impl EconomyConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    /// In tests, use EconomyConfig::default_test().
    pub fn load(path: &str) -> EconomyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EconomyError::Config {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let config: EconomyConfig =
            serde_json::from_str(&content).map_err(|e| EconomyError::Config {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        config.validate(path)?;
        log::debug!("Loaded economy config from {path}");
        Ok(config)
    }

    /// Defaults with a fixed seed and the event log switched on.
    pub fn default_test() -> Self {
        Self {
            seed: 0xC01D_5EED,
            record_events: true,
            ..Self::default()
        }
    }

    fn validate(&self, path: &str) -> EconomyResult<()> {
        let reject = |reason: &str| {
            Err(EconomyError::Config {
                path: path.to_string(),
                reason: reason.to_string(),
            })
        };
        if self.accrual.min_interval_ms <= 0 {
            return reject("accrual.min_interval_ms must be positive");
        }
        if self.statistics.play_time_tick_ms <= 0 || self.minigame.countdown_tick_ms <= 0 {
            return reject("timer periods must be positive");
        }
        if self.minigame.card_types == 0 || self.minigame.level_count == 0 {
            return reject("minigame needs at least one level and one card type");
        }
        Ok(())
    }
}
