//! Persisted key names, namespaced by owning subsystem.

pub const LEDGER_BALANCE: &str = "ledger.balance";

pub const COSMETICS_ACTIVE: &str = "cosmetics.active";
pub const COSMETICS_OWNED: &str = "cosmetics.owned";

pub const UPGRADE_LEVELS: &str = "upgrades.levels";

pub const ACHIEVEMENTS: &str = "achievements.list";

pub const DAILY_REWARDS: &str = "daily.rewards";
pub const DAILY_STREAK: &str = "daily.streak";
pub const DAILY_LAST_CLAIM: &str = "daily.last_claim";

pub const STATS_COUNTERS: &str = "stats.counters";
pub const STATS_DAILY_PROGRESS: &str = "stats.daily_progress";

pub const MINIGAME_UNLOCKED: &str = "minigame.unlocked";
