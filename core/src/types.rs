//! Shared primitive types used across the entire economy.

/// A coin amount. Signed so penalties can be expressed as negative credits.
pub type Coins = i64;

/// Stable identifier of a save profile; every persisted key is scoped by it.
pub type ProfileId = String;

/// Identifier of a catalog achievement (e.g. `"first_steps"`).
pub type AchievementId = &'static str;
