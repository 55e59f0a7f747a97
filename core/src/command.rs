use crate::{
    cosmetic_subsystem::{SelectOutcome, SkinId},
    engine::EconomyEngine,
    types::Coins,
    upgrade_subsystem::UpgradeKind,
};
use serde::{Deserialize, Serialize};

/// All player-issued commands, as read by the runner.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Income and purchases ──────────────────────
    Tap,
    Upgrade { kind: UpgradeKind },
    SelectSkin { skin: SkinId },

    // ── Rewards ───────────────────────────────────
    ClaimAchievement { id: String },
    ClaimDaily { day: u32 },

    // ── Mini-game ─────────────────────────────────
    StartMinigame { level: u32 },
    Flip { index: usize },
    ConfirmMinigame,
    LeaveMinigame,

    // ── Time and lifecycle ────────────────────────
    Advance { millis: i64 },
    Suspend,
    Resume,
}

/// What a command did, for the runner's log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Coins credited (negative for a penalty); 0 means rejected.
    Coins { amount: Coins },
    Accepted { ok: bool },
    Skin { outcome: SelectOutcome },
    Fired { tasks: usize },
    Done,
}

impl EconomyEngine {
    pub fn apply(&mut self, command: &PlayerCommand) -> CommandOutcome {
        log::debug!("engine: applying {command:?}");
        match command {
            PlayerCommand::Tap => CommandOutcome::Coins { amount: self.tap() },
            PlayerCommand::Upgrade { kind } => CommandOutcome::Accepted { ok: self.upgrade(*kind) },
            PlayerCommand::SelectSkin { skin } => CommandOutcome::Skin { outcome: self.select_or_buy(*skin) },
            PlayerCommand::ClaimAchievement { id } => {
                CommandOutcome::Coins { amount: self.claim_achievement(id) }
            }
            PlayerCommand::ClaimDaily { day } => CommandOutcome::Coins { amount: self.claim_daily_reward(*day) },
            PlayerCommand::StartMinigame { level } => {
                CommandOutcome::Accepted { ok: self.start_minigame(*level) }
            }
            PlayerCommand::Flip { index } => {
                self.flip_card(*index);
                CommandOutcome::Done
            }
            PlayerCommand::ConfirmMinigame => CommandOutcome::Coins { amount: self.confirm_minigame() },
            PlayerCommand::LeaveMinigame => {
                self.back_to_level_selection();
                CommandOutcome::Done
            }
            PlayerCommand::Advance { millis } => CommandOutcome::Fired { tasks: self.advance(*millis) },
            PlayerCommand::Suspend => {
                self.suspend();
                CommandOutcome::Done
            }
            PlayerCommand::Resume => {
                self.resume();
                CommandOutcome::Done
            }
        }
    }
}
