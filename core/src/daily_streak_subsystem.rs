//! Daily-streak engine: calendar-day streak over a weekly reward table.
//!
//! States, evaluated against the local calendar day:
//!   no prior claim       → day 1 claimable
//!   claimed today        → nothing claimable
//!   claimed yesterday    → day min(streak + 1, 7) claimable
//!   two or more days ago → streak broken, back to day 1
//!
//! The claimed/available flags are derived from (streak, last_claim).
//! A completed week clears every flag and sets the streak back to 0.
//!
//! Not an event reactor: the engine calls claim() and credits the result.

use crate::{
    clock::days_between,
    store::{keys, ProfileStore},
    types::Coins,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const REWARD_TABLE: [Coins; 7] = [1_000, 2_000, 3_000, 5_000, 7_500, 10_000, 25_000];
pub const WEEK_DAYS: u32 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyReward {
    pub day: u32,
    pub reward: Coins,
    pub claimed: bool,
    pub available: bool,
}

impl Default for DailyReward {
    fn default() -> Self {
        Self { day: 1, reward: REWARD_TABLE[0], claimed: false, available: false }
    }
}

fn reward_for(day: u32) -> Coins {
    REWARD_TABLE[(day.clamp(1, WEEK_DAYS) - 1) as usize]
}

fn default_table() -> Vec<DailyReward> {
    (1..=WEEK_DAYS)
        .map(|day| DailyReward { day, reward: reward_for(day), ..DailyReward::default() })
        .collect()
}

pub struct DailyStreakSubsystem {
    rewards: Vec<DailyReward>,
    streak: u32,
    last_claim: Option<NaiveDate>,
    claimable: Option<u32>,
    store: ProfileStore,
}

impl DailyStreakSubsystem {
    /// Loads the table (merged with saved flags by day), the streak and the
    /// last claim day, then evaluates against `today`.
    pub fn load(store: ProfileStore, today: NaiveDate) -> Self {
        let mut rewards = default_table();
        if let Some(saved) = store.read_record::<Vec<DailyReward>>(keys::DAILY_REWARDS) {
            for reward in rewards.iter_mut() {
                if let Some(s) = saved.iter().find(|s| s.day == reward.day) {
                    reward.claimed = s.claimed;
                }
            }
        }
        let streak = store
            .read_int(keys::DAILY_STREAK)
            .map(|s| s.clamp(0, i64::from(WEEK_DAYS)) as u32)
            .unwrap_or(0);
        let last_claim = store.read_string(keys::DAILY_LAST_CLAIM).and_then(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map_err(|e| log::warn!("daily: unreadable last claim {s:?}: {e}"))
                .ok()
        });

        let mut daily = Self { rewards, streak, last_claim, claimable: None, store };
        daily.evaluate(today);
        daily
    }

    // ── Read accessors ─────────────────────────────────────────

    pub fn rewards(&self) -> &[DailyReward] {
        &self.rewards
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn last_claim(&self) -> Option<NaiveDate> {
        self.last_claim
    }

    /// The day claimable as of the last evaluation.
    pub fn claimable_day(&self) -> Option<u32> {
        self.claimable
    }

    pub fn can_claim_today(&self) -> bool {
        self.claimable.is_some()
    }

    pub fn next_reward_day(&self) -> u32 {
        (self.streak + 1).min(WEEK_DAYS)
    }

    /// Informational only; never credited.
    pub fn streak_bonus(&self) -> Coins {
        match self.streak {
            3..=6 => Coins::from(self.streak) * 500,
            7 => 5_000,
            _ => 0,
        }
    }

    pub fn days_until_next_reward(&self, today: NaiveDate) -> u32 {
        match self.last_claim {
            Some(last) if last == today => 1,
            _ => 0,
        }
    }

    // ── Operations ─────────────────────────────────────────────

    /// Recompute which day is claimable. A broken streak resets to 0 and
    /// clears the claimed flags so day 1 opens again.
    pub fn evaluate(&mut self, today: NaiveDate) -> Option<u32> {
        let day = match self.last_claim {
            None => Some(1),
            Some(last) => match days_between(last, today) {
                1 => Some(self.next_reward_day()),
                // Zero, or the clock went backwards: treat as claimed today.
                d if d < 1 => None,
                _ => {
                    if self.streak != 0 || self.rewards.iter().any(|r| r.claimed) {
                        log::info!("daily: streak of {} broken", self.streak);
                        self.streak = 0;
                        self.rewards.iter_mut().for_each(|r| r.claimed = false);
                        self.persist();
                    }
                    Some(1)
                }
            },
        };
        self.claimable = day.filter(|d| !self.rewards[(*d - 1) as usize].claimed);
        for r in self.rewards.iter_mut() {
            r.available = Some(r.day) == self.claimable;
        }
        self.claimable
    }

    /// Claim `day`. Returns its reward, or 0 when `day` is not the
    /// claimable day for `today`.
    pub fn claim(&mut self, day: u32, today: NaiveDate) -> Coins {
        if self.evaluate(today) != Some(day) {
            log::debug!("daily: day {day} not claimable on {today}");
            return 0;
        }
        let consecutive = self
            .last_claim
            .is_some_and(|last| days_between(last, today) == 1);
        self.streak = if consecutive { self.streak + 1 } else { 1 };

        let idx = (day - 1) as usize;
        self.rewards[idx].claimed = true;
        let reward = self.rewards[idx].reward;

        if self.streak >= WEEK_DAYS {
            log::info!("daily: week completed");
            self.rewards.iter_mut().for_each(|r| r.claimed = false);
            self.streak = 0;
        }
        self.last_claim = Some(today);
        self.claimable = None;
        self.rewards.iter_mut().for_each(|r| r.available = false);
        self.persist();
        reward
    }

    fn persist(&self) {
        self.store.write_record(keys::DAILY_REWARDS, &self.rewards);
        self.store.write_int(keys::DAILY_STREAK, i64::from(self.streak));
        match self.last_claim {
            Some(day) => self
                .store
                .write_string(keys::DAILY_LAST_CLAIM, &day.format(DATE_FORMAT).to_string()),
            None => self.store.clear(keys::DAILY_LAST_CLAIM),
        }
    }
}
