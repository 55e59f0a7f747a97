//! Achievement engine: threshold progress over economy counters.
//!
//! RULE: progress is monotonic. An update keeps the highest value seen,
//! so a lower reading (after a penalty, say) never un-completes anything.
//! A reward is handed out once, only after completion; the engine credits it.
//!
//! Execution: last in dispatch order.
//! Depends on: StatisticsUpdated, SkinPurchased, UpgradePurchased.

use crate::{
    event::EconomyEvent,
    store::{keys, ProfileStore},
    subsystem::{DispatchContext, EconomySubsystem},
    types::{AchievementId, Coins},
    upgrade_subsystem::UpgradeKind,
};
use serde::{Deserialize, Serialize};

/// Which counter feeds an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalCoins,
    TotalTaps,
    OwnedSkins,
    UpgradeLevels,
    PlayTimeSecs,
    SpeedLevel,
}

#[derive(Debug)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub target: i64,
    pub reward: Coins,
    pub metric: Metric,
}

pub static CATALOG: [AchievementDef; 8] = [
    AchievementDef {
        id: "first_steps",
        title: "First Steps",
        description: "Earn 1,000 coins",
        target: 1_000,
        reward: 500,
        metric: Metric::TotalCoins,
    },
    AchievementDef {
        id: "magnate",
        title: "Magnate",
        description: "Earn 1,000,000 coins",
        target: 1_000_000,
        reward: 50_000,
        metric: Metric::TotalCoins,
    },
    AchievementDef {
        id: "clicker_master",
        title: "Clicker Master",
        description: "Tap the coin 10,000 times",
        target: 10_000,
        reward: 5_000,
        metric: Metric::TotalTaps,
    },
    AchievementDef {
        id: "collector",
        title: "Collector",
        description: "Own every coin skin",
        target: 6,
        reward: 100_000,
        metric: Metric::OwnedSkins,
    },
    AchievementDef {
        id: "max_upgrade",
        title: "Max Upgrade",
        description: "Max out every upgrade",
        target: 75,
        reward: 200_000,
        metric: Metric::UpgradeLevels,
    },
    AchievementDef {
        id: "dedicated_player",
        title: "Dedicated Player",
        description: "Play for 10 hours",
        target: 36_000,
        reward: 25_000,
        metric: Metric::PlayTimeSecs,
    },
    AchievementDef {
        id: "speed_demon",
        title: "Speed Demon",
        description: "Max out the speed upgrade",
        target: 25,
        reward: 30_000,
        metric: Metric::SpeedLevel,
    },
    AchievementDef {
        id: "millionaire",
        title: "Millionaire",
        description: "Earn 10,000,000 coins",
        target: 10_000_000,
        reward: 500_000,
        metric: Metric::TotalCoins,
    },
];

/// The persisted slice of one achievement. Catalog data is never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ProgressRecord {
    id: String,
    current: i64,
    completed: bool,
    claimed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    #[serde(skip)]
    def: &'static AchievementDef,
    pub id: AchievementId,
    pub current: i64,
    pub completed: bool,
    pub claimed: bool,
}

impl Achievement {
    fn fresh(def: &'static AchievementDef) -> Self {
        Self { def, id: def.id, current: 0, completed: false, claimed: false }
    }

    pub fn def(&self) -> &'static AchievementDef {
        self.def
    }

    pub fn target(&self) -> i64 {
        self.def.target
    }

    pub fn reward(&self) -> Coins {
        self.def.reward
    }

    pub fn progress(&self) -> f64 {
        (self.current as f64 / self.def.target as f64).clamp(0.0, 1.0)
    }
}

pub struct AchievementSubsystem {
    list: Vec<Achievement>,
    store: ProfileStore,
}

impl AchievementSubsystem {
    /// Catalog order, with persisted progress merged in by id.
    /// Unknown persisted ids are dropped.
    pub fn load(store: ProfileStore) -> Self {
        let saved = store
            .read_record::<Vec<ProgressRecord>>(keys::ACHIEVEMENTS)
            .unwrap_or_default();
        let list = CATALOG
            .iter()
            .map(|def| {
                let mut a = Achievement::fresh(def);
                if let Some(rec) = saved.iter().find(|r| r.id == def.id) {
                    a.current = rec.current.max(0);
                    a.completed = a.current >= def.target;
                    a.claimed = rec.claimed && a.completed;
                }
                a
            })
            .collect();
        Self { list, store }
    }

    pub fn all(&self) -> &[Achievement] {
        &self.list
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.list.iter().find(|a| a.id == id)
    }

    /// 0.0 for an unknown id.
    pub fn progress(&self, id: &str) -> f64 {
        self.get(id).map(Achievement::progress).unwrap_or(0.0)
    }

    pub fn completed_count(&self) -> usize {
        self.list.iter().filter(|a| a.completed).count()
    }

    /// Rewards completed but not yet claimed.
    pub fn total_rewards_available(&self) -> Coins {
        self.list
            .iter()
            .filter(|a| a.completed && !a.claimed)
            .map(Achievement::reward)
            .sum()
    }

    /// Raise the progress of one achievement. Returns AchievementCompleted
    /// when this update crossed the target.
    pub fn update(&mut self, id: &str, value: i64) -> Option<EconomyEvent> {
        let event = self.apply(id, value);
        self.persist();
        event
    }

    /// Returns the reward, or 0 when the achievement is unknown,
    /// incomplete or already claimed.
    pub fn claim(&mut self, id: &str) -> Coins {
        let Some(a) = self.list.iter_mut().find(|a| a.id == id) else {
            return 0;
        };
        if !a.completed || a.claimed {
            log::debug!("achievements: claim of {id} rejected");
            return 0;
        }
        a.claimed = true;
        let reward = a.reward();
        self.persist();
        log::info!("achievements: {id} claimed for {reward}");
        reward
    }

    fn apply(&mut self, id: &str, value: i64) -> Option<EconomyEvent> {
        let a = self.list.iter_mut().find(|a| a.id == id)?;
        a.current = a.current.max(value);
        if a.completed || a.current < a.target() {
            return None;
        }
        a.completed = true;
        log::info!("achievements: {id} completed");
        Some(EconomyEvent::AchievementCompleted { id: id.to_string() })
    }

    /// Feed one counter to every achievement it drives.
    fn feed(&mut self, metric: Metric, value: i64) -> Vec<EconomyEvent> {
        let ids: Vec<AchievementId> = CATALOG
            .iter()
            .filter(|d| d.metric == metric)
            .map(|d| d.id)
            .collect();
        ids.into_iter().filter_map(|id| self.apply(id, value)).collect()
    }

    fn persist(&self) {
        let records: Vec<ProgressRecord> = self
            .list
            .iter()
            .map(|a| ProgressRecord {
                id: a.id.to_string(),
                current: a.current,
                completed: a.completed,
                claimed: a.claimed,
            })
            .collect();
        self.store.write_record(keys::ACHIEVEMENTS, &records);
    }
}

impl EconomySubsystem for AchievementSubsystem {
    fn name(&self) -> &'static str {
        "achievements"
    }

    fn handle(&mut self, event: &EconomyEvent, _ctx: &mut DispatchContext<'_>) -> Vec<EconomyEvent> {
        let out = match event {
            EconomyEvent::StatisticsUpdated { total_coins, total_taps, play_time_secs } => {
                let mut out = self.feed(Metric::TotalCoins, *total_coins);
                out.extend(self.feed(Metric::TotalTaps, saturating_i64(*total_taps)));
                out.extend(self.feed(Metric::PlayTimeSecs, saturating_i64(*play_time_secs)));
                out
            }
            EconomyEvent::SkinPurchased { owned_count, .. } => {
                self.feed(Metric::OwnedSkins, i64::try_from(*owned_count).unwrap_or(i64::MAX))
            }
            EconomyEvent::UpgradePurchased { kind, level, total_levels, .. } => {
                let mut out = self.feed(Metric::UpgradeLevels, i64::from(*total_levels));
                if *kind == UpgradeKind::Speed {
                    out.extend(self.feed(Metric::SpeedLevel, i64::from(*level)));
                }
                out
            }
            _ => return vec![],
        };
        self.persist();
        out
    }
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
