//! Cosmetic coin skins: the fixed catalog, the ownership set, and the
//! active selection whose power multiplier scales every coin reward.
//!
//! Invariants: the default skin is always owned, and the active skin is
//! always a member of the ownership set.

use crate::{
    event::{DebitReason, EconomyEvent},
    ledger_subsystem::Ledger,
    store::{keys, ProfileStore},
    types::Coins,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinId {
    Blue,
    Red,
    Pink,
    Green,
    Purple,
    Black,
}

impl SkinId {
    pub const ALL: [SkinId; 6] = [
        SkinId::Blue,
        SkinId::Red,
        SkinId::Pink,
        SkinId::Green,
        SkinId::Purple,
        SkinId::Black,
    ];

    /// Owned from install, cannot be un-owned.
    pub const DEFAULT: SkinId = SkinId::Blue;

    pub fn price(self) -> Coins {
        match self {
            Self::Blue => 0,
            Self::Red => 5_000,
            Self::Pink => 10_000_000,
            Self::Green => 65_000,
            Self::Purple => 150_000,
            Self::Black => 90_000_000,
        }
    }

    pub fn power(self) -> f64 {
        match self {
            Self::Blue => 1.1,
            Self::Red => 2.3,
            Self::Pink => 6.5,
            Self::Green => 3.0,
            Self::Purple => 5.0,
            Self::Black => 10.0,
        }
    }

    /// Image asset reference for the rendering layer.
    pub fn image(self) -> &'static str {
        match self {
            Self::Blue => "blue_coin",
            Self::Red => "red_coin",
            Self::Pink => "pink_coin",
            Self::Green => "green_coin",
            Self::Purple => "purple_coin",
            Self::Black => "black_coin",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Pink => "pink",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Black => "black",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

/// What `select_or_buy` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectOutcome {
    /// Owned skin switched to active, no cost.
    Activated,
    /// Owned and already active; nothing changed.
    AlreadyActive,
    /// Bought and activated.
    Purchased,
    /// Not owned and not affordable; nothing changed.
    Rejected,
}

pub struct CosmeticSubsystem {
    owned: BTreeSet<SkinId>,
    active: SkinId,
    store: ProfileStore,
}

impl CosmeticSubsystem {
    pub fn load(store: ProfileStore) -> Self {
        let saved = store.read_string_array(keys::COSMETICS_OWNED);
        let mut owned: BTreeSet<SkinId> = saved
            .iter()
            .flatten()
            .filter_map(|raw| SkinId::parse(raw))
            .collect();
        let default_missing = owned.insert(SkinId::DEFAULT);

        let active = store
            .read_string(keys::COSMETICS_ACTIVE)
            .and_then(|raw| SkinId::parse(&raw))
            .filter(|skin| owned.contains(skin))
            .unwrap_or(SkinId::DEFAULT);

        let cosmetics = Self { owned, active, store };
        if default_missing {
            cosmetics.persist_owned();
        }
        cosmetics
    }

    pub fn active(&self) -> SkinId {
        self.active
    }

    pub fn active_power(&self) -> f64 {
        self.active.power()
    }

    pub fn is_owned(&self, skin: SkinId) -> bool {
        self.owned.contains(&skin)
    }

    pub fn owned(&self) -> impl Iterator<Item = SkinId> + '_ {
        self.owned.iter().copied()
    }

    pub fn owned_count(&self) -> usize {
        self.owned.len()
    }

    /// Activate an owned skin, or try to buy an unowned one.
    pub fn select_or_buy(&mut self, skin: SkinId, ledger: &mut Ledger) -> (SelectOutcome, Vec<EconomyEvent>) {
        if self.owned.contains(&skin) {
            if self.active == skin {
                return (SelectOutcome::AlreadyActive, vec![]);
            }
            self.active = skin;
            self.persist_active();
            log::debug!("cosmetics: switched to {}", skin.as_str());
            return (SelectOutcome::Activated, vec![self.activated_event()]);
        }

        let Some(debited) = ledger.debit(skin.price(), DebitReason::Skin) else {
            log::debug!(
                "cosmetics: cannot afford {} ({} > {})",
                skin.as_str(),
                skin.price(),
                ledger.balance()
            );
            return (SelectOutcome::Rejected, vec![]);
        };

        self.owned.insert(skin);
        self.active = skin;
        self.persist_owned();
        self.persist_active();
        log::info!("cosmetics: bought {} for {}", skin.as_str(), skin.price());

        let events = vec![
            debited,
            EconomyEvent::SkinPurchased {
                skin,
                price: skin.price(),
                owned_count: self.owned.len(),
            },
            self.activated_event(),
        ];
        (SelectOutcome::Purchased, events)
    }

    fn activated_event(&self) -> EconomyEvent {
        EconomyEvent::SkinActivated {
            skin: self.active,
            power: self.active.power(),
        }
    }

    fn persist_owned(&self) {
        let raw: Vec<String> = self.owned.iter().map(|s| s.as_str().to_string()).collect();
        self.store.write_string_array(keys::COSMETICS_OWNED, &raw);
    }

    fn persist_active(&self) {
        self.store.write_string(keys::COSMETICS_ACTIVE, self.active.as_str());
    }
}
