//! Permanent upgrades with geometric cost curves.
//!
//! Each kind levels independently from 0 to the configured cap, one
//! level per successful purchase. The price of a maxed kind is 0 and
//! purchase is disabled.

use crate::{
    event::{DebitReason, EconomyEvent},
    ledger_subsystem::Ledger,
    store::{keys, ProfileStore},
    types::Coins,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    /// Multiplies passive accrual per tick.
    Click,
    /// Raises the manual tap reward.
    Tap,
    /// Shortens the accrual interval.
    Speed,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 3] = [UpgradeKind::Click, UpgradeKind::Tap, UpgradeKind::Speed];

    pub fn base_price(self) -> Coins {
        match self {
            Self::Click => 50_000,
            Self::Tap => 30_000,
            Self::Speed => 10_000,
        }
    }

    pub fn growth_rate(self) -> f64 {
        match self {
            Self::Click => 1.45,
            Self::Tap => 1.35,
            Self::Speed => 1.25,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Tap => "tap",
            Self::Speed => "speed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == raw)
    }

    /// Affects the accrual schedule when its level changes.
    pub fn drives_accrual(self) -> bool {
        matches!(self, Self::Click | Self::Speed)
    }

    fn ordinal(self) -> usize {
        self as usize
    }
}

/// `floor(base × rate^level)`, or 0 once `level` reaches `max_level`.
pub fn price_at(kind: UpgradeKind, level: u32, max_level: u32) -> Coins {
    if level >= max_level {
        return 0;
    }
    let exponent = i32::try_from(level).unwrap_or(i32::MAX);
    let raw = kind.base_price() as f64 * kind.growth_rate().powi(exponent);
    // Absorb representation error so exact products (50 000 × 1.45) don't floor one short.
    (raw + 1e-6).floor() as Coins
}

/// Level per kind, indexed by the kind's ordinal. Missing entries are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeLevels([u32; 3]);

impl UpgradeLevels {
    pub fn get(&self, kind: UpgradeKind) -> u32 {
        self.0[kind.ordinal()]
    }

    fn set(&mut self, kind: UpgradeKind, level: u32) {
        self.0[kind.ordinal()] = level;
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    fn to_record(self) -> BTreeMap<String, u32> {
        UpgradeKind::ALL
            .into_iter()
            .map(|k| (k.as_str().to_string(), self.get(k)))
            .collect()
    }

    fn from_record(record: &BTreeMap<String, u32>, max_level: u32) -> Self {
        let mut levels = Self::default();
        for (raw, level) in record {
            match UpgradeKind::parse(raw) {
                Some(kind) => levels.set(kind, (*level).min(max_level)),
                None => log::warn!("upgrades: ignoring unknown kind '{raw}'"),
            }
        }
        levels
    }
}

pub struct UpgradeSubsystem {
    levels: UpgradeLevels,
    max_level: u32,
    store: ProfileStore,
}

impl UpgradeSubsystem {
    pub fn load(store: ProfileStore, max_level: u32) -> Self {
        let levels = store
            .read_record::<BTreeMap<String, u32>>(keys::UPGRADE_LEVELS)
            .map(|record| UpgradeLevels::from_record(&record, max_level))
            .unwrap_or_default();
        Self { levels, max_level, store }
    }

    pub fn levels(&self) -> UpgradeLevels {
        self.levels
    }

    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels.get(kind)
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn total_levels(&self) -> u32 {
        self.levels.total()
    }

    pub fn is_maxed(&self, kind: UpgradeKind) -> bool {
        self.level(kind) >= self.max_level
    }

    pub fn price(&self, kind: UpgradeKind) -> Coins {
        price_at(kind, self.level(kind), self.max_level)
    }

    /// Buy one level. Returns no events (and changes nothing) when the kind
    /// is maxed or the ledger cannot cover the price.
    pub fn purchase(&mut self, kind: UpgradeKind, ledger: &mut Ledger) -> Vec<EconomyEvent> {
        if self.is_maxed(kind) {
            log::debug!("upgrades: {} already maxed", kind.as_str());
            return vec![];
        }
        let price = self.price(kind);
        let Some(debited) = ledger.debit(price, DebitReason::Upgrade) else {
            log::debug!("upgrades: cannot afford {} ({price})", kind.as_str());
            return vec![];
        };

        let level = self.level(kind) + 1;
        self.levels.set(kind, level);
        self.store.write_record(keys::UPGRADE_LEVELS, &self.levels.to_record());
        log::info!("upgrades: {} -> level {level} for {price}", kind.as_str());

        vec![
            debited,
            EconomyEvent::UpgradePurchased {
                kind,
                level,
                price,
                total_levels: self.levels.total(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event::CoinSource, store::GameStore};
    use std::rc::Rc;

    fn handle() -> ProfileStore {
        let store = GameStore::in_memory().unwrap();
        store.migrate().unwrap();
        store.ensure_profile("p", "test").unwrap();
        ProfileStore::new(Rc::new(store), "p".into())
    }

    #[test]
    fn price_curve_is_monotonic_and_zero_only_at_cap() {
        for kind in UpgradeKind::ALL {
            let mut previous = 0;
            for level in 0..25 {
                let price = price_at(kind, level, 25);
                assert!(price > 0, "{kind:?} level {level} priced 0");
                assert!(price >= previous, "{kind:?} price fell at level {level}");
                previous = price;
            }
            assert_eq!(price_at(kind, 25, 25), 0);
        }
    }

    #[test]
    fn known_prices() {
        assert_eq!(price_at(UpgradeKind::Click, 0, 25), 50_000);
        assert_eq!(price_at(UpgradeKind::Click, 1, 25), 72_500);
        assert_eq!(price_at(UpgradeKind::Tap, 1, 25), 40_500);
        assert_eq!(price_at(UpgradeKind::Speed, 2, 25), 15_625);
    }

    #[test]
    fn purchase_debits_exact_price_and_increments_once() {
        let h = handle();
        let mut ledger = Ledger::load(h.clone());
        let mut upgrades = UpgradeSubsystem::load(h.clone(), 25);
        ledger.credit(60_000, CoinSource::Tap);

        let events = upgrades.purchase(UpgradeKind::Click, &mut ledger);
        assert_eq!(events.len(), 2);
        assert_eq!(ledger.balance(), 10_000);
        assert_eq!(upgrades.level(UpgradeKind::Click), 1);
        assert_eq!(upgrades.price(UpgradeKind::Click), 72_500);

        // Second attempt is unaffordable.
        assert!(upgrades.purchase(UpgradeKind::Click, &mut ledger).is_empty());
        assert_eq!(upgrades.level(UpgradeKind::Click), 1);
        assert_eq!(ledger.balance(), 10_000);

        let reloaded = UpgradeSubsystem::load(h, 25);
        assert_eq!(reloaded.level(UpgradeKind::Click), 1);
        assert_eq!(reloaded.level(UpgradeKind::Speed), 0);
    }

    #[test]
    fn maxed_kind_cannot_be_bought() {
        let h = handle();
        let mut rec = BTreeMap::new();
        rec.insert("speed".to_string(), 99u32);
        rec.insert("warp".to_string(), 3u32);
        h.write_record(keys::UPGRADE_LEVELS, &rec);

        let mut ledger = Ledger::load(h.clone());
        ledger.credit(1_000_000_000, CoinSource::Tap);
        let mut upgrades = UpgradeSubsystem::load(h, 25);

        assert_eq!(upgrades.level(UpgradeKind::Speed), 25);
        assert!(upgrades.is_maxed(UpgradeKind::Speed));
        assert_eq!(upgrades.price(UpgradeKind::Speed), 0);
        assert!(upgrades.purchase(UpgradeKind::Speed, &mut ledger).is_empty());
        assert_eq!(ledger.balance(), 1_000_000_000);
    }
}
