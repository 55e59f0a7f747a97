//! Currency ledger: the single source of truth for the spendable balance.
//!
//! Every mutation persists before returning and reports itself as a
//! `CoinsCredited` / `CoinsDebited` event carrying the new balance.
//! The balance never drops below zero: purchases go through the guarded
//! `debit`, and penalties saturate at zero.

use crate::{
    event::{CoinSource, DebitReason, EconomyEvent},
    store::{keys, ProfileStore},
    types::Coins,
};

pub struct Ledger {
    balance: Coins,
    store: ProfileStore,
}

impl Ledger {
    pub fn load(store: ProfileStore) -> Self {
        let saved = store.read_int(keys::LEDGER_BALANCE).unwrap_or(0);
        if saved < 0 {
            log::warn!("ledger: persisted balance {saved} below zero, clamping");
        }
        Self {
            balance: saved.max(0),
            store,
        }
    }

    pub fn balance(&self) -> Coins {
        self.balance
    }

    pub fn can_afford(&self, cost: Coins) -> bool {
        self.balance >= cost
    }

    /// Apply a signed delta. Negative amounts are penalties; the event
    /// carries the delta actually applied after saturation.
    pub fn credit(&mut self, amount: Coins, source: CoinSource) -> EconomyEvent {
        let before = self.balance;
        self.balance = before.saturating_add(amount).max(0);
        self.persist();

        let applied = self.balance - before;
        if applied != amount {
            log::debug!("ledger: {source:?} {amount} saturated to {applied}");
        }
        EconomyEvent::CoinsCredited {
            amount: applied,
            source,
            balance: self.balance,
        }
    }

    /// Spend `cost` if affordable. Returns None (and changes nothing) otherwise.
    pub fn debit(&mut self, cost: Coins, reason: DebitReason) -> Option<EconomyEvent> {
        if cost < 0 || !self.can_afford(cost) {
            return None;
        }
        self.balance -= cost;
        self.persist();
        Some(EconomyEvent::CoinsDebited {
            amount: cost,
            reason,
            balance: self.balance,
        })
    }

    fn persist(&self) {
        self.store.write_int(keys::LEDGER_BALANCE, self.balance);
    }
}
