//! Shared harness: an in-memory store, a seeded balance, a manual clock.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use reactor_core::{
    clock::ManualClock,
    config::EconomyConfig,
    engine::EconomyEngine,
    store::{keys, GameStore},
    types::Coins,
};
use std::rc::Rc;

pub const PROFILE: &str = "player-1";

pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, 17)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

pub fn fresh_store() -> Rc<GameStore> {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = GameStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    Rc::new(store)
}

/// Engine over a fresh profile whose ledger starts at `balance`.
pub fn engine_with_balance(balance: Coins) -> (EconomyEngine, ManualClock) {
    let store = fresh_store();
    store.ensure_profile(PROFILE, "test").expect("profile");
    store.set_int(PROFILE, keys::LEDGER_BALANCE, balance).expect("seed balance");
    let clock = ManualClock::new(t0());
    let engine = EconomyEngine::open(store, PROFILE, EconomyConfig::default_test(), Box::new(clock.clone()))
        .expect("engine opens");
    (engine, clock)
}

pub fn reopen(store: &Rc<GameStore>, clock: &ManualClock) -> EconomyEngine {
    EconomyEngine::open(
        Rc::clone(store),
        PROFILE,
        EconomyConfig::default_test(),
        Box::new(clock.clone()),
    )
    .expect("engine reopens")
}
