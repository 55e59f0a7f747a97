//! Save/load through the SQLite store, corrupt-data fallback, and the
//! recorded event log.

mod common;

use common::{fresh_store, reopen, t0, PROFILE};
use reactor_core::{
    clock::ManualClock,
    config::EconomyConfig,
    cosmetic_subsystem::SkinId,
    engine::EconomyEngine,
    store::{keys, GameStore},
    upgrade_subsystem::UpgradeKind,
};
use std::rc::Rc;

fn seeded(store: &Rc<GameStore>, balance: i64) {
    store.ensure_profile(PROFILE, "test").unwrap();
    store.set_int(PROFILE, keys::LEDGER_BALANCE, balance).unwrap();
}

#[test]
fn progress_survives_a_restart() {
    let store = fresh_store();
    seeded(&store, 200_000);
    let clock = ManualClock::new(t0());

    {
        let mut engine = reopen(&store, &clock);
        engine.upgrade(UpgradeKind::Click);
        engine.upgrade(UpgradeKind::Speed);
        engine.select_or_buy(SkinId::Green);
        engine.claim_daily_reward(1);
        engine.tap();
        engine.advance(3_000);
    }

    let engine = reopen(&store, &clock);
    assert_eq!(engine.upgrades().level(UpgradeKind::Click), 1);
    assert_eq!(engine.upgrades().level(UpgradeKind::Speed), 1);
    assert_eq!(engine.cosmetics().active(), SkinId::Green);
    assert!(engine.cosmetics().is_owned(SkinId::Blue));
    assert_eq!(engine.daily().streak(), 1);
    assert_eq!(engine.daily().claimable_day(), None);
    assert_eq!(engine.statistics().total_taps(), 1);
    assert_eq!(engine.statistics().play_time_secs(), 3);
    assert!(engine.achievements().get("first_steps").unwrap().completed);

    // 200 000 − 50 000 − 10 000 − 65 000 + 1 000 + 30 (tap) + 2 × 30 (accrual)
    assert_eq!(engine.balance(), 76_090);
    assert!(engine.accrual().is_active());
}

#[test]
fn corrupt_records_fall_back_to_defaults() {
    let store = fresh_store();
    seeded(&store, 1_234);
    for key in [keys::UPGRADE_LEVELS, keys::ACHIEVEMENTS, keys::STATS_COUNTERS, keys::DAILY_REWARDS] {
        store.set_blob(PROFILE, key, b"\xff not json").unwrap();
    }
    store.set_string(PROFILE, keys::COSMETICS_ACTIVE, "gold").unwrap();
    // Wrong value kind under a known key.
    store.set_string(PROFILE, keys::MINIGAME_UNLOCKED, "1,2,3").unwrap();

    let clock = ManualClock::new(t0());
    let mut engine = reopen(&store, &clock);
    assert_eq!(engine.balance(), 1_234);
    assert_eq!(engine.upgrades().total_levels(), 0);
    assert_eq!(engine.achievements().completed_count(), 0);
    assert_eq!(engine.statistics().total_coins_earned(), 0);
    assert_eq!(engine.daily().rewards().len(), 7);
    assert_eq!(engine.cosmetics().active(), SkinId::Blue);
    assert_eq!(engine.minigame().unlocked().len(), 1);

    // Still fully playable.
    assert_eq!(engine.tap(), 11);
}

#[test]
fn unknown_fields_in_saved_records_are_ignored() {
    let store = fresh_store();
    seeded(&store, 0);
    store
        .set_blob(
            PROFILE,
            keys::UPGRADE_LEVELS,
            br#"{ "click": 3, "speed": 99, "turbo": 4 }"#,
        )
        .unwrap();

    let clock = ManualClock::new(t0());
    let engine = reopen(&store, &clock);
    assert_eq!(engine.upgrades().level(UpgradeKind::Click), 3);
    assert_eq!(engine.upgrades().level(UpgradeKind::Tap), 0);
    assert_eq!(engine.upgrades().level(UpgradeKind::Speed), 25);
    assert!(engine.upgrades().is_maxed(UpgradeKind::Speed));
    assert_eq!(engine.upgrades().price(UpgradeKind::Speed), 0);
}

#[test]
fn profiles_are_isolated() {
    let store = fresh_store();
    let clock = ManualClock::new(t0());
    let mut alice =
        EconomyEngine::open(Rc::clone(&store), "alice", EconomyConfig::default_test(), Box::new(clock.clone()))
            .unwrap();
    alice.tap();
    let bob = EconomyEngine::open(Rc::clone(&store), "bob", EconomyConfig::default_test(), Box::new(clock))
        .unwrap();

    assert_eq!(alice.balance(), 11);
    assert_eq!(bob.balance(), 0);
    assert_eq!(store.profile_ids().unwrap(), vec!["alice".to_string(), "bob".to_string()]);
}

#[test]
fn dispatched_events_are_recorded_in_order() {
    let store = fresh_store();
    seeded(&store, 0);
    let clock = ManualClock::new(t0());
    let mut engine = reopen(&store, &clock);
    engine.tap();

    let log = engine.event_log().unwrap();
    let types: Vec<&str> = log.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "accrual_stopped",
            "tap_registered",
            "coins_credited",
            "statistics_updated",
            "statistics_updated",
        ]
    );
    assert!(log.windows(2).all(|w| w[0].seq < w[1].seq));
    assert_eq!(log[3].subsystem, "statistics");
    assert_eq!(store.event_count(PROFILE, "coins_credited").unwrap(), 1);
}

#[test]
fn event_seq_continues_across_sessions() {
    let store = fresh_store();
    seeded(&store, 0);
    let clock = ManualClock::new(t0());

    let first_session = {
        let mut engine = reopen(&store, &clock);
        engine.tap();
        engine.event_log().unwrap().len()
    };
    let mut engine = reopen(&store, &clock);
    engine.tap();

    let log = engine.event_log().unwrap();
    assert!(log.len() > first_session);
    assert!(log.windows(2).all(|w| w[0].seq < w[1].seq));
    assert_eq!(log.last().unwrap().seq, log.len() as u64);
    assert_eq!(store.last_event_seq(PROFILE).unwrap(), log.len() as u64);
}

#[test]
fn same_seed_same_session_same_log() {
    fn session() -> Vec<String> {
        let (mut engine, _clock) = common::engine_with_balance(0);
        engine.start_minigame(1);
        for i in 0..4 {
            engine.flip_card(i);
            engine.advance(900);
        }
        engine.advance(30_000);
        engine.confirm_minigame();
        engine.event_log().unwrap().into_iter().map(|e| e.payload).collect()
    }

    let a = session();
    let b = session();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}
