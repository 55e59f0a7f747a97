//! Income, upgrades, skins and achievements driven through the engine.

mod common;

use common::engine_with_balance;
use reactor_core::{
    cosmetic_subsystem::{SelectOutcome, SkinId},
    upgrade_subsystem::UpgradeKind,
};

#[test]
fn first_tap_with_default_skin_pays_eleven() {
    let (mut engine, _clock) = engine_with_balance(0);
    assert_eq!(engine.tap(), 11);
    assert_eq!(engine.balance(), 11);
    assert_eq!(engine.statistics().total_taps(), 1);
    assert_eq!(engine.statistics().total_coins_earned(), 11);
    assert_eq!(engine.statistics().today_coins(engine.today()), 11);
}

#[test]
fn click_upgrade_debits_and_reprices() {
    let (mut engine, _clock) = engine_with_balance(50_000);
    assert_eq!(engine.upgrades().price(UpgradeKind::Click), 50_000);

    assert!(engine.upgrade(UpgradeKind::Click));
    assert_eq!(engine.balance(), 0);
    assert_eq!(engine.upgrades().level(UpgradeKind::Click), 1);
    assert_eq!(engine.upgrades().price(UpgradeKind::Click), 72_500);

    // Debits never reduce gross income.
    assert_eq!(engine.statistics().total_coins_earned(), 0);
}

#[test]
fn unaffordable_upgrade_is_a_silent_no_op() {
    let (mut engine, _clock) = engine_with_balance(9_999);
    assert!(!engine.upgrade(UpgradeKind::Speed));
    assert_eq!(engine.balance(), 9_999);
    assert_eq!(engine.upgrades().level(UpgradeKind::Speed), 0);
    assert!(!engine.accrual().is_active());
}

#[test]
fn prices_never_decrease_and_hit_zero_at_cap() {
    let (engine, _clock) = engine_with_balance(0);
    let max = engine.upgrades().max_level();
    for kind in UpgradeKind::ALL {
        let prices: Vec<_> = (0..=max)
            .map(|lvl| reactor_core::upgrade_subsystem::price_at(kind, lvl, max))
            .collect();
        assert!(prices[..max as usize].windows(2).all(|w| w[0] <= w[1]), "{kind:?} not monotonic");
        assert!(prices[..max as usize].iter().all(|&p| p > 0));
        assert_eq!(prices[max as usize], 0);
    }
}

#[test]
fn tap_upgrade_raises_the_tap_reward() {
    let (mut engine, _clock) = engine_with_balance(30_000);
    assert!(engine.upgrade(UpgradeKind::Tap));
    assert_eq!(engine.tap(), 14);
    // Tap alone never starts passive income.
    assert!(!engine.accrual().is_active());
}

#[test]
fn skin_purchase_and_selection() {
    let (mut engine, _clock) = engine_with_balance(5_000);
    assert_eq!(engine.select_or_buy(SkinId::Black), SelectOutcome::Rejected);
    assert_eq!(engine.balance(), 5_000);

    assert_eq!(engine.select_or_buy(SkinId::Red), SelectOutcome::Purchased);
    assert_eq!(engine.balance(), 0);
    assert_eq!(engine.cosmetics().active(), SkinId::Red);
    assert_eq!(engine.tap(), 23);

    assert_eq!(engine.select_or_buy(SkinId::Blue), SelectOutcome::Activated);
    assert_eq!(engine.select_or_buy(SkinId::Blue), SelectOutcome::AlreadyActive);
    assert_eq!(engine.select_or_buy(SkinId::Red), SelectOutcome::Activated);
    assert_eq!(engine.balance(), 23);
    assert_eq!(engine.cosmetics().owned_count(), 2);
    assert_eq!(engine.achievements().get("collector").unwrap().current, 2);
}

#[test]
fn earning_a_thousand_completes_first_steps_and_claim_credits() {
    let (mut engine, _clock) = engine_with_balance(0);
    for _ in 0..91 {
        engine.tap();
    }
    assert_eq!(engine.statistics().total_coins_earned(), 1_001);
    let first = engine.achievements().get("first_steps").unwrap();
    assert!(first.completed && !first.claimed);
    assert_eq!(engine.achievements().total_rewards_available(), 500);

    assert_eq!(engine.claim_achievement("first_steps"), 500);
    assert_eq!(engine.balance(), 1_501);
    assert_eq!(engine.claim_achievement("first_steps"), 0);
    assert_eq!(engine.claim_achievement("magnate"), 0);
    assert_eq!(engine.balance(), 1_501);

    // Reward credits count as income too.
    assert_eq!(engine.statistics().total_coins_earned(), 1_501);
}

#[test]
fn snapshot_reflects_engine_state() {
    let (mut engine, _clock) = engine_with_balance(50_000);
    engine.upgrade(UpgradeKind::Click);
    engine.tap();

    let snap = engine.snapshot();
    assert_eq!(snap.balance, 11);
    assert_eq!(snap.skins.active, SkinId::Blue);
    assert!(snap.accrual.active);
    assert_eq!(snap.accrual.interval_ms, 1_500);
    assert_eq!(snap.upgrades[0].level, 1);
    assert_eq!(snap.upgrades[0].price, 72_500);
    assert!(!snap.upgrades[0].affordable);
    assert_eq!(snap.achievements.len(), 8);
    assert_eq!(snap.daily.claimable_day, Some(1));

    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["statistics"]["total_taps"], 1);
    assert_eq!(json["minigame"]["phase"], "selecting");
}
