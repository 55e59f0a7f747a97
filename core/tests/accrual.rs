//! Passive accrual and play time under a hand-driven clock.

mod common;

use chrono::Duration;
use common::{engine_with_balance, t0};
use reactor_core::{
    command::{CommandOutcome, PlayerCommand},
    engine::MAX_ADVANCE_MILLIS,
    scheduler::TaskSlot,
    upgrade_subsystem::UpgradeKind,
};

#[test]
fn no_accrual_before_click_or_speed() {
    let (mut engine, _clock) = engine_with_balance(0);
    assert!(!engine.scheduler().is_scheduled(TaskSlot::Accrual));
    engine.advance(60_000);
    assert_eq!(engine.balance(), 0);
    assert_eq!(engine.statistics().play_time_secs(), 60);
}

#[test]
fn accrual_ticks_once_per_interval() {
    let (mut engine, _clock) = engine_with_balance(50_000);
    assert!(engine.upgrade(UpgradeKind::Click));
    assert_eq!(engine.balance(), 0);

    engine.advance(1_499);
    assert_eq!(engine.balance(), 0);
    engine.advance(1);
    assert_eq!(engine.balance(), 11);

    // Passive income is income, not taps.
    assert_eq!(engine.statistics().total_coins_earned(), 11);
    assert_eq!(engine.statistics().total_taps(), 0);
}

#[test]
fn a_late_pump_catches_up_every_missed_period() {
    let (mut engine, clock) = engine_with_balance(50_000);
    engine.upgrade(UpgradeKind::Click);
    clock.advance_millis(4_500);
    let fired = engine.pump();

    // Three accrual fires and four play-time fires.
    assert_eq!(fired, 7);
    assert_eq!(engine.balance(), 33);
    assert_eq!(engine.statistics().play_time_secs(), 4);
}

#[test]
fn speed_upgrade_restarts_from_purchase_time() {
    let (mut engine, clock) = engine_with_balance(60_000);
    engine.upgrade(UpgradeKind::Click);
    engine.advance(1_000);
    assert!(engine.upgrade(UpgradeKind::Speed));
    assert_eq!(engine.balance(), 0);

    let restarted_at = t0() + Duration::milliseconds(1_000);
    assert_eq!(
        engine.scheduler().next_due(TaskSlot::Accrual),
        Some(restarted_at + Duration::milliseconds(1_460))
    );

    // The old 1.5 s schedule is gone: nothing at t0 + 1.5 s.
    engine.advance(500);
    assert_eq!(engine.balance(), 0);
    clock.set(restarted_at + Duration::milliseconds(1_460));
    engine.pump();
    assert_eq!(engine.balance(), 11);
}

#[test]
fn suspend_earns_nothing_and_resume_does_not_back_fill() {
    let (mut engine, clock) = engine_with_balance(50_000);
    engine.upgrade(UpgradeKind::Click);

    engine.suspend();
    assert!(engine.is_suspended());
    assert!(!engine.scheduler().is_scheduled(TaskSlot::Accrual));
    assert!(!engine.scheduler().is_scheduled(TaskSlot::PlayTime));

    clock.advance(Duration::hours(1));
    engine.pump();
    engine.resume();
    assert_eq!(engine.balance(), 0);
    assert_eq!(engine.statistics().play_time_secs(), 0);

    engine.advance(1_500);
    assert_eq!(engine.balance(), 11);
    assert_eq!(engine.statistics().play_time_secs(), 1);
}

#[test]
fn suspend_and_resume_are_idempotent() {
    let (mut engine, _clock) = engine_with_balance(50_000);
    engine.upgrade(UpgradeKind::Click);
    engine.resume();
    assert!(!engine.is_suspended());

    engine.suspend();
    engine.suspend();
    engine.resume();
    engine.resume();
    assert_eq!(
        engine.scheduler().active_slots(),
        vec![TaskSlot::Accrual, TaskSlot::PlayTime]
    );
}

#[test]
fn accrual_uses_the_active_skin_power() {
    let (mut engine, _clock) = engine_with_balance(55_000);
    engine.upgrade(UpgradeKind::Click);
    engine.select_or_buy(reactor_core::cosmetic_subsystem::SkinId::Red);
    assert_eq!(engine.balance(), 0);
    engine.advance(1_500);
    assert_eq!(engine.balance(), 23);
}

#[test]
fn ten_idle_days_settle_in_full() {
    let (mut engine, _clock) = engine_with_balance(50_000);
    engine.upgrade(UpgradeKind::Click);

    let fired = engine.advance(10 * 86_400_000);

    // 1.5 s accrual and 1 s play time over 864 000 s.
    assert_eq!(fired, 576_000 + 864_000);
    assert_eq!(engine.balance(), 576_000 * 11);
    assert_eq!(engine.statistics().total_coins_earned(), 576_000 * 11);
    assert_eq!(engine.statistics().play_time_secs(), 864_000);
    // Eleven calendar days touched; a full day holds 57 600 accrual ticks.
    assert_eq!(engine.statistics().daily_progress().len(), 11);
    assert_eq!(engine.statistics().max_daily_earnings(), 57_600 * 11);
    assert!(engine.achievements().get("magnate").unwrap().completed);
    assert!(engine.achievements().get("dedicated_player").unwrap().completed);
    assert!(!engine.achievements().get("millionaire").unwrap().completed);
    assert_eq!(
        engine.scheduler().next_due(TaskSlot::Accrual),
        Some(engine.now() + Duration::milliseconds(1_500))
    );
}

#[test]
fn out_of_range_advance_is_refused() {
    let (mut engine, _clock) = engine_with_balance(50_000);
    engine.upgrade(UpgradeKind::Click);
    let start = engine.now();

    assert_eq!(engine.advance(-1_000), 0);
    assert_eq!(engine.advance(MAX_ADVANCE_MILLIS + 1), 0);
    assert_eq!(engine.advance(i64::MAX), 0);
    assert_eq!(
        engine.apply(&PlayerCommand::Advance { millis: i64::MAX }),
        CommandOutcome::Fired { tasks: 0 }
    );
    assert_eq!(engine.now(), start);
    assert_eq!(engine.balance(), 0);

    engine.advance(1_500);
    assert_eq!(engine.balance(), 11);
}
