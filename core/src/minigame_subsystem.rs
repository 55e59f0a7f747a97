//! Matching mini-game: a timed pair-matching puzzle.
//!
//! Round lifecycle:
//!   Selecting → start(level) → Playing → Won | Lost → confirm() → Selecting
//!
//! RULE: the unlocked set only grows. Level 1 is always unlocked.
//! Card layout comes from the mini-game RNG stream, so a given seed and
//! round order always deal the same boards.
//!
//! Timers live in the scheduler: Countdown ticks once per second while a
//! round is undecided, FlipBack fires once after a mismatch.
//!
//! Not an event reactor: the engine drives it and credits confirm().

use crate::{
    config::MiniGameConfig,
    event::EconomyEvent,
    rng::{RngSlot, SubsystemRng},
    scheduler::{Scheduler, TaskSlot},
    store::{keys, ProfileStore},
    types::Coins,
};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiniGameLevel {
    pub number: u32,
    pub rows: u32,
    pub columns: u32,
    pub time_limit_secs: u32,
    pub unlocked: bool,
}

impl MiniGameLevel {
    pub fn total_cards(&self) -> usize {
        (self.rows * self.columns) as usize
    }
}

/// (rows, columns) for a level number.
pub fn grid_size(level: u32) -> (u32, u32) {
    match level {
        4..=6 => (3, 3),
        7..=10 => (4, 3),
        _ => (2, 2),
    }
}

pub fn time_limit_secs(level: u32) -> u32 {
    30u32.saturating_sub(2 * level.saturating_sub(1)).max(15)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: usize,
    pub kind: u32,
    pub face_up: bool,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Selecting,
    Playing,
    Won,
    Lost,
}

pub struct MiniGameSubsystem {
    config: MiniGameConfig,
    rng: SubsystemRng,
    unlocked: BTreeSet<u32>,
    level: Option<u32>,
    phase: Phase,
    cards: Vec<Card>,
    /// Face-up, unmatched cards awaiting a match check or flip-back.
    pending: Vec<usize>,
    time_remaining: u32,
    store: ProfileStore,
}

impl MiniGameSubsystem {
    pub fn load(store: ProfileStore, config: MiniGameConfig, master_seed: u64) -> Self {
        let mut unlocked: BTreeSet<u32> = store
            .read_int_array(keys::MINIGAME_UNLOCKED)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|n| u32::try_from(n).ok())
            .filter(|n| (1..=config.level_count).contains(n))
            .collect();
        let missing_first = unlocked.insert(1);

        let game = Self {
            rng: SubsystemRng::new(master_seed, RngSlot::MiniGame),
            config,
            unlocked,
            level: None,
            phase: Phase::Selecting,
            cards: Vec::new(),
            pending: Vec::new(),
            time_remaining: 0,
            store,
        };
        if missing_first {
            game.persist_unlocked();
        }
        game
    }

    // ── Read accessors ─────────────────────────────────────────

    pub fn levels(&self) -> Vec<MiniGameLevel> {
        (1..=self.config.level_count)
            .map(|number| {
                let (rows, columns) = grid_size(number);
                MiniGameLevel {
                    number,
                    rows,
                    columns,
                    time_limit_secs: time_limit_secs(number),
                    unlocked: self.unlocked.contains(&number),
                }
            })
            .collect()
    }

    pub fn unlocked(&self) -> &BTreeSet<u32> {
        &self.unlocked
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        self.unlocked.contains(&level)
    }

    pub fn current_level(&self) -> Option<u32> {
        self.level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn is_won(&self) -> bool {
        self.phase == Phase::Won
    }

    pub fn is_lost(&self) -> bool {
        self.phase == Phase::Lost
    }

    pub fn reward_for(&self, level: u32) -> Coins {
        self.config.reward_per_level * Coins::from(level)
    }

    // ── Round control ──────────────────────────────────────────

    /// Start a round on an unlocked level, replacing any round in progress.
    pub fn start(&mut self, level: u32, scheduler: &mut Scheduler, now: NaiveDateTime) -> Option<EconomyEvent> {
        if !self.is_unlocked(level) || level > self.config.level_count {
            log::debug!("minigame: level {level} is locked");
            return None;
        }
        self.reset(scheduler);
        let (rows, columns) = grid_size(level);
        self.cards = self
            .deal((rows * columns) as usize)
            .into_iter()
            .enumerate()
            .map(|(id, kind)| Card { id, kind, face_up: false, matched: false })
            .collect();
        self.level = Some(level);
        self.phase = Phase::Playing;
        self.time_remaining = time_limit_secs(level);
        self.start_countdown(scheduler, now);
        log::debug!("minigame: level {level} started with {} cards", self.cards.len());
        Some(EconomyEvent::MiniGameStarted { level })
    }

    /// Pair types 1..=min(types, pairs) twice each, padded with random
    /// pairs while short of `total`, then shuffled. An odd total overshoots
    /// by one card.
    fn deal(&mut self, total: usize) -> Vec<u32> {
        let types = self.config.card_types;
        let pairs = u32::try_from(total / 2).unwrap_or(u32::MAX);
        let mut deck: Vec<u32> = (1..=types.min(pairs)).flat_map(|t| [t, t]).collect();
        while deck.len() < total {
            let t = self.rng.range_inclusive(1, types);
            deck.extend([t, t]);
        }
        self.rng.shuffle(&mut deck);
        deck
    }

    /// Turn one card face up. A second face-up card triggers the match
    /// check. Returns MiniGameWon when this flip completed the board.
    pub fn flip(&mut self, index: usize, scheduler: &mut Scheduler, now: NaiveDateTime) -> Option<EconomyEvent> {
        let flippable = self.phase == Phase::Playing
            && self.pending.len() < 2
            && self.cards.get(index).is_some_and(|c| !c.matched && !c.face_up);
        if !flippable {
            return None;
        }
        self.cards[index].face_up = true;
        self.pending.push(index);
        if self.pending.len() == 2 {
            return self.check_match(scheduler, now);
        }
        None
    }

    fn check_match(&mut self, scheduler: &mut Scheduler, now: NaiveDateTime) -> Option<EconomyEvent> {
        let (a, b) = (self.pending[0], self.pending[1]);
        if self.cards[a].kind != self.cards[b].kind {
            let delay = Duration::milliseconds(self.config.flip_back_delay_ms);
            scheduler.schedule_once(TaskSlot::FlipBack, delay, now);
            return None;
        }
        self.cards[a].matched = true;
        self.cards[b].matched = true;
        self.pending.clear();
        if self.cards.iter().all(|c| c.matched) {
            return self.win(scheduler);
        }
        None
    }

    /// FlipBack fired: the mismatched pair turns face down.
    pub fn flip_back(&mut self) {
        for idx in self.pending.drain(..) {
            if let Some(card) = self.cards.get_mut(idx) {
                if !card.matched {
                    card.face_up = false;
                }
            }
        }
    }

    /// Countdown fired. Returns MiniGameLost when time ran out.
    pub fn countdown_tick(&mut self, scheduler: &mut Scheduler) -> Option<EconomyEvent> {
        if self.phase != Phase::Playing {
            scheduler.cancel(TaskSlot::Countdown);
            return None;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return None;
        }
        scheduler.cancel(TaskSlot::Countdown);
        self.phase = Phase::Lost;
        let level = self.level.unwrap_or(1);
        log::debug!("minigame: level {level} lost on time");
        Some(EconomyEvent::MiniGameLost { level })
    }

    fn win(&mut self, scheduler: &mut Scheduler) -> Option<EconomyEvent> {
        scheduler.cancel(TaskSlot::Countdown);
        scheduler.cancel(TaskSlot::FlipBack);
        self.phase = Phase::Won;
        let level = self.level.unwrap_or(1);
        let next = level + 1;
        if next <= self.config.level_count && self.unlocked.insert(next) {
            log::info!("minigame: level {next} unlocked");
            self.persist_unlocked();
        }
        Some(EconomyEvent::MiniGameWon { level })
    }

    /// Settle a decided round. Returns the signed amount to credit: the
    /// level reward after a win, minus the penalty after a loss, 0 otherwise.
    pub fn confirm(&mut self, scheduler: &mut Scheduler) -> Coins {
        let level = self.level.unwrap_or(1);
        let amount = match self.phase {
            Phase::Won => self.reward_for(level),
            Phase::Lost => -self.config.loss_penalty,
            Phase::Selecting | Phase::Playing => return 0,
        };
        self.reset(scheduler);
        amount
    }

    /// Abandon the current round without reward or penalty.
    pub fn back_to_level_selection(&mut self, scheduler: &mut Scheduler) {
        self.reset(scheduler);
    }

    /// Stop the countdown, keeping the time left.
    pub fn pause(&mut self, scheduler: &mut Scheduler) {
        scheduler.cancel(TaskSlot::Countdown);
    }

    pub fn resume(&mut self, scheduler: &mut Scheduler, now: NaiveDateTime) {
        if self.phase == Phase::Playing {
            self.start_countdown(scheduler, now);
        }
    }

    fn start_countdown(&self, scheduler: &mut Scheduler, now: NaiveDateTime) {
        let tick = Duration::milliseconds(self.config.countdown_tick_ms);
        scheduler.schedule_repeating(TaskSlot::Countdown, tick, now);
    }

    fn reset(&mut self, scheduler: &mut Scheduler) {
        scheduler.cancel(TaskSlot::Countdown);
        scheduler.cancel(TaskSlot::FlipBack);
        self.level = None;
        self.phase = Phase::Selecting;
        self.cards.clear();
        self.pending.clear();
        self.time_remaining = 0;
    }

    fn persist_unlocked(&self) {
        let levels: Vec<i64> = self.unlocked.iter().map(|&n| i64::from(n)).collect();
        self.store.write_int_array(keys::MINIGAME_UNLOCKED, &levels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GameStore;
    use chrono::NaiveDate;
    use std::rc::Rc;

    fn handle() -> ProfileStore {
        let store = GameStore::in_memory().unwrap();
        store.migrate().unwrap();
        store.ensure_profile("p", "test").unwrap();
        ProfileStore::new(Rc::new(store), "p".into())
    }

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 17).unwrap().and_hms_opt(20, 0, 0).unwrap()
    }

    fn game(h: ProfileStore) -> MiniGameSubsystem {
        MiniGameSubsystem::load(h, MiniGameConfig::default(), 7)
    }

    /// Index pairs of matching cards, in board order.
    fn pairs(cards: &[Card]) -> Vec<(usize, usize)> {
        let mut open: Vec<usize> = Vec::new();
        let mut out = Vec::new();
        for c in cards {
            match open.iter().position(|&i| cards[i].kind == c.kind) {
                Some(p) => out.push((open.remove(p), c.id)),
                None => open.push(c.id),
            }
        }
        out
    }

    #[test]
    fn level_table() {
        assert_eq!(grid_size(1), (2, 2));
        assert_eq!(grid_size(5), (3, 3));
        assert_eq!(grid_size(10), (4, 3));
        assert_eq!(time_limit_secs(1), 30);
        assert_eq!(time_limit_secs(4), 24);
        assert_eq!(time_limit_secs(10), 15);
    }

    #[test]
    fn boards_hold_only_pairs() {
        let mut g = game(handle());
        for (total, expect) in [(4, 4), (9, 10), (12, 12)] {
            let deck = g.deal(total);
            assert_eq!(deck.len(), expect);
            for t in 1..=6 {
                assert_eq!(deck.iter().filter(|&&k| k == t).count() % 2, 0);
            }
        }
    }

    #[test]
    fn same_seed_same_board() {
        let mut a = game(handle());
        let mut b = game(handle());
        let (mut sa, mut sb) = (Scheduler::new(), Scheduler::new());
        a.start(1, &mut sa, t0());
        b.start(1, &mut sb, t0());
        assert_eq!(a.cards(), b.cards());
    }

    #[test]
    fn locked_levels_do_not_start() {
        let mut g = game(handle());
        let mut s = Scheduler::new();
        assert_eq!(g.start(2, &mut s, t0()), None);
        assert_eq!(g.phase(), Phase::Selecting);
        assert!(!s.is_scheduled(TaskSlot::Countdown));
    }

    #[test]
    fn winning_level_one_unlocks_two() {
        let h = handle();
        let mut g = game(h.clone());
        let mut s = Scheduler::new();
        assert_eq!(g.start(1, &mut s, t0()), Some(EconomyEvent::MiniGameStarted { level: 1 }));
        assert!(s.is_scheduled(TaskSlot::Countdown));

        let board = pairs(g.cards());
        assert_eq!(board.len(), 2);
        assert_eq!(g.flip(board[0].0, &mut s, t0()), None);
        assert_eq!(g.flip(board[0].1, &mut s, t0()), None);
        g.flip(board[1].0, &mut s, t0());
        let won = g.flip(board[1].1, &mut s, t0());

        assert_eq!(won, Some(EconomyEvent::MiniGameWon { level: 1 }));
        assert!(g.is_won());
        assert!(g.is_unlocked(2));
        assert!(!s.is_scheduled(TaskSlot::Countdown));
        assert_eq!(g.confirm(&mut s), 1_000);
        assert_eq!(g.phase(), Phase::Selecting);
        assert_eq!(g.confirm(&mut s), 0);

        assert!(game(h).is_unlocked(2));
    }

    #[test]
    fn mismatch_blocks_until_flip_back() {
        let mut g = game(handle());
        let mut s = Scheduler::new();
        g.start(1, &mut s, t0());
        let board = pairs(g.cards());
        let (a, b) = (board[0].0, board[1].0);

        g.flip(a, &mut s, t0());
        g.flip(a, &mut s, t0());
        assert_eq!(g.cards().iter().filter(|c| c.face_up).count(), 1);
        g.flip(b, &mut s, t0());
        assert!(s.is_scheduled(TaskSlot::FlipBack));

        // Two cards pending: a third flip is refused.
        g.flip(board[0].1, &mut s, t0());
        assert!(!g.cards()[board[0].1].face_up);

        g.flip_back();
        assert!(g.cards().iter().all(|c| !c.face_up));
        g.flip(99, &mut s, t0());
        assert!(g.cards().iter().all(|c| !c.face_up));
    }

    #[test]
    fn running_out_of_time_loses() {
        let mut g = game(handle());
        let mut s = Scheduler::new();
        g.start(1, &mut s, t0());
        let mut lost = None;
        for _ in 0..30 {
            lost = lost.or(g.countdown_tick(&mut s));
        }
        assert_eq!(lost, Some(EconomyEvent::MiniGameLost { level: 1 }));
        assert!(g.is_lost());
        assert!(!s.is_scheduled(TaskSlot::Countdown));

        // Decided rounds take no more flips.
        g.flip(0, &mut s, t0());
        assert!(g.cards().iter().all(|c| !c.face_up));
        assert_eq!(g.confirm(&mut s), -1_000);
        assert!(!g.is_unlocked(2));
    }

    #[test]
    fn back_to_selection_abandons_round() {
        let mut g = game(handle());
        let mut s = Scheduler::new();
        g.start(1, &mut s, t0());
        g.back_to_level_selection(&mut s);
        assert_eq!(g.phase(), Phase::Selecting);
        assert!(g.cards().is_empty());
        assert!(s.active_slots().is_empty());
        assert_eq!(g.confirm(&mut s), 0);
    }

    #[test]
    fn unlocked_set_sanitized_on_load() {
        let h = handle();
        h.write_int_array(keys::MINIGAME_UNLOCKED, &[3, -1, 42]);
        let g = game(h);
        assert_eq!(g.unlocked().iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    }
}
