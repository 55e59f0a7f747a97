//! Deterministic random number generation.
//!
//! RULE: nothing in the economy may call a platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the master seed held in `EconomyConfig`.
//!
//! Each subsystem gets its own RNG stream, seeded from
//! (master_seed XOR slot constant), so adding a consumer never
//! disturbs the boards an existing seed produces.

use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single subsystem.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a subsystem RNG from the master seed and a stable slot.
    pub fn new(master_seed: u64, slot: RngSlot) -> Self {
        let derived_seed = master_seed ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name: slot.name(),
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an integer in [low, high] inclusive.
    pub fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        assert!(low <= high, "empty range {low}..={high}");
        low + self.next_u64_below(u64::from(high - low) + 1) as u32
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

/// Stable RNG stream assignments.
/// NEVER reorder or remove entries; only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    MiniGame = 0,
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MiniGame => "minigame",
        }
    }
}
