//! Random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng streams derived
//! from the single master seed held by the run's RngBank.
//!
//! Production runs draw the master seed from entropy, so runs differ.
//! Tests pass a fixed seed and get a reproducible sequence:
//!   - Each subsystem gets its own stream, seeded from
//!     (master_seed XOR subsystem_index), so adding a subsystem never
//!     changes the draws of another.
//!   - Streams persist for the whole run and are handed out by slot.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named RNG stream for a single subsystem.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a subsystem RNG from the master seed and a stable
    /// subsystem index. The index must never change once assigned.
    pub fn new(master_seed: u64, subsystem_index: u64) -> Self {
        let derived_seed = master_seed ^ (subsystem_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Raw 64-bit draw, used to seed a follow-up run.
    pub fn next_u64(&mut self) -> u64 {
        self.inner.gen::<u64>()
    }

    /// Roll a float uniformly in [lo, hi]. Returns `lo` if the range is empty.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// Roll an integer uniformly in [lo, hi]. Returns `lo` if the range is empty.
    pub fn range_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// Roll an index in [0, n). `n` must be > 0.
    pub fn index_below(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }

    /// Uniform pick from a slice; `None` when empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    /// Pick `amount` distinct elements (or all of them if fewer).
    pub fn sample<T: Clone>(&mut self, items: &[T], amount: usize) -> Vec<T> {
        items
            .choose_multiple(&mut self.inner, amount)
            .cloned()
            .collect()
    }

    /// Shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    /// Draw an index from a prepared weighted distribution.
    pub fn weighted(&mut self, dist: &WeightedIndex<u32>) -> usize {
        dist.sample(&mut self.inner)
    }
}

/// All subsystem RNG streams for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
    streams:     Vec<SubsystemRng>,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        let streams = SubsystemSlot::ALL
            .iter()
            .map(|slot| SubsystemRng::new(master_seed, *slot as u64).with_name(slot.name()))
            .collect();
        Self { master_seed, streams }
    }

    /// Unseeded bank for production runs.
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>())
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn stream(&mut self, slot: SubsystemSlot) -> &mut SubsystemRng {
        &mut self.streams[slot as usize]
    }
}

/// Stable subsystem slot assignments.
/// NEVER reorder or remove entries. Append only.
/// Reordering changes every subsystem's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SubsystemSlot {
    Tiers = 0,
    Weather = 1,
    Growth = 2,
    Shop = 3,
    Run = 4,
    // Add new subsystems here, append only.
}

impl SubsystemSlot {
    pub const ALL: [SubsystemSlot; 5] = [
        Self::Tiers,
        Self::Weather,
        Self::Growth,
        Self::Shop,
        Self::Run,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tiers => "tiers",
            Self::Weather => "weather",
            Self::Growth => "growth",
            Self::Shop => "shop",
            Self::Run => "run",
        }
    }
}
