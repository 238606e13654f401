//! A single plant growing on the grid.
//!
//! Age and yield are integrated lazily from wall time:
//!   - age advances by `dt * drought_mult` whenever the plant is advanced,
//!     and never while paused;
//!   - yield is `rate * (now - last_harvest) * locust_mult`, computed at
//!     harvest time and never stored, so harvest frequency does not change
//!     the total.
//!
//! Modifiers only apply from the moment they are set. `apply_modifiers`
//! settles elapsed age under the old multiplier first.

use crate::{
    tiers::Archetype,
    types::{ArchetypeName, GridPos, Timestamp},
};
use serde::{Deserialize, Serialize};

/// Per-plant transient effects set by active weather.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Scales aging speed.
    pub drought_mult: f64,
    /// Scales yield rate.
    pub locust_mult:  f64,
    /// Suspends both aging and yield.
    pub paused:       bool,
}

impl Modifiers {
    pub const NEUTRAL: Modifiers = Modifiers {
        drought_mult: 1.0,
        locust_mult:  1.0,
        paused:       false,
    };
}

impl Default for Modifiers {
    fn default() -> Self { Self::NEUTRAL }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub archetype:    ArchetypeName,
    pub pos:          GridPos,
    base_rate:        f64,
    lifespan:         f64,
    age:              f64,
    last_update:      Timestamp,
    last_harvest:     Timestamp,
    modifiers:        Modifiers,
}

impl Plant {
    pub fn new(archetype: &Archetype, pos: GridPos, now: Timestamp) -> Self {
        Self {
            archetype:    archetype.name.clone(),
            pos,
            base_rate:    archetype.rate,
            lifespan:     archetype.lifespan,
            age:          0.0,
            last_update:  now,
            last_harvest: now,
            modifiers:    Modifiers::NEUTRAL,
        }
    }

    /// Bring age up to `now`. Calling twice with the same `now` is a no-op.
    pub fn advance(&mut self, now: Timestamp) {
        let dt = (now - self.last_update).max(0.0);
        if !self.modifiers.paused {
            self.age += dt * self.modifiers.drought_mult;
        }
        if now > self.last_update {
            self.last_update = now;
        }
    }

    pub fn is_dead(&mut self, now: Timestamp) -> bool {
        self.advance(now);
        self.age > self.lifespan
    }

    /// Fraction of life used, in [0, 1].
    pub fn life_ratio(&mut self, now: Timestamp) -> f64 {
        self.advance(now);
        if self.lifespan <= 0.0 {
            return 1.0;
        }
        (self.age / self.lifespan).clamp(0.0, 1.0)
    }

    /// Collect fruit produced since the last harvest.
    pub fn harvest(&mut self, now: Timestamp) -> f64 {
        if self.modifiers.paused {
            self.last_harvest = now;
            return 0.0;
        }
        let elapsed = (now - self.last_harvest).max(0.0);
        self.last_harvest = now;
        self.base_rate * elapsed * self.modifiers.locust_mult
    }

    /// Replace the active modifiers as of `now`.
    pub fn apply_modifiers(&mut self, now: Timestamp, modifiers: Modifiers) {
        if modifiers == self.modifiers {
            return;
        }
        self.advance(now);
        if self.modifiers.paused && !modifiers.paused {
            // The paused interval is never credited.
            self.last_harvest = now;
        }
        self.modifiers = modifiers;
    }

    /// Add `bonus` seconds of lifespan. Dead plants stay dead.
    /// Returns whether the bonus was applied.
    pub fn extend_lifespan(&mut self, now: Timestamp, bonus: f64) -> bool {
        if self.is_dead(now) {
            return false;
        }
        self.lifespan += bonus;
        true
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn lifespan(&self) -> f64 {
        self.lifespan
    }
}
