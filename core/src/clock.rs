//! Time sources and the engine's tick clock.
//!
//! RULE: Nothing in the simulation samples the platform clock directly.
//! The caller samples a `Clock` once per poll and passes the resulting
//! `Timestamp` into every tick-level call.

use crate::types::{RunId, Tick, Timestamp};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::time::Instant;

/// Supplies a monotonic "now" in seconds.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock seconds since the clock was created.
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for WallClock {
    fn default() -> Self { Self::new() }
}

impl Clock for WallClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to. Used by tests and the headless runner.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    pub fn starting_at(now: Timestamp) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Move the clock forward by `seconds`. Negative steps are ignored.
    pub fn advance(&self, seconds: f64) -> Timestamp {
        let next = self.now.get() + seconds.max(0.0);
        self.now.set(next);
        next
    }

    pub fn set(&self, now: Timestamp) {
        if now > self.now.get() {
            self.now.set(now);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

/// The engine's own view of time: tick count plus the last accepted `now`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id:       RunId,
    pub current_tick: Tick,
    pub started_at:   Timestamp,
    pub last_now:     Timestamp,
}

impl SimClock {
    pub fn new(run_id: RunId, started_at: Timestamp) -> Self {
        Self {
            run_id,
            current_tick: 0,
            started_at,
            last_now: started_at,
        }
    }

    /// Advance one tick. Returns the accepted timestamp, which never goes
    /// backwards even if the caller's source does.
    pub fn advance(&mut self, now: Timestamp) -> Timestamp {
        self.current_tick += 1;
        if now > self.last_now {
            self.last_now = now;
        }
        self.last_now
    }

    /// Seconds since the run began.
    pub fn elapsed(&self) -> f64 {
        self.last_now - self.started_at
    }
}
