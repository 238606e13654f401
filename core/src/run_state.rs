//! Per-run totals owned by the engine: fruit balance, cumulative score,
//! reroll pricing, the seed inventory and the empty-garden watch.

use crate::{
    config::RunConfig,
    difficulty,
    types::{ArchetypeName, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Spendable fruit. Never negative: every spend is gated on it.
    pub balance:     f64,
    /// Lifetime fruit harvested. Never decremented.
    pub score:       f64,
    pub reroll_cost: f64,
}

impl RunTotals {
    pub fn new(cfg: &RunConfig) -> Self {
        Self {
            balance:     cfg.starting_balance,
            score:       0.0,
            reroll_cost: cfg.starting_reroll_cost,
        }
    }

    /// Credit harvested fruit to both balance and score.
    pub fn credit(&mut self, amount: f64) {
        if amount > 0.0 {
            self.balance += amount;
            self.score += amount;
        }
    }

    /// Spend `amount` if affordable. Returns whether the spend happened.
    pub fn try_spend(&mut self, amount: f64) -> bool {
        if amount < 0.0 || self.balance < amount {
            return false;
        }
        self.balance -= amount;
        true
    }
}

/// Seeds bought but not yet planted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    seeds: BTreeMap<ArchetypeName, u32>,
}

impl Inventory {
    pub fn add(&mut self, name: &str, count: u32) {
        if count > 0 {
            *self.seeds.entry(name.to_string()).or_insert(0) += count;
        }
    }

    pub fn count(&self, name: &str) -> u32 {
        self.seeds.get(name).copied().unwrap_or(0)
    }

    /// Take one seed. Returns false when none are owned.
    pub fn take(&mut self, name: &str) -> bool {
        match self.seeds.get_mut(name) {
            Some(n) if *n > 0 => {
                *n -= 1;
                if *n == 0 {
                    self.seeds.remove(name);
                }
                true
            }
            _ => false,
        }
    }

    /// Owned archetypes with their counts, in name order.
    pub fn owned(&self) -> impl Iterator<Item = (&ArchetypeName, &u32)> {
        self.seeds.iter()
    }

    pub fn total(&self) -> u32 {
        self.seeds.values().sum()
    }
}

/// Tracks how long the garden has been continuously empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyGardenWatch {
    pub empty_since: Option<Timestamp>,
    pub timeout:     f64,
    pub game_over:   bool,
}

/// What the watch saw this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Planted,
    BecameEmpty,
    StillEmpty,
    Expired,
}

impl EmptyGardenWatch {
    pub fn new(cfg: &RunConfig) -> Self {
        Self {
            empty_since: None,
            timeout:     difficulty::empty_garden_timeout(0.0, cfg),
            game_over:   false,
        }
    }

    /// Update from this tick's plant count and score.
    pub fn observe(&mut self, now: Timestamp, is_empty: bool, score: f64, cfg: &RunConfig) -> WatchOutcome {
        self.timeout = difficulty::empty_garden_timeout(score, cfg);
        if self.game_over {
            return WatchOutcome::Expired;
        }
        if !is_empty {
            self.empty_since = None;
            return WatchOutcome::Planted;
        }
        match self.empty_since {
            None => {
                self.empty_since = Some(now);
                WatchOutcome::BecameEmpty
            }
            Some(since) if now - since >= self.timeout => {
                self.game_over = true;
                WatchOutcome::Expired
            }
            Some(_) => WatchOutcome::StillEmpty,
        }
    }

    /// Seconds left before game over, while the garden is empty.
    pub fn remaining(&self, now: Timestamp) -> Option<f64> {
        self.empty_since
            .map(|since| (self.timeout - (now - since)).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spending_never_overdraws() {
        let mut totals = RunTotals::new(&RunConfig::default());
        assert!(!totals.try_spend(150.5));
        assert!(totals.try_spend(150.0));
        assert_eq!(totals.balance, 0.0);
        assert!(!totals.try_spend(-10.0), "Negative spends would mint fruit");
    }

    #[test]
    fn score_only_grows() {
        let mut totals = RunTotals::new(&RunConfig::default());
        totals.credit(40.0);
        totals.try_spend(100.0);
        totals.credit(-5.0);
        assert_eq!(totals.score, 40.0);
        assert_eq!(totals.balance, 90.0);
    }

    #[test]
    fn inventory_counts_and_drains() {
        let mut inv = Inventory::default();
        inv.add("fern", 2);
        inv.add("moss", 0);
        assert_eq!(inv.total(), 2);
        assert!(inv.take("fern"));
        assert!(inv.take("fern"));
        assert!(!inv.take("fern"));
        assert_eq!(inv.owned().count(), 0, "Drained entries are dropped");
    }

    #[test]
    fn watch_expires_after_continuous_emptiness() {
        let cfg = RunConfig::default();
        let mut watch = EmptyGardenWatch::new(&cfg);

        assert_eq!(watch.observe(1.0, true, 0.0, &cfg), WatchOutcome::BecameEmpty);
        assert_eq!(watch.observe(6.0, true, 0.0, &cfg), WatchOutcome::StillEmpty);
        assert_eq!(watch.remaining(6.0), Some(5.0));
        assert_eq!(watch.observe(7.0, false, 0.0, &cfg), WatchOutcome::Planted);
        assert_eq!(watch.observe(8.0, true, 0.0, &cfg), WatchOutcome::BecameEmpty);
        assert_eq!(watch.observe(17.9, true, 0.0, &cfg), WatchOutcome::StillEmpty);
        assert_eq!(watch.observe(18.0, true, 0.0, &cfg), WatchOutcome::Expired);
        assert!(watch.game_over);
        assert_eq!(watch.observe(19.0, false, 0.0, &cfg), WatchOutcome::Expired, "Game over is final");
    }

    #[test]
    fn high_scores_shorten_the_timeout() {
        let cfg = RunConfig::default();
        let mut watch = EmptyGardenWatch::new(&cfg);
        watch.observe(0.0, true, 350_000.0, &cfg);
        assert_eq!(watch.timeout, 7.0);
        watch.observe(0.0, true, 2_000_000.0, &cfg);
        assert_eq!(watch.timeout, 0.1);
        assert_eq!(watch.observe(0.1, true, 2_000_000.0, &cfg), WatchOutcome::Expired);
    }
}
