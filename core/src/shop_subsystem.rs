//! Shop subsystem: offerings, tier progression and inflation.
//!
//! Offerings are drawn from every archetype at or below the unlocked
//! tier. One slot always comes from the highest unlocked tier so new
//! content shows up as soon as it unlocks; the rest are drawn with
//! replacement from everything available.
//!
//! Tier unlocks follow a geometric score curve and may cross several
//! tiers in one tick. Prices and the auto-refresh interval both scale
//! with score (see difficulty.rs).
//!
//! Execution: every tick, last in order, so it sees this tick's score.

use crate::{
    config::ShopConfig,
    difficulty,
    error::SimResult,
    event::{RefreshReason, SimEvent},
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickContext},
    tiers::ArchetypeCatalog,
    types::{ArchetypeName, Tick, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopState {
    /// Highest unlocked tier. Never decreases.
    pub tier:             u32,
    pub offerings:        Vec<ArchetypeName>,
    pub last_refresh:     Timestamp,
    pub refresh_interval: f64,
    /// Whether the storefront panel is open. A view flag only.
    pub is_open:          bool,
}

pub struct ShopSubsystem {
    config:  ShopConfig,
    catalog: ArchetypeCatalog,
    pub state: ShopState,
}

impl ShopSubsystem {
    /// Open the shop at tier 1 with a fresh set of offerings.
    pub fn new(
        config: ShopConfig,
        catalog: ArchetypeCatalog,
        now: Timestamp,
        rng: &mut SubsystemRng,
    ) -> Self {
        let refresh_interval = difficulty::refresh_interval(0.0, &config);
        let mut shop = Self {
            config,
            catalog,
            state: ShopState {
                tier: 1,
                offerings: Vec::new(),
                last_refresh: now,
                refresh_interval,
                is_open: false,
            },
        };
        shop.refresh_offerings(now, rng);
        shop
    }

    pub fn catalog(&self) -> &ArchetypeCatalog {
        &self.catalog
    }

    pub fn max_tier(&self) -> u32 {
        self.catalog.max_tier().max(1)
    }

    /// Archetypes the player may currently be offered.
    pub fn available(&self) -> Vec<ArchetypeName> {
        self.catalog.names_up_to_tier(self.state.tier)
    }

    /// Draw a new set of offerings.
    pub fn refresh_offerings(&mut self, now: Timestamp, rng: &mut SubsystemRng) -> &[ArchetypeName] {
        self.state.last_refresh = now;

        let available = self.available();
        let newest = self.catalog.names_in_tier(self.state.tier);

        let mut offerings = Vec::with_capacity(self.config.offering_count);
        if let Some(pick) = rng.choose(&newest) {
            offerings.push(pick.clone());
        }
        while offerings.len() < self.config.offering_count {
            match rng.choose(&available) {
                Some(pick) => offerings.push(pick.clone()),
                None => break,
            }
        }

        self.state.offerings = offerings;
        &self.state.offerings
    }

    /// Swap the offering in `slot` for a random available archetype.
    /// Used after a purchase so the slot is not empty.
    pub fn replace_slot(&mut self, slot: usize, rng: &mut SubsystemRng) {
        let available = self.available();
        if let (Some(current), Some(pick)) = (self.state.offerings.get_mut(slot), rng.choose(&available)) {
            *current = pick.clone();
        }
    }

    /// Unlock every tier whose threshold `score` has reached.
    /// Refreshes offerings once if anything unlocked; returns the new tiers.
    pub fn check_progression(&mut self, score: f64, now: Timestamp, rng: &mut SubsystemRng) -> Vec<u32> {
        let mut unlocked = Vec::new();
        while self.state.tier < self.max_tier()
            && score >= difficulty::tier_threshold(self.state.tier, &self.config)
        {
            self.state.tier += 1;
            unlocked.push(self.state.tier);
        }
        if !unlocked.is_empty() {
            self.refresh_offerings(now, rng);
        }
        unlocked
    }

    pub fn inflation_multiplier(&self, score: f64) -> f64 {
        difficulty::inflation_multiplier(score, &self.config)
    }

    /// Base cost scaled by inflation, rounded down. `None` for unknown names.
    pub fn adjusted_cost(&self, name: &str, score: f64) -> Option<f64> {
        self.catalog
            .get(name)
            .map(|a| (a.cost * self.inflation_multiplier(score)).floor())
    }

    /// Current offerings paired with their adjusted costs.
    pub fn priced_offerings(&self, score: f64) -> Vec<(ArchetypeName, f64)> {
        self.state
            .offerings
            .iter()
            .filter_map(|name| self.adjusted_cost(name, score).map(|c| (name.clone(), c)))
            .collect()
    }

    pub fn toggle_open(&mut self) -> bool {
        self.state.is_open = !self.state.is_open;
        self.state.is_open
    }

    fn refreshed_event(&self, tick: Tick, reason: RefreshReason) -> SimEvent {
        SimEvent::OfferingsRefreshed {
            tick,
            reason,
            offerings: self.state.offerings.clone(),
        }
    }

    /// Manual reroll on behalf of the engine.
    pub fn reroll(&mut self, tick: Tick, now: Timestamp, rng: &mut SubsystemRng) -> SimEvent {
        self.refresh_offerings(now, rng);
        self.refreshed_event(tick, RefreshReason::Reroll)
    }

    /// Initial offerings as an event, for the run-start log.
    pub fn opening_event(&self, tick: Tick) -> SimEvent {
        self.refreshed_event(tick, RefreshReason::Opening)
    }
}

impl SimSubsystem for ShopSubsystem {
    fn name(&self) -> &'static str { "shop" }

    fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        _events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let tick = ctx.tick;
        let now = ctx.now;
        let score = ctx.totals.score;
        let mut events = Vec::new();

        let unlocked = self.check_progression(score, now, rng);
        if !unlocked.is_empty() {
            for tier in &unlocked {
                log::info!("tick={tick} shop: tier {tier} unlocked at score {score:.0}");
                events.push(SimEvent::TierUnlocked { tick, tier: *tier });
            }
            events.push(self.refreshed_event(tick, RefreshReason::TierUnlocked));
        }

        self.state.refresh_interval = difficulty::refresh_interval(score, &self.config);
        if now - self.state.last_refresh >= self.state.refresh_interval {
            self.refresh_offerings(now, rng);
            log::debug!(
                "tick={tick} shop: scheduled refresh -> {:?}",
                self.state.offerings
            );
            events.push(self.refreshed_event(tick, RefreshReason::Scheduled));
        }

        Ok(events)
    }
}
