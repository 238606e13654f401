//! The simulation engine: one garden run.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Weather subsystem   (warnings, activation, instant + continuous effects)
//!   2. Growth subsystem    (hazard expiry, harvest, death)
//!   3. Empty-garden watch  (game-over timeout)
//!   4. Shop subsystem      (tier progression, scheduled refresh)
//!
//! RULES:
//!   - The engine owns the garden, totals and inventory and lends them to
//!     each subsystem through a TickContext for one call only.
//!   - Later steps observe earlier steps' effects within the same tick:
//!     a plant destroyed by weather never yields that tick.
//!   - `now` is supplied by the caller on every tick and command.
//!   - All randomness flows through the RngBank.
//!   - Player commands are validated immediately; invalid ones change nothing.

use crate::{
    clock::SimClock,
    command::PlayerCommand,
    config::SimConfig,
    error::SimResult,
    event::SimEvent,
    garden::Garden,
    growth_subsystem::GrowthSubsystem,
    manifest::{self, ManifestEntry},
    plant::Plant,
    rng::{RngBank, SubsystemRng, SubsystemSlot},
    run_state::{EmptyGardenWatch, Inventory, RunTotals, WatchOutcome},
    shop_subsystem::ShopSubsystem,
    snapshot::{GardenSnapshot, HazardView, OfferingView, PlantView, ShopView, WeatherView},
    subsystem::{SimSubsystem, TickContext},
    tiers::{self, ArchetypeCatalog},
    types::{RunId, Tick, Timestamp},
    weather_subsystem::WeatherSubsystem,
};

pub struct SimEngine {
    pub run_id:  RunId,
    pub clock:   SimClock,
    seed:        u64,
    config:      SimConfig,
    manifest:    Vec<ManifestEntry>,
    rng_bank:    RngBank,
    garden:      Garden,
    totals:      RunTotals,
    inventory:   Inventory,
    watch:       EmptyGardenWatch,
    pub weather: WeatherSubsystem,
    pub growth:  GrowthSubsystem,
    pub shop:    ShopSubsystem,
}

impl SimEngine {
    /// Start a run: generate tiers from `manifest`, open the shop,
    /// hand out the starting seeds.
    pub fn new(
        run_id: RunId,
        seed: u64,
        config: SimConfig,
        manifest: Vec<ManifestEntry>,
        now: Timestamp,
    ) -> SimResult<Self> {
        config.validate()?;
        let mut rng_bank = RngBank::new(seed);
        let catalog = tiers::generate(&manifest, &config.tiers, rng_bank.stream(SubsystemSlot::Tiers))?;
        Self::assemble(run_id, rng_bank, config, manifest, catalog, now)
    }

    /// Start a run with a fixed catalog instead of generated tiers.
    pub fn with_catalog(
        run_id: RunId,
        seed: u64,
        config: SimConfig,
        catalog: ArchetypeCatalog,
        now: Timestamp,
    ) -> SimResult<Self> {
        config.validate()?;
        let manifest = catalog
            .iter()
            .map(|a| ManifestEntry::new(a.name.clone(), a.sprite.clone()))
            .collect();
        Self::assemble(run_id, RngBank::new(seed), config, manifest, catalog, now)
    }

    /// Production entry point: random run id and unseeded randomness.
    pub fn start(config: SimConfig, manifest: Vec<ManifestEntry>, now: Timestamp) -> SimResult<Self> {
        let seed = RngBank::from_entropy().master_seed();
        Self::new(new_run_id(), seed, config, manifest, now)
    }

    /// Canonical config and a synthetic manifest, starting at t = 0.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        let config = SimConfig::default_test();
        let manifest = manifest::synthetic_manifest(config.tiers.required_entries());
        Self::new(run_id, seed, config, manifest, 0.0)
    }

    fn assemble(
        run_id: RunId,
        mut rng_bank: RngBank,
        config: SimConfig,
        manifest: Vec<ManifestEntry>,
        catalog: ArchetypeCatalog,
        now: Timestamp,
    ) -> SimResult<Self> {
        let seed = rng_bank.master_seed();
        let weather = WeatherSubsystem::new(
            config.weather.clone(),
            now,
            rng_bank.stream(SubsystemSlot::Weather),
        )?;
        let shop = ShopSubsystem::new(
            config.shop.clone(),
            catalog,
            now,
            rng_bank.stream(SubsystemSlot::Shop),
        );

        let mut inventory = Inventory::default();
        let tier_one = shop.catalog().names_in_tier(1);
        if let Some(name) = rng_bank.stream(SubsystemSlot::Run).choose(&tier_one) {
            inventory.add(name, config.run.starting_seeds);
        }

        log::info!(
            "engine: run {run_id} started (seed={seed}, {} archetypes, {}x{} grid)",
            shop.catalog().len(),
            config.grid.cols,
            config.grid.rows
        );

        Ok(Self {
            clock:     SimClock::new(run_id.clone(), now),
            run_id,
            seed,
            garden:    Garden::new(&config.grid),
            totals:    RunTotals::new(&config.run),
            watch:     EmptyGardenWatch::new(&config.run),
            inventory,
            weather,
            growth:    GrowthSubsystem::new(),
            shop,
            rng_bank,
            manifest,
            config,
        })
    }

    /// Throw the current run away and start a fresh one from the same
    /// manifest and config. The new seed is drawn from the old run.
    pub fn restart(&mut self, now: Timestamp) -> SimResult<()> {
        let seed = self.rng_bank.stream(SubsystemSlot::Run).next_u64();
        let manifest = std::mem::take(&mut self.manifest);
        let fresh = if manifest.len() >= self.config.tiers.required_entries() {
            Self::new(new_run_id(), seed, self.config.clone(), manifest, now)?
        } else {
            let catalog = self.shop.catalog().clone();
            Self::with_catalog(new_run_id(), seed, self.config.clone(), catalog, now)?
        };
        log::info!("engine: run {} replaced by {}", self.run_id, fresh.run_id);
        *self = fresh;
        Ok(())
    }

    /// Events describing the run's starting state, logged as tick 0.
    pub fn startup_events(&self) -> Vec<SimEvent> {
        vec![
            SimEvent::RunInitialized {
                run_id:     self.run_id.clone(),
                seed:       self.seed,
                archetypes: self.shop.catalog().len(),
            },
            self.shop.opening_event(0),
        ]
    }

    /// Advance one tick at `now`. This is the core simulation step.
    /// After game over, ticks are no-ops.
    pub fn tick(&mut self, now: Timestamp) -> SimResult<Vec<SimEvent>> {
        if self.watch.game_over {
            return Ok(Vec::new());
        }

        let now = self.clock.advance(now);
        let tick = self.clock.current_tick;
        let mut tick_events = vec![SimEvent::TickStarted { tick, now }];

        let mut ctx = TickContext {
            tick,
            now,
            garden: &mut self.garden,
            totals: &mut self.totals,
        };

        run_subsystem(&mut self.weather, &mut ctx, &mut tick_events, self.rng_bank.stream(SubsystemSlot::Weather))?;
        run_subsystem(&mut self.growth, &mut ctx, &mut tick_events, self.rng_bank.stream(SubsystemSlot::Growth))?;

        let outcome = self.watch.observe(now, ctx.garden.is_empty(), ctx.totals.score, &self.config.run);
        match outcome {
            WatchOutcome::BecameEmpty => {
                log::debug!("tick={tick} engine: garden empty, {:.1}s to replant", self.watch.timeout);
                tick_events.push(SimEvent::GardenEmptied { tick, timeout: self.watch.timeout });
            }
            WatchOutcome::Expired => {
                log::info!(
                    "tick={tick} engine: garden withered, game over at score {:.0}",
                    ctx.totals.score
                );
                tick_events.push(SimEvent::GameOver { tick, score: ctx.totals.score });
            }
            WatchOutcome::Planted | WatchOutcome::StillEmpty => {}
        }

        run_subsystem(&mut self.shop, &mut ctx, &mut tick_events, self.rng_bank.stream(SubsystemSlot::Shop))?;

        tick_events.push(SimEvent::TickCompleted { tick });
        Ok(tick_events)
    }

    /// Tick every `step` seconds from the last accepted time until `until`
    /// or game over. Used by the headless runner and tests.
    pub fn run_until(&mut self, until: Timestamp, step: f64) -> SimResult<Vec<SimEvent>> {
        let step = step.max(1e-3);
        let mut events = Vec::new();
        while self.clock.last_now < until && !self.watch.game_over {
            let now = (self.clock.last_now + step).min(until);
            events.extend(self.tick(now)?);
        }
        Ok(events)
    }

    // ── Player commands ────────────────────────────────────────

    /// Apply a player intent at `now`. Invalid intents are rejected
    /// without touching state.
    pub fn apply(&mut self, command: PlayerCommand, now: Timestamp) -> Vec<SimEvent> {
        let tick = self.clock.current_tick;
        let now = now.max(self.clock.last_now);

        if self.watch.game_over {
            return vec![self.reject(&command, "run is over".into())];
        }

        match command {
            PlayerCommand::Place { ref archetype, cell } => {
                let Some(stats) = self.shop.catalog().get(archetype) else {
                    return vec![self.reject(&command, format!("unknown archetype {archetype}"))];
                };
                if self.inventory.count(archetype) == 0 {
                    return vec![self.reject(&command, format!("no {archetype} seeds owned"))];
                }
                if let Some(blocker) = self.garden.placement_blocker(cell, now) {
                    return vec![self.reject(&command, format!("{blocker} at {cell}"))];
                }

                let mut plant = Plant::new(stats, cell, now);
                plant.apply_modifiers(now, self.weather.continuous_modifiers(self.totals.score));
                self.garden.insert(plant);
                self.inventory.take(archetype);
                log::debug!("tick={tick} engine: planted {archetype} at {cell}");
                vec![SimEvent::PlantPlaced { tick, archetype: archetype.clone(), cell }]
            }
            PlayerCommand::Purchase { slot } => {
                let Some(name) = self.shop.state.offerings.get(slot).cloned() else {
                    return vec![self.reject(&command, format!("no offering in slot {slot}"))];
                };
                let Some(cost) = self.shop.adjusted_cost(&name, self.totals.score) else {
                    return vec![self.reject(&command, format!("unknown archetype {name}"))];
                };
                if !self.totals.try_spend(cost) {
                    return vec![self.reject(
                        &command,
                        format!("{name} costs {cost:.0}, balance {:.0}", self.totals.balance),
                    )];
                }
                self.inventory.add(&name, 1);
                self.shop.replace_slot(slot, self.rng_bank.stream(SubsystemSlot::Shop));
                log::debug!("tick={tick} engine: bought {name} for {cost:.0}");
                vec![SimEvent::PurchaseCompleted { tick, archetype: name, cost }]
            }
            PlayerCommand::Reroll => {
                let cost = self.totals.reroll_cost;
                if !self.totals.try_spend(cost) {
                    return vec![self.reject(
                        &command,
                        format!("reroll costs {cost:.0}, balance {:.0}", self.totals.balance),
                    )];
                }
                self.totals.reroll_cost *= self.config.run.reroll_growth;
                let refreshed = self.shop.reroll(tick, now, self.rng_bank.stream(SubsystemSlot::Shop));
                log::debug!(
                    "tick={tick} engine: rerolled for {cost:.0}, next reroll {:.0}",
                    self.totals.reroll_cost
                );
                vec![
                    SimEvent::Rerolled { tick, cost, next_cost: self.totals.reroll_cost },
                    refreshed,
                ]
            }
            PlayerCommand::ToggleShop => {
                let open = self.shop.toggle_open();
                vec![SimEvent::ShopToggled { tick, open }]
            }
        }
    }

    fn reject(&self, command: &PlayerCommand, reason: String) -> SimEvent {
        let tick = self.clock.current_tick;
        log::warn!("tick={tick} engine: {} rejected: {reason}", command.type_name());
        SimEvent::CommandRejected {
            tick,
            command: command.type_name().to_string(),
            reason,
        }
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn seed(&self) -> u64 { self.seed }
    pub fn config(&self) -> &SimConfig { &self.config }
    pub fn catalog(&self) -> &ArchetypeCatalog { self.shop.catalog() }
    pub fn garden(&self) -> &Garden { &self.garden }
    pub fn totals(&self) -> &RunTotals { &self.totals }
    pub fn inventory(&self) -> &Inventory { &self.inventory }
    pub fn watch(&self) -> &EmptyGardenWatch { &self.watch }
    pub fn is_game_over(&self) -> bool { self.watch.game_over }
    pub fn current_tick(&self) -> Tick { self.clock.current_tick }

    /// Mutable garden access for tooling and tests that stage a scenario.
    pub fn garden_mut(&mut self) -> &mut Garden { &mut self.garden }

    /// Build the read-only view of the run at `now`.
    pub fn snapshot(&mut self, now: Timestamp) -> GardenSnapshot {
        let now = now.max(self.clock.last_now);
        let score = self.totals.score;
        let catalog = self.shop.catalog();

        let plants = self
            .garden
            .plants_mut()
            .map(|plant| PlantView {
                cell:       plant.pos,
                archetype:  plant.archetype.clone(),
                sprite:     catalog.get(&plant.archetype).map(|a| a.sprite.clone()).unwrap_or_default(),
                life_ratio: plant.life_ratio(now),
                paused:     plant.modifiers().paused,
            })
            .collect();

        let hazards = self
            .garden
            .hazards()
            .filter(|(_, expiry)| now <= **expiry)
            .map(|(cell, expiry)| HazardView { cell: *cell, expires_at: *expiry })
            .collect();

        let offerings = self
            .shop
            .priced_offerings(score)
            .into_iter()
            .enumerate()
            .map(|(slot, (name, cost))| OfferingView {
                slot,
                tier: catalog.get(&name).map(|a| a.tier).unwrap_or(0),
                archetype: name,
                cost,
                affordable: self.totals.balance >= cost,
            })
            .collect();

        let state = &self.weather.state;
        GardenSnapshot {
            run_id:  self.run_id.clone(),
            tick:    self.clock.current_tick,
            now,
            cols:    self.garden.cols(),
            rows:    self.garden.rows(),
            plants,
            hazards,
            balance: self.totals.balance,
            score,
            inventory: self.inventory.owned().map(|(n, c)| (n.clone(), *c)).collect(),
            shop: ShopView {
                is_open:      self.shop.state.is_open,
                tier:         self.shop.state.tier,
                max_tier:     self.shop.max_tier(),
                offerings,
                reroll_cost:  self.totals.reroll_cost,
                inflation:    self.shop.inflation_multiplier(score),
                next_refresh: (self.shop.state.last_refresh + self.shop.state.refresh_interval - now).max(0.0),
            },
            weather: WeatherView {
                phase:     state.phase(),
                warning:   state.warning_event,
                active:    state.current_event,
                countdown: self
                    .weather
                    .warning_countdown(now)
                    .or_else(|| self.weather.active_countdown(now))
                    .or_else(|| self.weather.idle_countdown(now)),
                forecast:  self.weather.forecast_text(),
                flash:     state.flash,
            },
            empty_countdown: self.watch.remaining(now),
            game_over: self.watch.game_over,
        }
    }
}

/// Run one subsystem and append its events to the tick log.
fn run_subsystem(
    subsystem: &mut dyn SimSubsystem,
    ctx: &mut TickContext<'_>,
    tick_events: &mut Vec<SimEvent>,
    rng: &mut SubsystemRng,
) -> SimResult<()> {
    let new_events = subsystem.update(ctx, tick_events, rng)?;
    if !new_events.is_empty() {
        log::trace!(
            "tick={} {}: {} events",
            ctx.tick,
            subsystem.name(),
            new_events.len()
        );
    }
    tick_events.extend(new_events);
    Ok(())
}

fn new_run_id() -> RunId {
    format!("run-{}", uuid::Uuid::new_v4())
}
