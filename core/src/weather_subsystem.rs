//! Weather subsystem: the environmental event scheduler.
//!
//! Lifecycle of one event:
//!   idle → warning → active → idle (cooldown)
//!
//!   - idle → warning:   nothing pending and `now > next_check`; the
//!                       pre-rolled upcoming kind is announced and arrives
//!                       after a fixed lead.
//!   - warning → active: `now >= event_start`; the instant effect (meteor,
//!                       hailstorm, rain) is applied exactly once.
//!   - active → idle:    `now > event_end`; every plant's modifiers reset,
//!                       a score-scaled cooldown is rolled, and the next
//!                       upcoming kind plus its forecast are drawn.
//!
//! Continuous effects (drought, locusts, eclipse) are re-applied to every
//! plant on every tick while their event is active.
//!
//! Execution: every tick, first in order.

use crate::{
    config::WeatherConfig,
    difficulty,
    error::{SimError, SimResult},
    event::{SimEvent, WeatherKind},
    garden::Garden,
    plant::Modifiers,
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickContext},
    types::{GridPos, Tick, Timestamp},
};
use rand::distributions::WeightedIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The player-facing guess about the next event. May be wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "forecast", content = "kind", rename_all = "snake_case")]
pub enum Forecast {
    Unknown,
    Predicted(WeatherKind),
}

impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            Self::Predicted(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherPhase {
    Idle,
    Warning,
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    pub current_event:  Option<WeatherKind>,
    pub warning_event:  Option<WeatherKind>,
    /// When the warned event becomes active.
    pub event_start:    Timestamp,
    /// When the active event resolves.
    pub event_end:      Timestamp,
    /// Earliest time the next warning may be issued.
    pub next_check:     Timestamp,
    pub upcoming_event: WeatherKind,
    pub forecast:       Forecast,
    /// Cosmetic meteor flash intensity, decays every tick.
    pub flash:          u8,
}

impl WeatherState {
    pub fn phase(&self) -> WeatherPhase {
        match (self.warning_event, self.current_event) {
            (Some(_), _) => WeatherPhase::Warning,
            (None, Some(_)) => WeatherPhase::Active,
            (None, None) => WeatherPhase::Idle,
        }
    }
}

pub struct WeatherSubsystem {
    config: WeatherConfig,
    pool:   Vec<WeatherKind>,
    dist:   WeightedIndex<u32>,
    pub state: WeatherState,
}

impl WeatherSubsystem {
    /// Build the scheduler and pre-roll the first upcoming event.
    pub fn new(config: WeatherConfig, now: Timestamp, rng: &mut SubsystemRng) -> SimResult<Self> {
        let pool: Vec<WeatherKind> = config.pool.iter().map(|w| w.kind).collect();
        let dist = WeightedIndex::new(config.pool.iter().map(|w| w.weight))
            .map_err(|e| SimError::InvalidConfig { reason: format!("weather pool weights: {e}") })?;

        let upcoming_event = pool[rng.weighted(&dist)];
        let forecast = roll_forecast(upcoming_event, &pool, &config, rng);

        let state = WeatherState {
            current_event:  None,
            warning_event:  None,
            event_start:    0.0,
            event_end:      0.0,
            next_check:     now + config.first_check_delay,
            upcoming_event,
            forecast,
            flash:          0,
        };
        log::debug!("weather: first upcoming {upcoming_event}, forecast {forecast}");
        Ok(Self { config, pool, dist, state })
    }

    pub fn forecast_text(&self) -> String {
        self.state.forecast.to_string()
    }

    /// Seconds until the warned event arrives.
    pub fn warning_countdown(&self, now: Timestamp) -> Option<f64> {
        self.state
            .warning_event
            .map(|_| (self.state.event_start - now).max(0.0))
    }

    /// Seconds until the active event ends.
    pub fn active_countdown(&self, now: Timestamp) -> Option<f64> {
        self.state
            .current_event
            .map(|_| (self.state.event_end - now).max(0.0))
    }

    /// Seconds until the next warning may be rolled, while idle.
    pub fn idle_countdown(&self, now: Timestamp) -> Option<f64> {
        (self.state.phase() == WeatherPhase::Idle)
            .then(|| (self.state.next_check - now).max(0.0))
    }

    /// Replace the pre-rolled upcoming event and re-forecast it.
    /// Used by tooling and tests to stage a specific event.
    pub fn force_upcoming(&mut self, kind: WeatherKind, rng: &mut SubsystemRng) {
        self.state.upcoming_event = kind;
        self.state.forecast = roll_forecast(kind, &self.pool, &self.config, rng);
    }

    /// Modifiers every plant should carry right now.
    pub fn continuous_modifiers(&self, score: f64) -> Modifiers {
        match self.state.current_event {
            Some(WeatherKind::Drought) => Modifiers {
                drought_mult: difficulty::drought_multiplier(score, &self.config),
                ..Modifiers::NEUTRAL
            },
            Some(WeatherKind::Locusts) => Modifiers {
                locust_mult: difficulty::locust_multiplier(score, &self.config),
                ..Modifiers::NEUTRAL
            },
            Some(WeatherKind::Eclipse) => Modifiers {
                paused: true,
                ..Modifiers::NEUTRAL
            },
            _ => Modifiers::NEUTRAL,
        }
    }

    /// Apply `kind`'s one-time effect to the garden.
    pub fn apply_instant(
        &mut self,
        kind: WeatherKind,
        ctx: &mut TickContext<'_>,
        rng: &mut SubsystemRng,
    ) -> Vec<SimEvent> {
        let tick = ctx.tick;
        let now = ctx.now;
        let hazard_expiry = now + self.config.hazard_duration;
        let mut events = Vec::new();

        match kind {
            WeatherKind::Meteor => {
                let destroyed = ctx.garden.clear_plants();
                self.state.flash = self.config.flash_max;

                let blast = meteor_blast(ctx.garden, rng);
                for cell in &blast {
                    ctx.garden.add_hazard(*cell, hazard_expiry);
                }
                log::info!(
                    "tick={tick} weather: meteor destroyed {} plants, crater of {} cells",
                    destroyed.len(),
                    blast.len()
                );
                if !destroyed.is_empty() {
                    events.push(SimEvent::PlantsDestroyed { tick, cause: kind, cells: destroyed });
                }
                events.push(SimEvent::HazardsCreated {
                    tick,
                    cause: kind,
                    cells: blast,
                    expires_at: hazard_expiry,
                });
            }
            WeatherKind::Hailstorm => {
                let occupied = ctx.garden.occupied_cells();
                let kills = self.config.hail_kills.min(occupied.len());
                let mut destroyed = rng.sample(&occupied, kills);
                for cell in &destroyed {
                    ctx.garden.remove(*cell);
                }

                let mut craters = Vec::with_capacity(self.config.hail_craters);
                for _ in 0..self.config.hail_craters {
                    let cell = GridPos::new(
                        rng.index_below(ctx.garden.cols() as usize) as u32,
                        rng.index_below(ctx.garden.rows() as usize) as u32,
                    );
                    ctx.garden.add_hazard(cell, hazard_expiry);
                    if ctx.garden.remove(cell).is_some() {
                        destroyed.push(cell);
                    }
                    craters.push(cell);
                }
                log::info!(
                    "tick={tick} weather: hailstorm destroyed {} plants, {} craters",
                    destroyed.len(),
                    craters.len()
                );
                if !destroyed.is_empty() {
                    events.push(SimEvent::PlantsDestroyed { tick, cause: kind, cells: destroyed });
                }
                events.push(SimEvent::HazardsCreated {
                    tick,
                    cause: kind,
                    cells: craters,
                    expires_at: hazard_expiry,
                });
            }
            WeatherKind::Rain => {
                let bonus = self.config.rain_lifespan_bonus;
                let extended = ctx
                    .garden
                    .plants_mut()
                    .map(|p| p.extend_lifespan(now, bonus))
                    .filter(|applied| *applied)
                    .count();
                log::info!("tick={tick} weather: rain extended {extended} plants by {bonus}s");
                events.push(SimEvent::LifespanExtended { tick, plants: extended, bonus });
            }
            WeatherKind::Drought | WeatherKind::Locusts | WeatherKind::Eclipse => {}
        }
        events
    }

    fn issue_warning(&mut self, tick: Tick, now: Timestamp) -> SimEvent {
        let kind = self.state.upcoming_event;
        self.state.warning_event = Some(kind);
        self.state.event_start = now + self.config.warning_lead;
        log::info!(
            "tick={tick} weather: warning {kind}, arrives in {:.1}s",
            self.config.warning_lead
        );
        SimEvent::WarningIssued { tick, kind, arrives_at: self.state.event_start }
    }

    fn activate(
        &mut self,
        kind: WeatherKind,
        ctx: &mut TickContext<'_>,
        rng: &mut SubsystemRng,
    ) -> Vec<SimEvent> {
        self.state.warning_event = None;
        self.state.current_event = Some(kind);
        self.state.event_end =
            ctx.now + rng.uniform(self.config.duration_min, self.config.duration_max);
        log::info!(
            "tick={} weather: {kind} started, ends in {:.1}s",
            ctx.tick,
            self.state.event_end - ctx.now
        );

        let mut events = vec![SimEvent::WeatherStarted {
            tick: ctx.tick,
            kind,
            ends_at: self.state.event_end,
        }];
        events.extend(self.apply_instant(kind, ctx, rng));
        events
    }

    fn resolve(
        &mut self,
        kind: WeatherKind,
        ctx: &mut TickContext<'_>,
        rng: &mut SubsystemRng,
    ) -> SimEvent {
        ctx.garden.apply_modifiers(ctx.now, Modifiers::NEUTRAL);
        self.state.current_event = None;
        self.state.next_check =
            ctx.now + difficulty::event_cooldown(ctx.totals.score, &self.config);

        self.state.upcoming_event = self.pool[rng.weighted(&self.dist)];
        self.state.forecast =
            roll_forecast(self.state.upcoming_event, &self.pool, &self.config, rng);

        log::info!(
            "tick={} weather: {kind} ended, next check in {:.1}s, forecast {}",
            ctx.tick,
            self.state.next_check - ctx.now,
            self.state.forecast
        );
        SimEvent::WeatherEnded {
            tick: ctx.tick,
            kind,
            next_check: self.state.next_check,
            forecast: self.state.forecast.to_string(),
        }
    }
}

impl SimSubsystem for WeatherSubsystem {
    fn name(&self) -> &'static str { "weather" }

    fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        _events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        let now = ctx.now;

        self.state.flash = self.state.flash.saturating_sub(self.config.flash_decay);

        if self.state.phase() == WeatherPhase::Idle && now > self.state.next_check {
            events.push(self.issue_warning(ctx.tick, now));
        }

        if let Some(kind) = self.state.warning_event {
            if now >= self.state.event_start {
                events.extend(self.activate(kind, ctx, rng));
            }
        }

        if let Some(kind) = self.state.current_event {
            if now > self.state.event_end {
                events.push(self.resolve(kind, ctx, rng));
            }
        }

        let modifiers = self.continuous_modifiers(ctx.totals.score);
        ctx.garden.apply_modifiers(now, modifiers);

        Ok(events)
    }
}

/// Draw the forecast shown for `upcoming`:
/// unknown, truthful, or a specific wrong kind.
pub fn roll_forecast(
    upcoming: WeatherKind,
    pool: &[WeatherKind],
    cfg: &WeatherConfig,
    rng: &mut SubsystemRng,
) -> Forecast {
    let roll = rng.next_f64();
    if roll < cfg.forecast_unknown_chance {
        return Forecast::Unknown;
    }
    if roll < cfg.forecast_unknown_chance + cfg.forecast_truthful_chance {
        return Forecast::Predicted(upcoming);
    }

    let mut wrong: Vec<WeatherKind> = Vec::with_capacity(pool.len());
    for kind in pool {
        if *kind != upcoming && !wrong.contains(kind) {
            wrong.push(*kind);
        }
    }
    match rng.choose(&wrong) {
        Some(kind) => Forecast::Predicted(*kind),
        None => Forecast::Unknown,
    }
}

/// 3×3 block around a random interior cell.
fn meteor_blast(garden: &Garden, rng: &mut SubsystemRng) -> Vec<GridPos> {
    let cx = rng.range_inclusive(1, garden.cols() - 2);
    let cy = rng.range_inclusive(1, garden.rows() - 2);
    let mut cells = Vec::with_capacity(9);
    for col in cx - 1..=cx + 1 {
        for row in cy - 1..=cy + 1 {
            cells.push(GridPos::new(col, row));
        }
    }
    cells
}
