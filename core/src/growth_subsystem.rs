//! Growth subsystem: hazard expiry, harvesting and death.
//!
//! Per tick:
//!   1. Purge hazards whose expiry has passed.
//!   2. Harvest every plant; fruit goes to both balance and score.
//!   3. Cull dead plants, collected after the harvest pass so the map is
//!      never mutated while it is being iterated.
//!
//! Execution: every tick, after weather. Plants destroyed by this tick's
//! weather are already gone and yield nothing.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickContext},
    types::GridPos,
};

#[derive(Debug, Default)]
pub struct GrowthSubsystem {
    /// Fruit harvested over the whole run, for summaries.
    pub lifetime_harvest: f64,
    pub plants_died:      u64,
}

impl GrowthSubsystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SimSubsystem for GrowthSubsystem {
    fn name(&self) -> &'static str { "growth" }

    fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        _events_in: &[SimEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>> {
        let tick = ctx.tick;
        let now = ctx.now;
        let mut events = Vec::new();

        let expired = ctx.garden.purge_expired_hazards(now);
        if !expired.is_empty() {
            log::debug!("tick={tick} growth: {} hazards expired", expired.len());
            events.push(SimEvent::HazardsExpired { tick, cells: expired });
        }

        let mut harvested = 0.0;
        let mut dead: Vec<GridPos> = Vec::new();
        let plant_count = ctx.garden.plant_count();
        for plant in ctx.garden.plants_mut() {
            harvested += plant.harvest(now);
            if plant.is_dead(now) {
                dead.push(plant.pos);
            }
        }
        ctx.totals.credit(harvested);
        self.lifetime_harvest += harvested;

        if plant_count > 0 {
            events.push(SimEvent::Harvested { tick, amount: harvested, plants: plant_count });
        }

        for cell in dead {
            if let Some(plant) = ctx.garden.remove(cell) {
                self.plants_died += 1;
                log::debug!("tick={tick} growth: {} at {cell} died", plant.archetype);
                events.push(SimEvent::PlantDied { tick, cell, archetype: plant.archetype });
            }
        }

        Ok(events)
    }
}
