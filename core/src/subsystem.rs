//! Subsystem trait and the per-tick context.
//!
//! RULE: Every tick-driven component implements SimSubsystem.
//! The engine calls update() on each subsystem in a fixed order,
//! every tick. Execution order is documented in engine.rs.

use crate::{
    error::SimResult,
    event::SimEvent,
    garden::Garden,
    rng::SubsystemRng,
    run_state::RunTotals,
    types::{Tick, Timestamp},
};

/// State the engine lends to a subsystem for one call.
/// Nothing here may be retained past the call.
pub struct TickContext<'a> {
    pub tick:   Tick,
    pub now:    Timestamp,
    pub garden: &'a mut Garden,
    pub totals: &'a mut RunTotals,
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per tick by the engine.
    ///
    /// - `ctx`:       the tick number, `now`, and the run's mutable state
    /// - `events_in`: events emitted by earlier subsystems this tick
    /// - `rng`:       this subsystem's RNG stream
    ///
    /// Returns a vec of new events to add to the tick's event log.
    fn update(
        &mut self,
        ctx: &mut TickContext<'_>,
        events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> SimResult<Vec<SimEvent>>;
}
