//! The event log: everything that happened during a tick.
//!
//! RULE: Subsystems report what they changed ONLY through events.
//! The engine concatenates each subsystem's events in execution order
//! and returns them from `tick()`; the runner may persist them.

use crate::types::{ArchetypeName, GridPos, RunId, Tick, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every event emitted during simulation.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
        now: Timestamp,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
        archetypes: usize,
    },

    // ── Weather events ─────────────────────────────
    WarningIssued {
        tick: Tick,
        kind: WeatherKind,
        arrives_at: Timestamp,
    },
    WeatherStarted {
        tick: Tick,
        kind: WeatherKind,
        ends_at: Timestamp,
    },
    WeatherEnded {
        tick: Tick,
        kind: WeatherKind,
        next_check: Timestamp,
        forecast: String,
    },
    PlantsDestroyed {
        tick: Tick,
        cause: WeatherKind,
        cells: Vec<GridPos>,
    },
    HazardsCreated {
        tick: Tick,
        cause: WeatherKind,
        cells: Vec<GridPos>,
        expires_at: Timestamp,
    },
    LifespanExtended {
        tick: Tick,
        plants: usize,
        bonus: f64,
    },

    // ── Growth events ──────────────────────────────
    HazardsExpired {
        tick: Tick,
        cells: Vec<GridPos>,
    },
    Harvested {
        tick: Tick,
        amount: f64,
        plants: usize,
    },
    PlantDied {
        tick: Tick,
        cell: GridPos,
        archetype: ArchetypeName,
    },

    // ── Run events ─────────────────────────────────
    GardenEmptied {
        tick: Tick,
        timeout: f64,
    },
    GameOver {
        tick: Tick,
        score: f64,
    },

    // ── Shop events ────────────────────────────────
    TierUnlocked {
        tick: Tick,
        tier: u32,
    },
    OfferingsRefreshed {
        tick: Tick,
        reason: RefreshReason,
        offerings: Vec<ArchetypeName>,
    },

    // ── Player command events ──────────────────────
    PurchaseCompleted {
        tick: Tick,
        archetype: ArchetypeName,
        cost: f64,
    },
    PlantPlaced {
        tick: Tick,
        archetype: ArchetypeName,
        cell: GridPos,
    },
    Rerolled {
        tick: Tick,
        cost: f64,
        next_cost: f64,
    },
    ShopToggled {
        tick: Tick,
        open: bool,
    },
    CommandRejected {
        tick: Tick,
        command: String,
        reason: String,
    },
}

impl SimEvent {
    /// Stable string name of the variant, used for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickStarted { .. }        => "tick_started",
            Self::TickCompleted { .. }      => "tick_completed",
            Self::RunInitialized { .. }     => "run_initialized",
            Self::WarningIssued { .. }      => "warning_issued",
            Self::WeatherStarted { .. }     => "weather_started",
            Self::WeatherEnded { .. }       => "weather_ended",
            Self::PlantsDestroyed { .. }    => "plants_destroyed",
            Self::HazardsCreated { .. }     => "hazards_created",
            Self::LifespanExtended { .. }   => "lifespan_extended",
            Self::HazardsExpired { .. }     => "hazards_expired",
            Self::Harvested { .. }          => "harvested",
            Self::PlantDied { .. }          => "plant_died",
            Self::GardenEmptied { .. }      => "garden_emptied",
            Self::GameOver { .. }           => "game_over",
            Self::TierUnlocked { .. }       => "tier_unlocked",
            Self::OfferingsRefreshed { .. } => "offerings_refreshed",
            Self::PurchaseCompleted { .. }  => "purchase_completed",
            Self::PlantPlaced { .. }        => "plant_placed",
            Self::Rerolled { .. }           => "rerolled",
            Self::ShopToggled { .. }        => "shop_toggled",
            Self::CommandRejected { .. }    => "command_rejected",
        }
    }

    /// Which part of the run produced the event, for the subsystem column.
    pub fn source(&self) -> &'static str {
        match self {
            Self::WarningIssued { .. }
            | Self::WeatherStarted { .. }
            | Self::WeatherEnded { .. }
            | Self::PlantsDestroyed { .. }
            | Self::HazardsCreated { .. }
            | Self::LifespanExtended { .. } => "weather",
            Self::HazardsExpired { .. }
            | Self::Harvested { .. }
            | Self::PlantDied { .. } => "growth",
            Self::TierUnlocked { .. }
            | Self::OfferingsRefreshed { .. }
            | Self::ShopToggled { .. } => "shop",
            Self::PurchaseCompleted { .. }
            | Self::PlantPlaced { .. }
            | Self::Rerolled { .. }
            | Self::CommandRejected { .. } => "player",
            Self::TickStarted { .. }
            | Self::TickCompleted { .. }
            | Self::RunInitialized { .. }
            | Self::GardenEmptied { .. }
            | Self::GameOver { .. } => "engine",
        }
    }
}

/// Environmental event kinds in the weather pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WeatherKind {
    Drought,
    Rain,
    Hailstorm,
    Locusts,
    Eclipse,
    Meteor,
}

impl WeatherKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Drought   => "DROUGHT",
            Self::Rain      => "RAIN",
            Self::Hailstorm => "HAILSTORM",
            Self::Locusts   => "LOCUSTS",
            Self::Eclipse   => "ECLIPSE",
            Self::Meteor    => "METEOR",
        }
    }
}

impl fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why the shop's offerings changed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefreshReason {
    Opening,
    TierUnlocked,
    Scheduled,
    Reroll,
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}

impl EventLogEntry {
    pub fn from_event(run_id: &str, tick: Tick, event: &SimEvent) -> serde_json::Result<Self> {
        Ok(Self {
            id:         None,
            run_id:     run_id.to_string(),
            tick,
            subsystem:  event.source().to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        })
    }
}
