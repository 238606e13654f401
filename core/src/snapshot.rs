//! Read-only projection of a run for the rendering layer.
//!
//! A snapshot is a plain serde value: everything a frame needs to draw
//! the garden, side panel and shop, computed at a given `now`.

use crate::{
    event::WeatherKind,
    types::{ArchetypeName, GridPos, RunId, Tick, Timestamp},
    weather_subsystem::WeatherPhase,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantView {
    pub cell:       GridPos,
    pub archetype:  ArchetypeName,
    pub sprite:     String,
    pub life_ratio: f64,
    pub paused:     bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardView {
    pub cell:       GridPos,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingView {
    pub slot:      usize,
    pub archetype: ArchetypeName,
    pub tier:      u32,
    pub cost:      f64,
    pub affordable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopView {
    pub is_open:      bool,
    pub tier:         u32,
    pub max_tier:     u32,
    pub offerings:    Vec<OfferingView>,
    pub reroll_cost:  f64,
    pub inflation:    f64,
    pub next_refresh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherView {
    pub phase:        WeatherPhase,
    pub warning:      Option<WeatherKind>,
    pub active:       Option<WeatherKind>,
    /// Seconds until the next phase change: warning check, arrival or end.
    pub countdown:    Option<f64>,
    pub forecast:     String,
    pub flash:        u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GardenSnapshot {
    pub run_id:          RunId,
    pub tick:            Tick,
    pub now:             Timestamp,
    pub cols:            u32,
    pub rows:            u32,
    pub plants:          Vec<PlantView>,
    pub hazards:         Vec<HazardView>,
    pub balance:         f64,
    pub score:           f64,
    pub inventory:       Vec<(ArchetypeName, u32)>,
    pub shop:            ShopView,
    pub weather:         WeatherView,
    /// Seconds left before the empty garden ends the run.
    pub empty_countdown: Option<f64>,
    pub game_over:       bool,
}

impl GardenSnapshot {
    pub fn plant_at(&self, cell: GridPos) -> Option<&PlantView> {
        self.plants.iter().find(|p| p.cell == cell)
    }

    pub fn is_hazard(&self, cell: GridPos) -> bool {
        self.hazards.iter().any(|h| h.cell == cell && h.expires_at >= self.now)
    }
}
