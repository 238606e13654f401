//! The grid: plants by cell and hazard craters by cell.
//!
//! RULE: Only the engine owns a Garden. Subsystems receive `&mut Garden`
//! through the TickContext for the duration of one call.

use crate::{
    config::GridConfig,
    plant::{Modifiers, Plant},
    types::{GridPos, Timestamp},
};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Garden {
    cols:    u32,
    rows:    u32,
    plants:  BTreeMap<GridPos, Plant>,
    /// Cell → expiry. A cell is blocked while `now <= expiry`.
    hazards: BTreeMap<GridPos, Timestamp>,
}

impl Garden {
    pub fn new(cfg: &GridConfig) -> Self {
        Self {
            cols:    cfg.cols,
            rows:    cfg.rows,
            plants:  BTreeMap::new(),
            hazards: BTreeMap::new(),
        }
    }

    pub fn cols(&self) -> u32 { self.cols }
    pub fn rows(&self) -> u32 { self.rows }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.col < self.cols && pos.row < self.rows
    }

    // ── Plants ─────────────────────────────────────────────────

    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    pub fn plant_at(&self, pos: GridPos) -> Option<&Plant> {
        self.plants.get(&pos)
    }

    pub fn plants(&self) -> impl Iterator<Item = (&GridPos, &Plant)> {
        self.plants.iter()
    }

    pub fn plants_mut(&mut self) -> impl Iterator<Item = &mut Plant> {
        self.plants.values_mut()
    }

    pub fn occupied_cells(&self) -> Vec<GridPos> {
        self.plants.keys().copied().collect()
    }

    /// Insert a plant at its own position. Callers check `can_plant` first.
    pub fn insert(&mut self, plant: Plant) {
        self.plants.insert(plant.pos, plant);
    }

    pub fn remove(&mut self, pos: GridPos) -> Option<Plant> {
        self.plants.remove(&pos)
    }

    /// Remove every plant. Returns the cells that were occupied.
    pub fn clear_plants(&mut self) -> Vec<GridPos> {
        let cells = self.occupied_cells();
        self.plants.clear();
        cells
    }

    /// Set every plant's modifiers as of `now`.
    pub fn apply_modifiers(&mut self, now: Timestamp, modifiers: Modifiers) {
        for plant in self.plants.values_mut() {
            plant.apply_modifiers(now, modifiers);
        }
    }

    // ── Hazards ────────────────────────────────────────────────

    pub fn add_hazard(&mut self, pos: GridPos, expires_at: Timestamp) {
        if self.in_bounds(pos) {
            let entry = self.hazards.entry(pos).or_insert(expires_at);
            *entry = entry.max(expires_at);
        }
    }

    pub fn is_hazard(&self, pos: GridPos, now: Timestamp) -> bool {
        self.hazards.get(&pos).is_some_and(|expiry| now <= *expiry)
    }

    pub fn hazard_expiry(&self, pos: GridPos) -> Option<Timestamp> {
        self.hazards.get(&pos).copied()
    }

    pub fn hazards(&self) -> impl Iterator<Item = (&GridPos, &Timestamp)> {
        self.hazards.iter()
    }

    pub fn hazard_count(&self) -> usize {
        self.hazards.len()
    }

    /// Drop hazards whose expiry has passed. Returns the freed cells.
    pub fn purge_expired_hazards(&mut self, now: Timestamp) -> Vec<GridPos> {
        let expired: Vec<GridPos> = self
            .hazards
            .iter()
            .filter(|(_, expiry)| now > **expiry)
            .map(|(pos, _)| *pos)
            .collect();
        for pos in &expired {
            self.hazards.remove(pos);
        }
        expired
    }

    // ── Placement ──────────────────────────────────────────────

    /// Why a cell cannot take a new plant, if it cannot.
    pub fn placement_blocker(&self, pos: GridPos, now: Timestamp) -> Option<&'static str> {
        if !self.in_bounds(pos) {
            Some("cell out of bounds")
        } else if self.plants.contains_key(&pos) {
            Some("cell occupied")
        } else if self.is_hazard(pos, now) {
            Some("cell hazarded")
        } else {
            None
        }
    }

    pub fn can_plant(&self, pos: GridPos, now: Timestamp) -> bool {
        self.placement_blocker(pos, now).is_none()
    }
}
