//! Procedural tier generation: assigns stats to every plant archetype
//! once, at run start.
//!
//! The manifest is shuffled and dealt out tier by tier: `slots_per_tier`
//! archetypes for every tier except the last, which gets exactly one
//! fixed-stat capstone. Non-capstone stats follow geometric baselines
//! with per-item variance so same-tier plants differ.

use crate::{
    config::TierConfig,
    error::{SimError, SimResult},
    manifest::ManifestEntry,
    rng::SubsystemRng,
    types::ArchetypeName,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable stat template for one kind of plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub name:     ArchetypeName,
    pub tier:     u32,
    pub cost:     f64,
    /// Fruit per second.
    pub rate:     f64,
    /// Seconds of (drought-weighted) age before death.
    pub lifespan: f64,
    pub sprite:   String,
}

/// All archetypes of a run, keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchetypeCatalog {
    archetypes: BTreeMap<ArchetypeName, Archetype>,
    max_tier:   u32,
}

impl ArchetypeCatalog {
    pub fn from_archetypes(archetypes: impl IntoIterator<Item = Archetype>) -> Self {
        let archetypes: BTreeMap<_, _> = archetypes
            .into_iter()
            .map(|a| (a.name.clone(), a))
            .collect();
        let max_tier = archetypes.values().map(|a| a.tier).max().unwrap_or(0);
        Self { archetypes, max_tier }
    }

    pub fn get(&self, name: &str) -> Option<&Archetype> {
        self.archetypes.get(name)
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn max_tier(&self) -> u32 {
        self.max_tier
    }

    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.values()
    }

    /// Names of archetypes in exactly `tier`, in key order.
    pub fn names_in_tier(&self, tier: u32) -> Vec<ArchetypeName> {
        self.iter()
            .filter(|a| a.tier == tier)
            .map(|a| a.name.clone())
            .collect()
    }

    /// Names of archetypes at or below `tier`, in key order.
    pub fn names_up_to_tier(&self, tier: u32) -> Vec<ArchetypeName> {
        self.iter()
            .filter(|a| a.tier <= tier)
            .map(|a| a.name.clone())
            .collect()
    }
}

/// Build the run's archetype catalog from a manifest.
///
/// Fails with `ManifestTooShort` rather than reusing entries.
pub fn generate(
    manifest: &[ManifestEntry],
    cfg: &TierConfig,
    rng: &mut SubsystemRng,
) -> SimResult<ArchetypeCatalog> {
    let required = cfg.required_entries();
    if manifest.len() < required {
        return Err(SimError::ManifestTooShort { required, available: manifest.len() });
    }

    let mut deck = manifest.to_vec();
    rng.shuffle(&mut deck);
    let mut deck = deck.into_iter();

    let mut archetypes = Vec::with_capacity(required);
    for tier in 1..=cfg.tier_count {
        let capstone = tier == cfg.tier_count;
        let slots = if capstone { 1 } else { cfg.slots_per_tier };

        for _ in 0..slots {
            let entry = deck.next().ok_or(SimError::ManifestTooShort {
                required,
                available: manifest.len(),
            })?;
            let archetype = if capstone {
                Archetype {
                    name:     entry.name,
                    tier,
                    cost:     cfg.capstone_cost,
                    rate:     cfg.capstone_rate,
                    lifespan: cfg.capstone_lifespan,
                    sprite:   entry.sprite,
                }
            } else {
                roll_archetype(entry, tier, cfg, rng)
            };
            archetypes.push(archetype);
        }
    }

    let catalog = ArchetypeCatalog::from_archetypes(archetypes);
    if catalog.len() < required {
        // Duplicate names in the manifest collapse onto one key.
        return Err(SimError::InvalidConfig {
            reason: format!(
                "manifest names are not unique: {} distinct of {required} needed",
                catalog.len()
            ),
        });
    }

    log::info!(
        "tiers: generated {} archetypes across {} tiers",
        catalog.len(),
        catalog.max_tier()
    );
    Ok(catalog)
}

fn roll_archetype(
    entry: ManifestEntry,
    tier: u32,
    cfg: &TierConfig,
    rng: &mut SubsystemRng,
) -> Archetype {
    let exponent = (tier - 1) as i32;
    let base_rate = cfg.rate_base * cfg.rate_growth.powi(exponent);
    let base_cost = cfg.cost_base * cfg.cost_growth.powi(exponent);

    let rate = rng.uniform(base_rate * cfg.variance_low, base_rate * cfg.variance_high).floor();
    let cost = rng.uniform(base_cost * cfg.variance_low, base_cost * cfg.variance_high).floor();
    let lifespan = rng.range_inclusive(cfg.lifespan_min, cfg.lifespan_max);

    Archetype {
        name:     entry.name,
        tier,
        cost:     cost.max(cfg.min_cost),
        rate:     rate.max(cfg.min_rate),
        lifespan: f64::from(lifespan),
        sprite:   entry.sprite,
    }
}
