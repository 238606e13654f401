//! Tier generation tests: manifest dealing, stat baselines, capstone.

use garden_core::{
    config::{SimConfig, TierConfig},
    error::SimError,
    manifest::{synthetic_manifest, ManifestEntry},
    rng::SubsystemRng,
    tiers::{self, ArchetypeCatalog},
};
use std::collections::BTreeSet;

fn generate(seed: u64) -> ArchetypeCatalog {
    let cfg = SimConfig::default_test().tiers;
    let manifest = synthetic_manifest(cfg.required_entries());
    let mut rng = SubsystemRng::new(seed, 0);
    tiers::generate(&manifest, &cfg, &mut rng).expect("generate tiers")
}

/// Canonical layout: 9 tiers of 3 plus one capstone = 28 archetypes.
#[test]
fn every_tier_gets_its_slots_and_the_last_gets_one() {
    let catalog = generate(0xA11CE);
    assert_eq!(catalog.len(), 28, "Expected 9 * 3 + 1 archetypes");
    assert_eq!(catalog.max_tier(), 10);

    for tier in 1..=9 {
        assert_eq!(
            catalog.names_in_tier(tier).len(),
            3,
            "Tier {tier} should have exactly 3 archetypes"
        );
    }
    assert_eq!(catalog.names_in_tier(10).len(), 1, "Capstone tier holds a single archetype");
}

/// The capstone has fixed stats regardless of the seed.
#[test]
fn capstone_stats_are_fixed() {
    for seed in [1, 2, 3] {
        let catalog = generate(seed);
        let name = &catalog.names_in_tier(10)[0];
        let capstone = catalog.get(name).expect("capstone present");
        assert_eq!(capstone.rate, 100_000.0);
        assert_eq!(capstone.cost, 500_000.0);
        assert_eq!(capstone.lifespan, 5.0);
    }
}

/// Non-capstone stats stay within variance of the geometric baseline,
/// are whole numbers, and respect the floors.
#[test]
fn stats_follow_baselines_within_variance() {
    let cfg = TierConfig::default();
    let catalog = generate(0xBEEF);

    for archetype in catalog.iter().filter(|a| a.tier < 10) {
        let exponent = (archetype.tier - 1) as i32;
        let base_rate = cfg.rate_base * cfg.rate_growth.powi(exponent);
        let base_cost = cfg.cost_base * cfg.cost_growth.powi(exponent);

        assert!(archetype.rate >= cfg.min_rate && archetype.cost >= cfg.min_cost);
        assert_eq!(archetype.rate.fract(), 0.0, "{} rate not floored", archetype.name);
        assert_eq!(archetype.cost.fract(), 0.0, "{} cost not floored", archetype.name);
        assert!(
            archetype.rate <= (base_rate * 1.15).floor() && archetype.rate >= (base_rate * 0.85).floor(),
            "{} rate {} outside variance of {base_rate}",
            archetype.name,
            archetype.rate
        );
        assert!(
            archetype.cost <= (base_cost * 1.15).floor() && archetype.cost >= (base_cost * 0.85).floor(),
            "{} cost {} outside variance of {base_cost}",
            archetype.name,
            archetype.cost
        );
        assert!(
            (10.0..=40.0).contains(&archetype.lifespan),
            "{} lifespan {} outside [10, 40]",
            archetype.name,
            archetype.lifespan
        );
    }
}

/// Every manifest entry is used at most once.
#[test]
fn names_are_not_reused() {
    let catalog = generate(77);
    let names: BTreeSet<_> = catalog.iter().map(|a| a.name.clone()).collect();
    assert_eq!(names.len(), catalog.len());
}

/// Same seed, same assignment; the shuffle is seeded.
#[test]
fn generation_is_deterministic_per_seed() {
    let a = generate(123);
    let b = generate(123);
    let names_a: Vec<_> = a.iter().map(|x| (x.name.clone(), x.tier, x.rate, x.cost)).collect();
    let names_b: Vec<_> = b.iter().map(|x| (x.name.clone(), x.tier, x.rate, x.cost)).collect();
    assert_eq!(names_a, names_b);
}

/// A short manifest is a configuration error, not a silent fallback.
#[test]
fn short_manifest_is_rejected() {
    let cfg = TierConfig::default();
    let manifest = synthetic_manifest(cfg.required_entries() - 1);
    let mut rng = SubsystemRng::new(9, 0);

    match tiers::generate(&manifest, &cfg, &mut rng) {
        Err(SimError::ManifestTooShort { required, available }) => {
            assert_eq!(required, 28);
            assert_eq!(available, 27);
        }
        other => panic!("Expected ManifestTooShort, got {other:?}"),
    }
}

/// Duplicate names would collapse in the catalog and are rejected.
#[test]
fn duplicate_names_are_rejected() {
    let cfg = TierConfig { tier_count: 2, slots_per_tier: 2, ..TierConfig::default() };
    let manifest = vec![
        ManifestEntry::new("Fern", "a.png"),
        ManifestEntry::new("Fern", "b.png"),
        ManifestEntry::new("Moss", "c.png"),
    ];
    let mut rng = SubsystemRng::new(4, 0);
    let result = tiers::generate(&manifest, &cfg, &mut rng);
    assert!(
        matches!(result, Err(SimError::InvalidConfig { .. })),
        "Expected duplicate names to be rejected, got {result:?}"
    );
}

/// Extra manifest rows are fine; only the needed number are dealt.
#[test]
fn longer_manifest_uses_only_what_it_needs() {
    let cfg = TierConfig::default();
    let manifest = synthetic_manifest(cfg.required_entries() + 12);
    let mut rng = SubsystemRng::new(5, 0);
    let catalog = tiers::generate(&manifest, &cfg, &mut rng).expect("generate");
    assert_eq!(catalog.len(), cfg.required_entries());
}
