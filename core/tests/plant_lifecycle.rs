//! Plant lifecycle tests: lazy yield, pause, drought aging, death.

use garden_core::{
    plant::{Modifiers, Plant},
    tiers::Archetype,
    types::GridPos,
};

const TOLERANCE: f64 = 1e-9;

fn archetype(rate: f64, lifespan: f64) -> Archetype {
    Archetype {
        name:     "fern".to_string(),
        tier:     1,
        cost:     50.0,
        rate,
        lifespan,
        sprite:   "fern.png".to_string(),
    }
}

fn plant(rate: f64, lifespan: f64) -> Plant {
    Plant::new(&archetype(rate, lifespan), GridPos::new(0, 0), 0.0)
}

fn paused() -> Modifiers {
    Modifiers { paused: true, ..Modifiers::NEUTRAL }
}

/// Rate 5, lifespan 20: ten seconds without a harvest yields 50 and uses half the life.
#[test]
fn ten_seconds_yields_fifty_and_half_life() {
    let mut p = plant(5.0, 20.0);

    let yielded = p.harvest(10.0);
    assert!((yielded - 50.0).abs() < TOLERANCE, "Expected 50 fruit, got {yielded}");

    let ratio = p.life_ratio(10.0);
    assert!((ratio - 0.5).abs() < TOLERANCE, "Expected life ratio 0.5, got {ratio}");
    assert!(!p.is_dead(10.0));
}

/// Harvest frequency must not change the total: one harvest after 12s
/// equals any irregular schedule that also spans 12s.
#[test]
fn yield_is_independent_of_harvest_schedule() {
    let mut once = plant(7.0, 100.0);
    let total_once = once.harvest(12.0);

    let mut often = plant(7.0, 100.0);
    let schedule = [0.1, 0.35, 1.0, 1.05, 4.2, 4.2, 7.77, 11.0, 12.0];
    let total_often: f64 = schedule.iter().map(|t| often.harvest(*t)).sum();

    assert!(
        (total_once - total_often).abs() < 1e-6,
        "Schedules diverged: once={total_once}, often={total_often}"
    );
}

/// Yield stays rate-neutral under a constant locust multiplier too.
#[test]
fn locust_multiplier_scales_yield_uniformly() {
    let locusts = Modifiers { locust_mult: 0.25, ..Modifiers::NEUTRAL };

    let mut a = plant(8.0, 100.0);
    a.apply_modifiers(0.0, locusts);
    let total_a = a.harvest(10.0);

    let mut b = plant(8.0, 100.0);
    b.apply_modifiers(0.0, locusts);
    let total_b: f64 = (1..=20).map(|i| b.harvest(f64::from(i) * 0.5)).sum();

    assert!((total_a - 20.0).abs() < TOLERANCE, "Expected 8 * 10 * 0.25 = 20, got {total_a}");
    assert!((total_a - total_b).abs() < 1e-6);
}

/// While paused, age and yield freeze; resuming does not credit the pause.
#[test]
fn pause_freezes_age_and_yield() {
    let mut p = plant(5.0, 20.0);
    p.harvest(2.0);
    p.apply_modifiers(2.0, paused());

    assert_eq!(p.harvest(6.0), 0.0, "Paused harvest must return 0");
    let age_paused = p.age();
    p.advance(8.0);
    assert!(
        (p.age() - age_paused).abs() < TOLERANCE,
        "Age advanced while paused: {} -> {}",
        age_paused,
        p.age()
    );

    p.apply_modifiers(8.0, Modifiers::NEUTRAL);
    let after = p.harvest(9.0);
    assert!(
        (after - 5.0).abs() < TOLERANCE,
        "Only the second after resuming should yield, got {after}"
    );
    p.advance(9.0);
    assert!((p.age() - 3.0).abs() < TOLERANCE, "Expected age 3 (2 before + 1 after), got {}", p.age());
}

/// A harvest that lands in the middle of a pause resets the harvest clock.
#[test]
fn harvest_while_paused_resets_harvest_clock() {
    let mut p = plant(10.0, 50.0);
    p.apply_modifiers(0.0, paused());
    assert_eq!(p.harvest(5.0), 0.0);
    p.apply_modifiers(5.0, Modifiers::NEUTRAL);
    let yielded = p.harvest(6.0);
    assert!((yielded - 10.0).abs() < TOLERANCE, "Expected one second of yield, got {yielded}");
}

/// Drought speeds aging only from the moment it is applied.
#[test]
fn drought_ages_faster_from_application_onward() {
    let mut p = plant(1.0, 20.0);
    p.apply_modifiers(4.0, Modifiers { drought_mult: 3.0, ..Modifiers::NEUTRAL });
    p.advance(6.0);
    assert!(
        (p.age() - 10.0).abs() < TOLERANCE,
        "Expected 4s normal + 2s at x3 = 10, got {}",
        p.age()
    );
    assert!(!p.is_dead(6.0));
    // 10 more age units are needed at x3, i.e. just over 3.33s.
    assert!(p.is_dead(9.5), "Plant should be dead after drought pushes age past lifespan");
}

/// Once dead, a plant stays dead whatever happens to its modifiers.
#[test]
fn death_is_permanent() {
    let mut p = plant(1.0, 10.0);
    assert!(!p.is_dead(10.0), "Age equal to lifespan is still alive");
    assert!(p.is_dead(10.5));

    p.apply_modifiers(11.0, paused());
    assert!(p.is_dead(12.0), "Pausing must not revive a dead plant");
    p.apply_modifiers(13.0, Modifiers::NEUTRAL);
    assert!(p.is_dead(13.0));

    assert!(!p.extend_lifespan(13.0, 5.0), "Rain must not revive a dead plant");
    assert!(p.is_dead(13.0));
}

/// Rain-style lifespan bonus keeps a living plant alive longer.
#[test]
fn extend_lifespan_delays_death() {
    let mut p = plant(1.0, 10.0);
    assert!(p.extend_lifespan(9.0, 5.0));
    assert!((p.lifespan() - 15.0).abs() < TOLERANCE);
    assert!(!p.is_dead(14.0));
    assert!(p.is_dead(15.5));
}

/// Querying twice at the same time is idempotent.
#[test]
fn repeated_queries_do_not_double_count() {
    let mut p = plant(2.0, 30.0);
    let first = p.life_ratio(6.0);
    let second = p.life_ratio(6.0);
    assert_eq!(first, second);
    p.advance(6.0);
    assert!((p.age() - 6.0).abs() < TOLERANCE);
}
