//! Weather scheduler tests: lifecycle, instant effects, forecast odds,
//! continuous modifiers.

use garden_core::{
    config::{GridConfig, RunConfig, WeatherConfig},
    event::{SimEvent, WeatherKind},
    garden::Garden,
    plant::Plant,
    rng::SubsystemRng,
    run_state::RunTotals,
    subsystem::{SimSubsystem, TickContext},
    tiers::Archetype,
    types::GridPos,
    weather_subsystem::{roll_forecast, Forecast, WeatherPhase, WeatherSubsystem},
};

struct Bench {
    garden:  Garden,
    totals:  RunTotals,
    weather: WeatherSubsystem,
    rng:     SubsystemRng,
    tick:    u64,
}

impl Bench {
    fn new(seed: u64) -> Self {
        init_logging();
        let mut rng = SubsystemRng::new(seed, 1);
        let weather = WeatherSubsystem::new(WeatherConfig::default(), 0.0, &mut rng)
            .expect("weather subsystem");
        Self {
            garden: Garden::new(&GridConfig::default()),
            totals: RunTotals::new(&RunConfig::default()),
            weather,
            rng,
            tick: 0,
        }
    }

    fn plant(&mut self, col: u32, row: u32, lifespan: f64, now: f64) {
        let archetype = Archetype {
            name:     format!("p{col}-{row}"),
            tier:     1,
            cost:     50.0,
            rate:     5.0,
            lifespan,
            sprite:   String::new(),
        };
        self.garden.insert(Plant::new(&archetype, GridPos::new(col, row), now));
    }

    fn fill(&mut self, now: f64) {
        for col in 0..self.garden.cols() {
            for row in 0..self.garden.rows() {
                self.plant(col, row, 1_000.0, now);
            }
        }
    }

    fn step(&mut self, now: f64) -> Vec<SimEvent> {
        self.tick += 1;
        let mut ctx = TickContext {
            tick:   self.tick,
            now,
            garden: &mut self.garden,
            totals: &mut self.totals,
        };
        self.weather.update(&mut ctx, &[], &mut self.rng).expect("weather update")
    }

    fn instant(&mut self, kind: WeatherKind, now: f64) -> Vec<SimEvent> {
        let mut ctx = TickContext {
            tick:   self.tick,
            now,
            garden: &mut self.garden,
            totals: &mut self.totals,
        };
        self.weather.apply_instant(kind, &mut ctx, &mut self.rng)
    }
}

/// A meteor on a 3-plant garden clears every plant and craters a 3x3 block.
#[test]
fn meteor_clears_garden_and_craters_three_by_three() {
    let mut bench = Bench::new(0x5EED);
    bench.plant(0, 0, 30.0, 0.0);
    bench.plant(4, 4, 30.0, 0.0);
    bench.plant(7, 2, 30.0, 0.0);

    let events = bench.instant(WeatherKind::Meteor, 20.0);

    assert!(bench.garden.is_empty(), "Meteor must destroy every plant");
    assert_eq!(bench.garden.hazard_count(), 9, "Meteor crater must be exactly 9 cells");

    let cells: Vec<GridPos> = bench.garden.hazards().map(|(c, _)| *c).collect();
    let min_col = cells.iter().map(|c| c.col).min().unwrap();
    let max_col = cells.iter().map(|c| c.col).max().unwrap();
    let min_row = cells.iter().map(|c| c.row).min().unwrap();
    let max_row = cells.iter().map(|c| c.row).max().unwrap();
    assert_eq!((max_col - min_col, max_row - min_row), (2, 2), "Crater is not a 3x3 block");

    for (_, expiry) in bench.garden.hazards() {
        assert!(*expiry > 20.0, "Crater expiry {expiry} is not in the future");
    }
    assert_eq!(bench.weather.state.flash, 255);
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::PlantsDestroyed { cause: WeatherKind::Meteor, cells, .. } if cells.len() == 3
    )));
}

/// Hail kills at least three plants and leaves no plant on a crater.
#[test]
fn hailstorm_kills_and_craters() {
    let mut bench = Bench::new(0x4A11);
    bench.fill(0.0);
    let before = bench.garden.plant_count();

    let events = bench.instant(WeatherKind::Hailstorm, 5.0);

    let destroyed = events
        .iter()
        .find_map(|e| match e {
            SimEvent::PlantsDestroyed { cells, .. } => Some(cells.len()),
            _ => None,
        })
        .expect("hail on a full garden destroys plants");
    assert!(destroyed >= 3, "Expected at least 3 kills, got {destroyed}");
    assert_eq!(bench.garden.plant_count(), before - destroyed);

    let craters = bench.garden.hazard_count();
    assert!((1..=6).contains(&craters), "Expected 1..=6 crater cells, got {craters}");
    for (cell, _) in bench.garden.hazards() {
        assert!(bench.garden.plant_at(*cell).is_none(), "Plant survived on crater {cell}");
    }
}

/// Hail on a sparse garden kills only what exists.
#[test]
fn hailstorm_on_small_garden_kills_everything_available() {
    let mut bench = Bench::new(8);
    bench.plant(1, 1, 100.0, 0.0);
    bench.instant(WeatherKind::Hailstorm, 1.0);
    assert!(bench.garden.is_empty());
}

/// Rain extends living plants by five seconds and skips dead ones.
#[test]
fn rain_extends_only_living_plants() {
    let mut bench = Bench::new(11);
    bench.plant(0, 0, 20.0, 0.0);
    bench.plant(1, 0, 1.0, 0.0);

    let events = bench.instant(WeatherKind::Rain, 5.0);

    assert!(matches!(
        events.as_slice(),
        [SimEvent::LifespanExtended { plants: 1, bonus, .. }] if *bonus == 5.0
    ));
    let alive = bench.garden.plant_at(GridPos::new(0, 0)).unwrap();
    assert_eq!(alive.lifespan(), 25.0);
    let dead = bench.garden.plant_at(GridPos::new(1, 0)).unwrap();
    assert_eq!(dead.lifespan(), 1.0);
}

/// Warning and active are never set together, across many cycles.
#[test]
fn warning_and_active_are_mutually_exclusive() {
    let mut bench = Bench::new(0xC0FFEE);
    let mut started = 0;
    let mut ended = 0;

    for i in 1..=8_000 {
        let now = f64::from(i) * 0.25;
        for event in bench.step(now) {
            match event {
                SimEvent::WeatherStarted { .. } => started += 1,
                SimEvent::WeatherEnded { .. } => ended += 1,
                _ => {}
            }
        }
        let state = &bench.weather.state;
        assert!(
            !(state.warning_event.is_some() && state.current_event.is_some()),
            "Warning and active both set at t={now}"
        );
    }
    assert!(started >= 10, "Expected many events in 2000s, got {started}");
    assert!(ended >= started - 1);
}

/// Full lifecycle of a staged event: idle, warning, active, idle.
#[test]
fn staged_event_walks_the_lifecycle() {
    let mut bench = Bench::new(21);
    bench.weather.force_upcoming(WeatherKind::Eclipse, &mut bench.rng);
    bench.plant(2, 2, 100.0, 0.0);

    assert!(bench.step(10.0).is_empty(), "No warning until strictly after the first check");
    assert_eq!(bench.weather.state.phase(), WeatherPhase::Idle);
    assert_eq!(bench.weather.idle_countdown(4.0), Some(6.0));

    let events = bench.step(10.5);
    assert!(matches!(
        events.as_slice(),
        [SimEvent::WarningIssued { kind: WeatherKind::Eclipse, arrives_at, .. }] if *arrives_at == 15.5
    ));
    assert_eq!(bench.weather.warning_countdown(12.5), Some(3.0));
    assert_eq!(bench.weather.idle_countdown(12.5), None);

    let events = bench.step(15.5);
    let ends_at = events
        .iter()
        .find_map(|e| match e {
            SimEvent::WeatherStarted { kind: WeatherKind::Eclipse, ends_at, .. } => Some(*ends_at),
            _ => None,
        })
        .expect("eclipse started");
    assert!((20.5..=25.5).contains(&ends_at), "Duration outside [5, 10]: ends at {ends_at}");
    assert_eq!(bench.weather.state.phase(), WeatherPhase::Active);
    assert!(
        bench.garden.plant_at(GridPos::new(2, 2)).unwrap().modifiers().paused,
        "Eclipse must pause plants while active"
    );

    let events = bench.step(ends_at + 0.1);
    assert!(events.iter().any(|e| matches!(e, SimEvent::WeatherEnded { kind: WeatherKind::Eclipse, .. })));
    assert_eq!(bench.weather.state.phase(), WeatherPhase::Idle);
    assert!(!bench.garden.plant_at(GridPos::new(2, 2)).unwrap().modifiers().paused);
    let cooldown = bench.weather.state.next_check - (ends_at + 0.1);
    assert!((cooldown - 60.0).abs() < 1e-9, "Expected 60s cooldown at score 0, got {cooldown}");
}

/// At huge scores the post-event cooldown sits at its 15s floor.
#[test]
fn cooldown_floors_at_high_score() {
    let mut bench = Bench::new(31);
    bench.totals.credit(1e12);
    bench.weather.force_upcoming(WeatherKind::Drought, &mut bench.rng);

    bench.step(10.5);
    bench.step(15.5);
    let end = bench.weather.state.event_end;
    bench.step(end + 1.0);
    let cooldown = bench.weather.state.next_check - (end + 1.0);
    assert!((cooldown - 15.0).abs() < 1e-9, "Expected 15s floor, got {cooldown}");
}

/// Forecast odds: about 50% unknown, 40% right, 10% a specific wrong kind.
#[test]
fn forecast_distribution_matches_odds() {
    let cfg = WeatherConfig::default();
    let pool: Vec<WeatherKind> = cfg.pool.iter().map(|w| w.kind).collect();
    let mut rng = SubsystemRng::new(0xF0CA57, 1);

    const SAMPLES: u32 = 20_000;
    let (mut unknown, mut correct, mut wrong) = (0u32, 0u32, 0u32);
    for _ in 0..SAMPLES {
        match roll_forecast(WeatherKind::Hailstorm, &pool, &cfg, &mut rng) {
            Forecast::Unknown => unknown += 1,
            Forecast::Predicted(WeatherKind::Hailstorm) => correct += 1,
            Forecast::Predicted(_) => wrong += 1,
        }
    }

    let share = |n: u32| f64::from(n) / f64::from(SAMPLES);
    assert!((share(unknown) - 0.5).abs() < 0.02, "Unknown share {}", share(unknown));
    assert!((share(correct) - 0.4).abs() < 0.02, "Correct share {}", share(correct));
    assert!((share(wrong) - 0.1).abs() < 0.015, "Wrong share {}", share(wrong));
}

/// Drought severity grows with score up to its cap; locusts fade to zero.
#[test]
fn continuous_modifiers_scale_with_score() {
    let mut bench = Bench::new(41);

    bench.weather.state.current_event = Some(WeatherKind::Drought);
    assert_eq!(bench.weather.continuous_modifiers(0.0).drought_mult, 3.0);
    assert_eq!(bench.weather.continuous_modifiers(200_000.0).drought_mult, 6.0);
    assert_eq!(bench.weather.continuous_modifiers(1e9).drought_mult, 10.5);

    bench.weather.state.current_event = Some(WeatherKind::Locusts);
    assert_eq!(bench.weather.continuous_modifiers(250_000.0).locust_mult, 0.5);
    assert_eq!(bench.weather.continuous_modifiers(600_000.0).locust_mult, 0.0);

    bench.weather.state.current_event = Some(WeatherKind::Eclipse);
    assert!(bench.weather.continuous_modifiers(0.0).paused);
}

/// The meteor flash decays by five every tick.
#[test]
fn flash_decays_each_tick() {
    let mut bench = Bench::new(51);
    bench.instant(WeatherKind::Meteor, 1.0);
    bench.step(1.1);
    bench.step(1.2);
    assert_eq!(bench.weather.state.flash, 245);
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
