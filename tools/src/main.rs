//! garden-runner: headless runner for the garden simulation.
//!
//! Usage:
//!   garden-runner --manifest assets/plants.csv --seed 12345 --seconds 600 --db scores.db
//!   garden-runner --manifest assets/plants.csv --config garden.json --log-events
//!   garden-runner --synthetic-manifest --ipc-mode
//!
//! Headless mode plays with a greedy autopilot on a manual clock.
//! IPC mode reads one JSON command per line on stdin and answers each
//! with one JSON state line on stdout.

use anyhow::{Context, Result};
use garden_core::{
    clock::{Clock, ManualClock},
    command::PlayerCommand,
    config::SimConfig,
    engine::SimEngine,
    event::{EventLogEntry, SimEvent},
    manifest::{self, ManifestEntry},
    rng::RngBank,
    snapshot::GardenSnapshot,
    store::{HighScoreStore, SimStore},
    types::GridPos,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick {
        seconds: f64,
    },
    Command {
        command: PlayerCommand,
    },
    Restart,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    state:      GardenSnapshot,
    events:     &'a [SimEvent],
    high_score: u64,
}

struct Session {
    engine:     SimEngine,
    store:      SimStore,
    clock:      ManualClock,
    step:       f64,
    log_events: bool,
    recorded:   bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", RngBank::from_entropy().master_seed());
    let seconds = parse_arg(&args, "--seconds", 300.0f64);
    let step = parse_arg(&args, "--step", 0.5f64);
    let ipc_mode = has_flag(&args, "--ipc-mode");
    let log_events = has_flag(&args, "--log-events");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");

    let config = match string_arg(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let manifest = load_manifest(&args, &config)?;

    if !ipc_mode {
        println!("Garden idle sim: garden-runner");
        println!("  seed:      {seed}");
        println!("  seconds:   {seconds}");
        println!("  step:      {step}");
        println!("  db:        {db}");
        println!("  plants:    {}", manifest.len());
        println!();
    }

    let store = SimStore::open(db)?;
    store.migrate()?;

    let run_id = format!("run-{seed}-{}", chrono::Utc::now().timestamp());
    let clock = ManualClock::starting_at(0.0);
    let engine = SimEngine::new(run_id, seed, config, manifest, clock.now())?;

    let mut session = Session {
        engine,
        store,
        clock,
        step: step.max(0.01),
        log_events,
        recorded: false,
    };
    session.begin_run()?;

    if ipc_mode {
        run_ipc_loop(&mut session)?;
    } else {
        run_headless(&mut session, seconds)?;
        session.record_score()?;
        print_summary(&session)?;
    }

    Ok(())
}

impl Session {
    fn begin_run(&mut self) -> Result<()> {
        self.store
            .insert_run(&self.engine.run_id, self.engine.seed(), env!("CARGO_PKG_VERSION"))?;
        self.recorded = false;
        let startup = self.engine.startup_events();
        self.persist(&startup)
    }

    fn persist(&self, events: &[SimEvent]) -> Result<()> {
        if !self.log_events {
            return Ok(());
        }
        let tick = self.engine.current_tick();
        for event in events {
            let entry = EventLogEntry::from_event(&self.engine.run_id, tick, event)?;
            self.store.append_event(&entry)?;
        }
        Ok(())
    }

    /// Advance the manual clock by `seconds`, ticking every `step`.
    fn advance(&mut self, seconds: f64, autoplay: bool) -> Result<Vec<SimEvent>> {
        let target = self.clock.now() + seconds.max(0.0);
        let mut events = Vec::new();
        while self.clock.now() < target && !self.engine.is_game_over() {
            let now = self.clock.advance(self.step.min(target - self.clock.now()));
            let tick_events = self.engine.tick(now)?;
            self.persist(&tick_events)?;
            events.extend(tick_events);

            if autoplay {
                let played = autopilot(&mut self.engine, now);
                self.persist(&played)?;
                events.extend(played);
            }
        }
        if self.engine.is_game_over() {
            self.record_score()?;
        }
        Ok(events)
    }

    fn record_score(&mut self) -> Result<()> {
        if self.recorded {
            return Ok(());
        }
        let score = self.engine.totals().score.floor().max(0.0) as u64;
        let is_best = self.store.record_score(&self.engine.run_id, score)?;
        if is_best {
            log::info!("runner: new high score {score} ({})", self.engine.run_id);
        }
        self.recorded = true;
        Ok(())
    }

    fn restart(&mut self) -> Result<()> {
        self.record_score()?;
        self.engine.restart(self.clock.now())?;
        self.begin_run()
    }
}

fn run_headless(session: &mut Session, seconds: f64) -> Result<()> {
    let events = session.advance(seconds, true)?;
    log::info!(
        "runner: headless run finished at t={:.1}s with {} events",
        session.clock.now(),
        events.len()
    );
    Ok(())
}

fn run_ipc_loop(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let events = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => Vec::new(),
            IpcCommand::Tick { seconds } => session.advance(seconds, false)?,
            IpcCommand::Command { command } => {
                let events = session.engine.apply(command, session.clock.now());
                session.persist(&events)?;
                events
            }
            IpcCommand::Restart => {
                session.restart()?;
                session.engine.startup_events()
            }
        };

        let state = UiState {
            state:      session.engine.snapshot(session.clock.now()),
            events:     &events,
            high_score: session.store.best_score()?,
        };
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }

    session.record_score()
}

/// Greedy autopilot: plant every owned seed, then buy the priciest
/// affordable offering, then reroll when nothing is affordable and the
/// garden is running low.
fn autopilot(engine: &mut SimEngine, now: f64) -> Vec<SimEvent> {
    let mut events = Vec::new();

    let owned: Vec<String> = engine
        .inventory()
        .owned()
        .flat_map(|(name, count)| std::iter::repeat(name.clone()).take(*count as usize))
        .collect();
    for archetype in owned {
        let Some(cell) = free_cell(engine, now) else { break };
        events.extend(engine.apply(PlayerCommand::Place { archetype, cell }, now));
    }

    let snapshot = engine.snapshot(now);
    let best = snapshot
        .shop
        .offerings
        .iter()
        .filter(|o| o.affordable)
        .max_by(|a, b| a.cost.total_cmp(&b.cost));
    match best {
        Some(offer) => {
            events.extend(engine.apply(PlayerCommand::Purchase { slot: offer.slot }, now));
        }
        None if snapshot.plants.len() < 2 && snapshot.balance >= snapshot.shop.reroll_cost * 2.0 => {
            events.extend(engine.apply(PlayerCommand::Reroll, now));
        }
        None => {}
    }

    events
}

fn free_cell(engine: &SimEngine, now: f64) -> Option<GridPos> {
    let garden = engine.garden();
    (0..garden.rows())
        .flat_map(|row| (0..garden.cols()).map(move |col| GridPos::new(col, row)))
        .find(|cell| garden.can_plant(*cell, now))
}

fn print_summary(session: &Session) -> Result<()> {
    let engine = &session.engine;
    let totals = engine.totals();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", engine.run_id);
    println!("  elapsed:        {:.1}s", engine.clock.elapsed());
    println!("  ticks:          {}", engine.current_tick());
    println!("  score:          {:.0}", totals.score);
    println!("  balance:        {:.0}", totals.balance);
    println!("  shop tier:      {}/{}", engine.shop.state.tier, engine.shop.max_tier());
    println!("  plants alive:   {}", engine.garden().plant_count());
    println!("  plants died:    {}", engine.growth.plants_died);
    println!("  game over:      {}", engine.is_game_over());

    println!();
    println!("=== HIGH SCORES ===");
    let top = session.store.top_scores(5)?;
    if top.is_empty() {
        println!("  (No scores recorded yet)");
    } else {
        for row in top {
            println!("  {:>10} | {} | {}", row.score, row.run_id, row.recorded_at);
        }
    }
    Ok(())
}

fn load_manifest(args: &[String], config: &SimConfig) -> Result<Vec<ManifestEntry>> {
    if has_flag(args, "--synthetic-manifest") {
        return Ok(manifest::synthetic_manifest(config.tiers.required_entries()));
    }
    let Some(path) = string_arg(args, "--manifest") else {
        anyhow::bail!("no plant manifest: pass --manifest <path> or --synthetic-manifest");
    };
    manifest::load_manifest(path).with_context(|| format!("loading plant manifest {path}"))
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
