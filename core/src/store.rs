//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The simulation itself never persists run state; the store keeps the
//! run registry, an optional event log, and the high-score table.

use rusqlite::{params, Connection, OptionalExtension};
use crate::{
    error::SimResult,
    event::EventLogEntry,
    types::Tick,
};

/// Load/save boundary for high scores. Scores are whole fruit.
pub trait HighScoreStore {
    /// Best score recorded so far, 0 when none.
    fn best_score(&self) -> SimResult<u64>;

    /// Record a finished run. Returns true if it beat the previous best.
    fn record_score(&self, run_id: &str, score: u64) -> SimResult<bool>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub run_id:      String,
    pub score:       u64,
    pub recorded_at: String,
}

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, tick, subsystem, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.tick as i64,
                entry.subsystem,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, tick, subsystem, event_type, payload
             FROM event_log WHERE run_id = ?1 AND tick = ?2
             ORDER BY id ASC"
        )?;
        let entries = stmt.query_map(params![run_id, tick as i64], |row| {
            Ok(EventLogEntry {
                id:         Some(row.get(0)?),
                run_id:     row.get(1)?,
                tick:       row.get::<_, i64>(2)? as u64,
                subsystem:  row.get(3)?,
                event_type: row.get(4)?,
                payload:    row.get(5)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── High scores ────────────────────────────────────────────

    pub fn top_scores(&self, limit: usize) -> SimResult<Vec<ScoreRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, score, recorded_at FROM high_score
             ORDER BY score DESC, id ASC LIMIT ?1"
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(ScoreRow {
                run_id:      row.get(0)?,
                score:       row.get::<_, i64>(1)? as u64,
                recorded_at: row.get(2)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl HighScoreStore for SimStore {
    fn best_score(&self) -> SimResult<u64> {
        let best: Option<i64> = self
            .conn
            .query_row("SELECT MAX(score) FROM high_score", [], |row| row.get::<_, Option<i64>>(0))
            .optional()?
            .flatten();
        Ok(best.unwrap_or(0).max(0) as u64)
    }

    fn record_score(&self, run_id: &str, score: u64) -> SimResult<bool> {
        let previous = self.best_score()?;
        self.conn.execute(
            "INSERT INTO high_score (run_id, score, recorded_at) VALUES (?1, ?2, ?3)",
            params![run_id, score as i64, chrono::Utc::now().to_rfc3339()],
        )?;
        let is_best = score > previous;
        if is_best {
            log::info!("store: new high score {score} (previous {previous})");
        }
        Ok(is_best)
    }
}
