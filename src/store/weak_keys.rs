use chrono::Local;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;

use super::StoreError;
use crate::controller::{SessionResult, SessionSink};
use crate::session::KeyPressTally;
use crate::stats::round_half_up;

/// Default number of keys handed to practice mode
pub const DEFAULT_WEAK_KEY_LIMIT: usize = 10;

/// Accumulated outcomes for one key across sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRecord {
    pub correct: u32,
    pub incorrect: u32,
    pub last_updated_ms: i64,
}

impl KeyRecord {
    pub fn error_rate(&self) -> f64 {
        let total = self.correct + self.incorrect;
        if total == 0 {
            0.0
        } else {
            self.incorrect as f64 / total as f64
        }
    }
}

/// Dashboard row for a key with at least one miss
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeakKeyStat {
    pub key: char,
    pub correct: u32,
    pub incorrect: u32,
    pub accuracy: u32,
}

/// Slack for float noise when comparing a rate gap against `RATE_TOLERANCE`
const RATE_EPSILON: f64 = 1e-9;

/// Error rates closer than this are ranked by miss count instead
const RATE_TOLERANCE: f64 = 0.1;

/// Order keys by how much practice they need.
///
/// Keys are walked from the highest error rate down. Each group starts at its
/// highest rate and takes every following key whose rate is within 0.1 of it;
/// inside a group keys are ordered by absolute miss count, then alphabetically.
/// Keys that were never missed are excluded.
pub fn select_weak_keys(records: &BTreeMap<char, KeyRecord>, limit: usize) -> Vec<char> {
    let mut candidates: Vec<(char, f64, u32)> = records
        .iter()
        .filter(|(_, r)| r.incorrect > 0)
        .map(|(k, r)| (*k, r.error_rate(), r.incorrect))
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut groups: Vec<Vec<(char, f64, u32)>> = Vec::new();
    for candidate in candidates {
        match groups.last_mut() {
            Some(group) if group[0].1 - candidate.1 <= RATE_TOLERANCE + RATE_EPSILON => {
                group.push(candidate)
            }
            _ => groups.push(vec![candidate]),
        }
    }

    groups
        .into_iter()
        .flat_map(|mut group| {
            group.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
            group
        })
        .take(limit)
        .map(|(k, _, _)| k)
        .collect()
}

/// SQLite-backed per-key history
#[derive(Debug)]
pub struct WeakKeyDb {
    conn: Connection,
}

impl WeakKeyDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS key_stats (
                key TEXT PRIMARY KEY NOT NULL,
                correct INTEGER NOT NULL DEFAULT 0,
                incorrect INTEGER NOT NULL DEFAULT 0,
                last_updated INTEGER NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    /// Add one session's tally to the running totals
    pub fn update(&mut self, tally: &KeyPressTally) -> Result<(), StoreError> {
        let now = Local::now().timestamp_millis();
        let tx = self.conn.transaction()?;
        for (key, counts) in tally {
            tx.execute(
                r#"
                INSERT INTO key_stats (key, correct, incorrect, last_updated)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(key) DO UPDATE SET
                    correct = correct + excluded.correct,
                    incorrect = incorrect + excluded.incorrect,
                    last_updated = excluded.last_updated
                "#,
                params![key.to_string(), counts.correct, counts.incorrect, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn records(&self) -> Result<BTreeMap<char, KeyRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, correct, incorrect, last_updated FROM key_stats")?;

        let rows = stmt.query_map([], |row| {
            let key: String = row.get(0)?;
            Ok((
                key.chars().next().unwrap_or('\0'),
                KeyRecord {
                    correct: row.get(1)?,
                    incorrect: row.get(2)?,
                    last_updated_ms: row.get(3)?,
                },
            ))
        })?;

        let mut records = BTreeMap::new();
        for row in rows {
            let (key, record) = row?;
            records.insert(key, record);
        }
        Ok(records)
    }

    pub fn weak_keys(&self, limit: usize) -> Result<Vec<char>, StoreError> {
        Ok(select_weak_keys(&self.records()?, limit))
    }

    pub fn has_weak_keys(&self) -> Result<bool, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM key_stats WHERE incorrect > 0", [], |row| {
                row.get(0)
            })?;
        Ok(count > 0)
    }

    /// Keys with at least one miss, least accurate first
    pub fn weak_key_stats(&self) -> Result<Vec<WeakKeyStat>, StoreError> {
        let mut stats: Vec<WeakKeyStat> = self
            .records()?
            .into_iter()
            .filter(|(_, r)| r.incorrect > 0)
            .map(|(key, r)| WeakKeyStat {
                key,
                correct: r.correct,
                incorrect: r.incorrect,
                accuracy: round_half_up(
                    r.correct as f64 / (r.correct + r.incorrect) as f64 * 100.0,
                ) as u32,
            })
            .collect();
        stats.sort_by_key(|s| s.accuracy);
        Ok(stats)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM key_stats", [])?;
        Ok(())
    }
}

impl SessionSink for WeakKeyDb {
    fn on_finish(&mut self, result: &SessionResult) {
        match self.update(&result.key_tally) {
            Ok(()) => tracing::debug!(keys = result.key_tally.len(), "updated weak key stats"),
            Err(e) => tracing::warn!(error = %e, "failed to update weak key stats"),
        }
    }
}
