use chrono::{DateTime, Local};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::io::Write;

use super::{load_or_default, save_logged, Persist, StoreError};
use crate::controller::{SessionResult, SessionSink};
use crate::mode::Mode;
use crate::stats::{round_half_up, TypingStats};

/// Oldest entries are dropped beyond this
pub const MAX_HISTORY_ENTRIES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub wpm: u32,
    pub accuracy: u32,
    pub correct_chars: u32,
    pub incorrect_chars: u32,
    pub total_chars: u32,
    pub duration: u32,
    pub mode: Mode,
    pub date: DateTime<Local>,
}

/// Finished tests, newest first
pub struct TestHistory<P: Persist<Vec<HistoryEntry>>> {
    persist: P,
    entries: Vec<HistoryEntry>,
}

impl<P: Persist<Vec<HistoryEntry>>> TestHistory<P> {
    pub fn open(persist: P) -> Self {
        let entries = load_or_default(&persist, "history");
        Self { persist, entries }
    }

    pub fn add_result(&mut self, duration: u32, mode: Mode, stats: &TypingStats) -> HistoryEntry {
        let now = Local::now();
        let entry = HistoryEntry {
            id: new_id(&now),
            wpm: stats.wpm,
            accuracy: stats.accuracy,
            correct_chars: stats.correct_chars,
            incorrect_chars: stats.incorrect_chars,
            total_chars: stats.total_chars,
            duration,
            mode,
            date: now,
        };

        self.entries.insert(0, entry.clone());
        self.entries.truncate(MAX_HISTORY_ENTRIES);
        save_logged(&self.persist, &self.entries, "history");

        entry
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn recent(&self, limit: usize) -> &[HistoryEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    pub fn by_mode(&self, mode: Mode) -> Vec<&HistoryEntry> {
        self.entries.iter().filter(|e| e.mode == mode).collect()
    }

    pub fn by_duration(&self, duration: u32) -> Vec<&HistoryEntry> {
        self.entries.iter().filter(|e| e.duration == duration).collect()
    }

    pub fn average_wpm(&self) -> u32 {
        self.average(|e| e.wpm)
    }

    pub fn average_accuracy(&self) -> u32 {
        self.average(|e| e.accuracy)
    }

    fn average(&self, field: impl Fn(&HistoryEntry) -> u32) -> u32 {
        if self.entries.is_empty() {
            return 0;
        }
        let sum: u64 = self.entries.iter().map(|e| field(e) as u64).sum();
        round_half_up(sum as f64 / self.entries.len() as f64) as u32
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.persist.remove() {
            tracing::warn!(error = %e, "failed to clear history");
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            save_logged(&self.persist, &self.entries, "history");
        }
        removed
    }

    /// Write all entries as CSV, newest first
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<(), StoreError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "date",
            "mode",
            "duration",
            "wpm",
            "accuracy",
            "correct_chars",
            "incorrect_chars",
            "total_chars",
        ])?;
        for e in &self.entries {
            csv.write_record([
                e.date.to_rfc3339(),
                e.mode.to_string(),
                e.duration.to_string(),
                e.wpm.to_string(),
                e.accuracy.to_string(),
                e.correct_chars.to_string(),
                e.incorrect_chars.to_string(),
                e.total_chars.to_string(),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }
}

impl<P: Persist<Vec<HistoryEntry>>> SessionSink for TestHistory<P> {
    fn on_finish(&mut self, result: &SessionResult) {
        let entry = self.add_result(result.duration_secs, result.mode, &result.stats);
        tracing::info!(id = %entry.id, wpm = entry.wpm, "recorded test in history");
    }
}

fn new_id(now: &DateTime<Local>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("{}-{}", now.timestamp_millis(), suffix)
}
