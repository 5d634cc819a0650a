use crate::{mode::Mode, stats::TypingStats, time_series::WpmSample};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    Idle,
    Running,
    Finished,
}

/// Outcome counts for one key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTally {
    pub correct: u32,
    pub incorrect: u32,
}

impl KeyTally {
    pub fn total(&self) -> u32 {
        self.correct + self.incorrect
    }
}

/// Per-key outcomes keyed by the lowercased character. Backspace never
/// decrements these: a key typed wrong and then corrected still counts as a miss.
pub type KeyPressTally = BTreeMap<char, KeyTally>;

/// Session length and text mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub duration_secs: u32,
    pub mode: Mode,
    pub weak_keys: Vec<char>,
    /// Words/numbers to generate; the mode's default when unset
    pub target_count: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            mode: Mode::Words,
            weak_keys: Vec::new(),
            target_count: None,
        }
    }
}

/// A single typing attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub prompt: String,
    pub typed: String,
    pub cursor: usize,
    pub correct: u32,
    pub incorrect: u32,
    pub mode: Mode,
    pub duration_secs: u32,
    pub time_left: u32,
    pub status: Status,
    pub wpm_history: Vec<WpmSample>,
    pub key_tally: KeyPressTally,
    prompt_len: usize,
}

impl Session {
    pub fn new(prompt: String, mode: Mode, duration_secs: u32) -> Self {
        let duration_secs = duration_secs.max(1);
        Self {
            prompt_len: prompt.chars().count(),
            prompt,
            typed: String::new(),
            cursor: 0,
            correct: 0,
            incorrect: 0,
            mode,
            duration_secs,
            time_left: duration_secs,
            status: Status::Idle,
            wpm_history: Vec::new(),
            key_tally: KeyPressTally::new(),
        }
    }

    /// Length of the prompt in characters
    pub fn prompt_len(&self) -> usize {
        self.prompt_len
    }

    pub fn expected_char(&self, idx: usize) -> Option<char> {
        self.prompt.chars().nth(idx)
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.duration_secs - self.time_left
    }

    pub fn stats(&self) -> TypingStats {
        crate::stats::compute_stats(self.correct, self.incorrect, self.elapsed_secs())
    }

    /// Per-position correctness of what has been typed so far
    pub fn outcomes(&self) -> impl Iterator<Item = (char, bool)> + '_ {
        self.typed
            .chars()
            .zip(self.prompt.chars())
            .map(|(typed, expected)| (typed, typed == expected))
    }
}
