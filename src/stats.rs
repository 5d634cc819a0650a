use serde::{Deserialize, Serialize};

/// Characters per "word" in the WPM convention
pub const CHARS_PER_WORD: f64 = 5.0;

/// Summary numbers for a session, final or intermediate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub correct_chars: u32,
    pub incorrect_chars: u32,
    pub total_chars: u32,
}

impl Default for TypingStats {
    fn default() -> Self {
        compute_stats(0, 0, 0)
    }
}

/// Map raw counts and elapsed time to WPM and accuracy.
///
/// WPM only counts correct characters; accuracy is 100 before anything is typed.
pub fn compute_stats(correct: u32, incorrect: u32, elapsed_secs: u32) -> TypingStats {
    let total = correct + incorrect;

    TypingStats {
        wpm: wpm(correct, elapsed_secs),
        accuracy: accuracy(correct, total),
        correct_chars: correct,
        incorrect_chars: incorrect,
        total_chars: total,
    }
}

pub fn wpm(correct: u32, elapsed_secs: u32) -> u32 {
    let minutes = elapsed_secs as f64 / 60.0;
    if minutes <= 0.0 {
        return 0;
    }
    round_half_up((correct as f64 / CHARS_PER_WORD) / minutes).max(0.0) as u32
}

pub fn accuracy(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 100;
    }
    round_half_up((correct as f64 / total as f64) * 100.0).clamp(0.0, 100.0) as u32
}

// Halves round towards +infinity, so 82.5 -> 83 and 2.5 -> 3.
pub(crate) fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}
