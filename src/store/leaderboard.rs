use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{load_or_default, save_logged, Persist};
use crate::controller::{SessionResult, SessionSink};
use crate::mode::Mode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub wpm: u32,
    pub accuracy: u32,
    pub date: DateTime<Local>,
}

/// Personal bests keyed by `"{mode}-{duration}"`
pub type LeaderboardData = BTreeMap<String, LeaderboardEntry>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub is_new_record: bool,
    pub previous_best: Option<LeaderboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalBest {
    pub mode: Mode,
    pub duration: u32,
    pub entry: LeaderboardEntry,
}

pub struct Leaderboard<P: Persist<LeaderboardData>> {
    persist: P,
    data: LeaderboardData,
    last_outcome: Option<ScoreOutcome>,
}

fn board_key(duration: u32, mode: Mode) -> String {
    format!("{mode}-{duration}")
}

fn parse_board_key(key: &str) -> Option<(Mode, u32)> {
    let (mode, duration) = key.rsplit_once('-')?;
    Some((Mode::parse(mode)?, duration.parse().ok()?))
}

impl<P: Persist<LeaderboardData>> Leaderboard<P> {
    pub fn open(persist: P) -> Self {
        let data = load_or_default(&persist, "leaderboard");
        Self {
            persist,
            data,
            last_outcome: None,
        }
    }

    pub fn personal_best(&self, duration: u32, mode: Mode) -> Option<&LeaderboardEntry> {
        self.data.get(&board_key(duration, mode))
    }

    /// Record a score; it replaces the best when WPM is higher, or WPM ties and
    /// accuracy is higher.
    pub fn save_score(
        &mut self,
        duration: u32,
        mode: Mode,
        wpm: u32,
        accuracy: u32,
    ) -> ScoreOutcome {
        let key = board_key(duration, mode);
        let previous_best = self.data.get(&key).cloned();

        let is_new_record = match &previous_best {
            None => true,
            Some(best) => wpm > best.wpm || (wpm == best.wpm && accuracy > best.accuracy),
        };

        if is_new_record {
            self.data.insert(
                key,
                LeaderboardEntry {
                    wpm,
                    accuracy,
                    date: Local::now(),
                },
            );
            save_logged(&self.persist, &self.data, "leaderboard");
        }

        let outcome = ScoreOutcome {
            is_new_record,
            previous_best,
        };
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Outcome of the most recent `save_score`
    pub fn last_outcome(&self) -> Option<&ScoreOutcome> {
        self.last_outcome.as_ref()
    }

    /// Every recorded best, highest WPM first
    pub fn all_personal_bests(&self) -> Vec<PersonalBest> {
        let mut bests: Vec<PersonalBest> = self
            .data
            .iter()
            .filter_map(|(key, entry)| {
                let (mode, duration) = parse_board_key(key)?;
                Some(PersonalBest {
                    mode,
                    duration,
                    entry: entry.clone(),
                })
            })
            .collect();
        bests.sort_by(|a, b| b.entry.wpm.cmp(&a.entry.wpm));
        bests
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.last_outcome = None;
        if let Err(e) = self.persist.remove() {
            tracing::warn!(error = %e, "failed to clear leaderboard");
        }
    }
}

impl<P: Persist<LeaderboardData>> SessionSink for Leaderboard<P> {
    fn on_finish(&mut self, result: &SessionResult) {
        // Practice text is biased towards weak keys; its scores are not comparable.
        if result.mode == Mode::Practice {
            self.last_outcome = None;
            return;
        }
        let outcome = self.save_score(
            result.duration_secs,
            result.mode,
            result.stats.wpm,
            result.stats.accuracy,
        );
        if outcome.is_new_record {
            tracing::info!(
                mode = %result.mode,
                duration = result.duration_secs,
                wpm = result.stats.wpm,
                "new personal best"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{test_support::BrokenStore, JsonFileStore, MemoryStore};
    use tempfile::tempdir;

    fn board() -> Leaderboard<MemoryStore<LeaderboardData>> {
        Leaderboard::open(MemoryStore::new())
    }

    #[test]
    fn first_score_is_a_record() {
        let mut b = board();
        let outcome = b.save_score(60, Mode::Words, 40, 95);

        assert!(outcome.is_new_record);
        assert!(outcome.previous_best.is_none());
        assert_eq!(b.personal_best(60, Mode::Words).unwrap().wpm, 40);
    }

    #[test]
    fn higher_wpm_replaces_best() {
        let mut b = board();
        b.save_score(60, Mode::Words, 40, 95);
        let outcome = b.save_score(60, Mode::Words, 45, 80);

        assert!(outcome.is_new_record);
        assert_eq!(outcome.previous_best.unwrap().wpm, 40);
        assert_eq!(b.personal_best(60, Mode::Words).unwrap().wpm, 45);
    }

    #[test]
    fn tie_on_wpm_needs_better_accuracy() {
        let mut b = board();
        b.save_score(30, Mode::Quotes, 50, 90);

        assert!(!b.save_score(30, Mode::Quotes, 50, 90).is_new_record);
        assert!(!b.save_score(30, Mode::Quotes, 49, 100).is_new_record);
        assert!(b.save_score(30, Mode::Quotes, 50, 91).is_new_record);
        assert_eq!(b.personal_best(30, Mode::Quotes).unwrap().accuracy, 91);
    }

    #[test]
    fn bests_are_per_mode_and_duration() {
        let mut b = board();
        b.save_score(30, Mode::Words, 50, 90);
        b.save_score(60, Mode::Words, 70, 90);
        b.save_score(30, Mode::Numbers, 30, 90);

        assert!(b.personal_best(15, Mode::Words).is_none());
        let all = b.all_personal_bests();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].wpm_key(), (Mode::Words, 60, 70));
        assert_eq!(all[2].wpm_key(), (Mode::Numbers, 30, 30));
    }

    #[test]
    fn key_parsing() {
        assert_eq!(parse_board_key("words-60"), Some((Mode::Words, 60)));
        assert_eq!(parse_board_key("punctuation-120"), Some((Mode::Punctuation, 120)));
        assert_eq!(parse_board_key("garbage"), None);
        assert_eq!(parse_board_key("words-x"), None);
    }

    #[test]
    fn persists_between_opens() {
        let dir = tempdir().unwrap();
        {
            let mut b = Leaderboard::open(JsonFileStore::named(dir.path(), "board"));
            b.save_score(15, Mode::Punctuation, 33, 97);
        }
        let b = Leaderboard::open(JsonFileStore::named(dir.path(), "board"));
        assert_eq!(b.personal_best(15, Mode::Punctuation).unwrap().wpm, 33);
    }

    #[test]
    fn broken_storage_keeps_working_in_memory() {
        let mut b = Leaderboard::open(BrokenStore);
        assert!(b.save_score(15, Mode::Words, 10, 100).is_new_record);
        assert!(!b.save_score(15, Mode::Words, 9, 100).is_new_record);
    }

    impl PersonalBest {
        fn wpm_key(&self) -> (Mode, u32, u32) {
            (self.mode, self.duration, self.entry.wpm)
        }
    }
}
