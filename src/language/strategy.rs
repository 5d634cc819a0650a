use super::{core::Corpus, numbers::random_number_tokens, practice::select_practice_words};
use crate::mode::Mode;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

/// One generation strategy per mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// `count` words sampled uniformly with replacement
    Words { count: usize },
    /// `count` distinct quotes, shuffled
    Quotes { count: usize },
    /// `count` distinct punctuation phrases, shuffled
    Punctuation { count: usize },
    /// `count` random numeric tokens
    Numbers { count: usize },
    /// words biased towards the given keys
    Practice { count: usize, weak_keys: Vec<char> },
}

impl Strategy {
    pub fn for_mode(mode: Mode, target_count: usize, weak_keys: &[char]) -> Self {
        match mode {
            Mode::Words => Strategy::Words { count: target_count },
            Mode::Quotes => Strategy::Quotes { count: 3 },
            Mode::Punctuation => Strategy::Punctuation { count: 4 },
            Mode::Numbers => Strategy::Numbers { count: target_count },
            Mode::Practice => Strategy::Practice {
                count: target_count,
                weak_keys: weak_keys.to_vec(),
            },
        }
    }

    /// Produce the space separated tokens for this strategy
    pub fn tokens<R: Rng + ?Sized>(&self, rng: &mut R, corpus: &Corpus) -> Vec<String> {
        match self {
            Strategy::Words { count } => (0..*count)
                .filter_map(|_| corpus.words.words.choose(rng).cloned())
                .collect(),
            Strategy::Quotes { count } => distinct_shuffled(rng, &corpus.quotes.entries, *count),
            Strategy::Punctuation { count } => {
                distinct_shuffled(rng, &corpus.punctuation.entries, *count)
            }
            Strategy::Numbers { count } => random_number_tokens(rng, *count),
            Strategy::Practice { count, weak_keys } => {
                select_practice_words(rng, &corpus.words, *count, weak_keys)
            }
        }
    }
}

fn distinct_shuffled<R: Rng + ?Sized>(
    rng: &mut R,
    entries: &[String],
    count: usize,
) -> Vec<String> {
    let mut picked: Vec<String> = entries.iter().cloned().choose_multiple(rng, count);
    picked.shuffle(rng);
    picked
}
