use super::core::Language;
use rand::seq::SliceRandom;
use rand::Rng;

/// Extra weight a word receives per weak key it contains. Keys earlier in the
/// list count more, since the selector orders them from weakest down.
const WEAK_KEY_BOOST: f64 = 4.0;

/// Pick `count` words biased towards the supplied weak keys.
///
/// Every weak key ends up in the output when that is feasible: a word containing
/// it is seeded first, and keys no word contains (punctuation, digits) are
/// attached to a seeded word instead.
pub fn select_practice_words<R: Rng + ?Sized>(
    rng: &mut R,
    language: &Language,
    count: usize,
    weak_keys: &[char],
) -> Vec<String> {
    if language.words.is_empty() {
        return Vec::new();
    }

    let keys: Vec<char> = weak_keys
        .iter()
        .map(|c| fold(*c))
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    let mut selected = seed_coverage(rng, language, &keys);

    let weighted: Vec<(&String, f64)> = language
        .words
        .iter()
        .map(|w| (w, word_weight(w, &keys)))
        .collect();

    while selected.len() < count {
        match weighted.choose_weighted(rng, |(_, weight)| *weight) {
            Ok((word, _)) => selected.push((*word).clone()),
            Err(_) => break,
        }
    }

    selected.shuffle(rng);
    selected
}

fn seed_coverage<R: Rng + ?Sized>(rng: &mut R, language: &Language, keys: &[char]) -> Vec<String> {
    let mut seeded: Vec<String> = Vec::new();

    for &key in keys {
        if seeded.iter().any(|w| contains_key(w, key)) {
            continue;
        }

        let candidates: Vec<&String> = language
            .words
            .iter()
            .filter(|w| contains_key(w, key))
            .collect();

        match candidates.choose(rng) {
            Some(word) => seeded.push((*word).clone()),
            None => {
                let host = language
                    .words
                    .choose(rng)
                    .cloned()
                    .unwrap_or_default();
                seeded.push(format!("{host}{key}"));
            }
        }
    }

    seeded
}

fn word_weight(word: &str, keys: &[char]) -> f64 {
    let total = keys.len() as f64;
    let boost: f64 = keys
        .iter()
        .enumerate()
        .filter(|(_, k)| contains_key(word, **k))
        .map(|(rank, _)| WEAK_KEY_BOOST * (total - rank as f64) / total)
        .sum();
    1.0 + boost
}

fn contains_key(word: &str, key: char) -> bool {
    word.chars().any(|c| fold(c) == key)
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
