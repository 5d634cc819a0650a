use crate::{
    language::{Corpus, Strategy},
    mode::Mode,
};

/// Handles all prompt generation logic
pub struct TextGenerator {
    corpus: &'static Corpus,
}

impl Default for TextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TextGenerator {
    pub fn new() -> Self {
        Self::with_corpus(Corpus::embedded())
    }

    pub fn with_corpus(corpus: &'static Corpus) -> Self {
        Self { corpus }
    }

    /// Generate a prompt for `mode`. Output is random on every call; its length
    /// is only roughly proportional to `target_count`.
    ///
    /// When the strategy yields nothing (empty corpus, zero count) at least one
    /// word is generated instead, so the prompt is never empty.
    pub fn generate(&self, mode: Mode, target_count: usize, weak_keys: &[char]) -> String {
        let mut rng = rand::thread_rng();
        let strategy = Strategy::for_mode(mode, target_count, weak_keys);
        let mut tokens = strategy.tokens(&mut rng, self.corpus);

        if tokens.is_empty() {
            tracing::warn!(%mode, target_count, "no text generated, using words");
            let count = target_count.max(1);
            tokens = Strategy::for_mode(Mode::Words, count, &[]).tokens(&mut rng, self.corpus);
        }

        tracing::debug!(%mode, target_count, tokens = tokens.len(), "generated prompt");
        tokens.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{Language, PhraseSet};

    fn corpus_without_phrases() -> &'static Corpus {
        let empty = |name: &str| PhraseSet {
            name: name.to_string(),
            size: 0,
            entries: Vec::new(),
        };
        Box::leak(Box::new(Corpus {
            words: Language {
                name: "tiny".to_string(),
                size: 2,
                words: vec!["red".to_string(), "fox".to_string()],
            },
            quotes: empty("quotes"),
            punctuation: empty("punctuation"),
        }))
    }

    #[test]
    fn test_words_generation() {
        let generator = TextGenerator::new();
        let prompt = generator.generate(Mode::Words, 5, &[]);

        assert!(!prompt.is_empty());
        assert_eq!(prompt.split(' ').count(), 5);
    }

    #[test]
    fn test_quotes_generation() {
        let generator = TextGenerator::new();
        let prompt = generator.generate(Mode::Quotes, 100, &[]);

        assert!(!prompt.is_empty());
        assert!(prompt.chars().any(|c| c == '.'));
    }

    #[test]
    fn test_numbers_generation() {
        let generator = TextGenerator::new();
        let prompt = generator.generate(Mode::Numbers, 12, &[]);

        assert_eq!(prompt.split(' ').count(), 12);
        assert!(prompt.chars().any(|c| c.is_ascii_digit()));
        assert!(!prompt.chars().any(|c| c.is_alphabetic()));
    }

    #[test]
    fn test_practice_generation_covers_weak_keys() {
        let generator = TextGenerator::new();
        let prompt = generator.generate(Mode::Practice, 20, &['x', 'y', 'v']);

        assert!(prompt.contains('x'));
        assert!(prompt.contains('y'));
        assert!(prompt.contains('v'));
    }

    #[test]
    fn test_no_leading_or_trailing_space() {
        let generator = TextGenerator::new();
        for mode in Mode::RANKED {
            let prompt = generator.generate(mode, 10, &[]);
            assert_eq!(prompt.trim(), prompt);
        }
    }

    #[test]
    fn test_empty_phrase_corpus_falls_back_to_words() {
        let generator = TextGenerator::with_corpus(corpus_without_phrases());

        for mode in [Mode::Quotes, Mode::Punctuation] {
            let prompt = generator.generate(mode, 6, &[]);
            assert!(!prompt.is_empty(), "{mode} gave an empty prompt");
            assert!(prompt.split(' ').all(|w| w == "red" || w == "fox"));
        }
    }

    #[test]
    fn test_zero_count_still_produces_text() {
        let generator = TextGenerator::new();
        assert!(!generator.generate(Mode::Numbers, 0, &[]).is_empty());
        assert!(!generator.generate(Mode::Words, 0, &[]).is_empty());
    }
}
