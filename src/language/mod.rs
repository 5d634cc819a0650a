pub mod core;
pub mod numbers;
pub mod practice;
pub mod strategy;

// Re-export the main types for convenience
pub use self::core::{Corpus, Language, PhraseSet};
pub use numbers::NumberFormat;
pub use strategy::Strategy;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;

    #[test]
    fn test_integrated_functionality() {
        let corpus = Corpus::embedded();
        let mut rng = rand::thread_rng();

        for mode in [Mode::Words, Mode::Quotes, Mode::Numbers, Mode::Punctuation] {
            let tokens = Strategy::for_mode(mode, 10, &[]).tokens(&mut rng, corpus);
            assert!(!tokens.is_empty(), "{mode} produced no tokens");
        }
    }

    #[test]
    fn test_practice_with_weak_keys() {
        let corpus = Corpus::embedded();
        let mut rng = rand::thread_rng();

        let tokens = Strategy::for_mode(Mode::Practice, 10, &['w', 'k']).tokens(&mut rng, corpus);
        let text = tokens.join(" ");
        assert!(text.contains('w'));
        assert!(text.contains('k'));
    }
}
