use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;
use std::sync::OnceLock;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// Word list behind the words and practice modes
#[derive(Deserialize, Clone, Debug)]
pub struct Language {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

/// A fixed set of longer entries (quotes, punctuation phrases)
#[derive(Deserialize, Clone, Debug)]
pub struct PhraseSet {
    pub name: String,
    pub size: u32,
    pub entries: Vec<String>,
}

/// All embedded corpora, parsed once
#[derive(Debug)]
pub struct Corpus {
    pub words: Language,
    pub quotes: PhraseSet,
    pub punctuation: PhraseSet,
}

impl Corpus {
    pub fn embedded() -> &'static Corpus {
        static CORPUS: OnceLock<Corpus> = OnceLock::new();
        CORPUS.get_or_init(|| Corpus {
            words: read_embedded("english.json").unwrap_or_else(|_| fallback_language()),
            quotes: read_embedded("quotes.json").unwrap_or_else(|_| PhraseSet::empty("quotes")),
            punctuation: read_embedded("punctuation.json")
                .unwrap_or_else(|_| PhraseSet::empty("punctuation")),
        })
    }
}

impl PhraseSet {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size: 0,
            entries: Vec::new(),
        }
    }
}

fn fallback_language() -> Language {
    let words: Vec<String> = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"]
        .iter()
        .map(|w| w.to_string())
        .collect();
    Language {
        name: "fallback".to_string(),
        size: words.len() as u32,
        words,
    }
}

fn read_embedded<T: for<'de> Deserialize<'de>>(file_name: &str) -> Result<T, Box<dyn Error>> {
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| format!("corpus file not found: {file_name}"))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| format!("corpus file is not utf-8: {file_name}"))?;

    let parsed = from_str(contents).map_err(|e| {
        tracing::error!(file = file_name, error = %e, "unable to parse embedded corpus");
        e
    })?;

    Ok(parsed)
}
