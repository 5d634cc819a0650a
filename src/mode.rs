use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Text generation strategy for a session
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Words,
    Quotes,
    Numbers,
    Punctuation,
    Practice,
}

impl Mode {
    /// Modes that can always be selected; practice additionally needs weak keys.
    pub const RANKED: [Mode; 4] = [Mode::Words, Mode::Quotes, Mode::Numbers, Mode::Punctuation];

    /// Number of tokens requested from the generator for this mode.
    /// Quotes and punctuation pick a fixed number of entries instead.
    pub fn default_target_count(self) -> usize {
        match self {
            Mode::Words | Mode::Practice => 100,
            Mode::Numbers => 40,
            Mode::Quotes => 3,
            Mode::Punctuation => 4,
        }
    }

    pub fn parse(s: &str) -> Option<Mode> {
        <Mode as ValueEnum>::from_str(s, true).ok()
    }
}

/// Durations offered by the front-end; the engine accepts any positive value.
pub const DURATION_PRESETS: [u32; 4] = [15, 30, 60, 120];
