// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod key;
pub mod language;
pub mod logging;
pub mod mode;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod text_generator;
pub mod time_series;
pub mod timer;
pub mod typing_policy;
pub mod ui;

pub use controller::{SessionController, SessionResult, SessionSink};
pub use key::Key;
pub use mode::Mode;
pub use session::{Session, SessionConfig, Status};
pub use stats::TypingStats;
