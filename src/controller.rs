use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::rc::Rc;

use crate::key::Key;
use crate::mode::Mode;
use crate::session::{KeyPressTally, Session, SessionConfig, Status};
use crate::stats::TypingStats;
use crate::text_generator::TextGenerator;
use crate::time_series::WpmSample;
use crate::timer::{self, Scheduler, TimerHandle, TimerId, TICK_PERIOD};
use crate::typing_policy;

/// Everything collaborators learn about a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub duration_secs: u32,
    pub mode: Mode,
    pub stats: TypingStats,
    pub key_tally: KeyPressTally,
    pub wpm_history: Vec<WpmSample>,
    pub finished_at: DateTime<Local>,
}

/// A collaborator notified once per finished session
pub trait SessionSink {
    fn on_finish(&mut self, result: &SessionResult);
}

impl<T: SessionSink + ?Sized> SessionSink for Rc<RefCell<T>> {
    fn on_finish(&mut self, result: &SessionResult) {
        self.borrow_mut().on_finish(result);
    }
}

/// Owns the live session, its clock and the finish notification.
///
/// The clock is acquired when the session starts running and released the
/// moment it leaves running (finish or reset). Ticks from a released clock are
/// dropped, so nothing from a previous session can touch the current one.
pub struct SessionController<S: Scheduler> {
    config: SessionConfig,
    session: Session,
    generator: TextGenerator,
    scheduler: S,
    timer: Option<TimerHandle>,
    next_timer_id: u64,
    finalized: bool,
    sinks: Vec<Box<dyn SessionSink>>,
}

impl<S: Scheduler> SessionController<S> {
    pub fn new(scheduler: S, config: SessionConfig) -> Self {
        let config = effective_config(config);
        let generator = TextGenerator::new();
        let session = new_session(&generator, &config);
        Self {
            config,
            session,
            generator,
            scheduler,
            timer: None,
            next_timer_id: 0,
            finalized: false,
            sinks: Vec::new(),
        }
    }

    /// Start over a fixed prompt instead of generated text. An empty prompt
    /// could never be typed to completion, so it keeps the generated text.
    pub fn with_prompt(scheduler: S, config: SessionConfig, prompt: String) -> Self {
        let mut controller = Self::new(scheduler, config);
        if prompt.is_empty() {
            tracing::warn!("empty prompt given, using generated text");
        } else {
            let (mode, duration) = (controller.config.mode, controller.config.duration_secs);
            controller.session = Session::new(prompt, mode, duration);
        }
        controller
    }

    pub fn add_sink(&mut self, sink: Box<dyn SessionSink>) {
        self.sinks.push(sink);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn prompt(&self) -> &str {
        &self.session.prompt
    }

    pub fn typed(&self) -> &str {
        &self.session.typed
    }

    pub fn cursor(&self) -> usize {
        self.session.cursor
    }

    pub fn status(&self) -> Status {
        self.session.status
    }

    pub fn time_left(&self) -> u32 {
        self.session.time_left
    }

    pub fn wpm_history(&self) -> &[WpmSample] {
        &self.session.wpm_history
    }

    pub fn key_tally(&self) -> &KeyPressTally {
        &self.session.key_tally
    }

    pub fn stats(&self) -> TypingStats {
        self.session.stats()
    }

    /// Id of the clock currently driving the session, if any
    pub fn active_timer(&self) -> Option<TimerId> {
        self.timer.as_ref().map(TimerHandle::id)
    }

    /// Replace the session with a fresh idle one under new settings
    pub fn configure(&mut self, duration_secs: u32, mode: Mode, weak_keys: Vec<char>) {
        self.config = effective_config(SessionConfig {
            duration_secs,
            mode,
            weak_keys,
            target_count: self.config.target_count,
        });
        self.replace_session(None);
    }

    /// New text and a fresh idle session; weak keys are kept
    pub fn reset(&mut self, duration_secs: u32, mode: Mode) {
        let weak_keys = self.config.weak_keys.clone();
        self.configure(duration_secs, mode, weak_keys);
    }

    /// Fresh idle session over the same prompt
    pub fn restart(&mut self) {
        let prompt = self.session.prompt.clone();
        self.replace_session(Some(prompt));
    }

    /// Parse a host key identifier and apply it
    pub fn submit_key(&mut self, identifier: &str) {
        self.handle_key(Key::parse(identifier));
    }

    pub fn handle_key(&mut self, key: Key) {
        self.session = typing_policy::apply(&self.session, key);
        self.sync_clock();
    }

    /// Apply one clock period; ticks from any clock but the active one are dropped
    pub fn on_tick(&mut self, id: TimerId) {
        if self.active_timer() != Some(id) {
            tracing::trace!(timer = id.0, "dropping tick from released timer");
            return;
        }
        self.session = timer::tick(&self.session);
        self.sync_clock();
    }

    /// Build the result of a finished session and notify every sink.
    ///
    /// Returns `Some` exactly once per finished session.
    pub fn finalize(&mut self) -> Option<SessionResult> {
        if self.session.status != Status::Finished || self.finalized {
            return None;
        }
        self.finalized = true;

        let result = SessionResult {
            duration_secs: self.session.duration_secs,
            mode: self.session.mode,
            stats: self.session.stats(),
            key_tally: self.session.key_tally.clone(),
            wpm_history: self.session.wpm_history.clone(),
            finished_at: Local::now(),
        };

        tracing::info!(
            mode = %result.mode,
            duration = result.duration_secs,
            wpm = result.stats.wpm,
            accuracy = result.stats.accuracy,
            "session finished"
        );

        for sink in self.sinks.iter_mut() {
            sink.on_finish(&result);
        }

        Some(result)
    }

    // Acquire the clock on entering running, release it on leaving.
    fn sync_clock(&mut self) {
        match self.session.status {
            Status::Running if self.timer.is_none() => {
                self.next_timer_id += 1;
                let id = TimerId(self.next_timer_id);
                self.timer = Some(self.scheduler.start(id, TICK_PERIOD));
                tracing::debug!(timer = id.0, "session running");
            }
            Status::Finished => {
                self.stop_clock();
                self.finalize();
            }
            _ => {}
        }
    }

    fn stop_clock(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.cancel();
            tracing::debug!(timer = handle.id().0, "timer released");
        }
    }

    fn replace_session(&mut self, prompt: Option<String>) {
        self.stop_clock();
        self.session = match prompt {
            Some(prompt) => Session::new(prompt, self.config.mode, self.config.duration_secs),
            None => new_session(&self.generator, &self.config),
        };
        self.finalized = false;
        tracing::debug!(
            mode = %self.config.mode,
            duration = self.config.duration_secs,
            "session reset"
        );
    }
}

impl<S: Scheduler> Drop for SessionController<S> {
    fn drop(&mut self) {
        self.stop_clock();
    }
}

fn effective_config(mut config: SessionConfig) -> SessionConfig {
    if config.duration_secs == 0 {
        tracing::warn!("zero duration requested, using 1 second");
        config.duration_secs = 1;
    }
    if config.mode == Mode::Practice && config.weak_keys.is_empty() {
        tracing::warn!("practice mode needs weak keys, falling back to words");
        config.mode = Mode::Words;
    }
    config
}

fn new_session(generator: &TextGenerator, config: &SessionConfig) -> Session {
    let count = config
        .target_count
        .unwrap_or_else(|| config.mode.default_target_count());
    let prompt = generator.generate(config.mode, count, &config.weak_keys);
    Session::new(prompt, config.mode, config.duration_secs)
}
