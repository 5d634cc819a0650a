use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    cell::RefCell,
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};
use time_humanize::HumanTime;

use keyrush::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    key::Key,
    logging,
    mode::{Mode, DURATION_PRESETS},
    runtime::{AppEvent, CrosstermEventSource, EventSource, Runner},
    store::{
        weak_keys::DEFAULT_WEAK_KEY_LIMIT, JsonFileStore, Leaderboard, ScoreOutcome, TestHistory,
        WeakKeyDb, HISTORY_KEY, LEADERBOARD_KEY,
    },
    timer::{Scheduler, ThreadScheduler, TimerId},
    ui::SessionView,
    SessionController, Status,
};

const REDRAW_INTERVAL_MS: u64 = 100;
const HISTORY_LISTING_LIMIT: usize = 20;

/// timed typing test with personal bests and weak-key practice
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A timed typing test in the terminal. Tracks history and personal bests \
                  per mode and duration, and builds practice text around the keys you miss most."
)]
pub struct Cli {
    /// number of seconds to run test
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// kind of text to type
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// number of words (or numbers) to generate
    #[clap(short = 'w', long)]
    words: Option<usize>,

    /// print recent test history and exit
    #[clap(long)]
    history: bool,

    /// print personal bests and exit
    #[clap(long)]
    bests: bool,

    /// print per-key accuracy for keys you have missed and exit
    #[clap(long)]
    weak_keys: bool,

    /// write the full history as CSV to this path and exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,

    /// delete all recorded history
    #[clap(long)]
    clear_history: bool,

    /// delete all personal bests
    #[clap(long)]
    clear_bests: bool,

    /// delete all per-key statistics
    #[clap(long)]
    clear_weak_keys: bool,
}

impl Cli {
    fn is_command(&self) -> bool {
        self.history
            || self.bests
            || self.weak_keys
            || self.export_history.is_some()
            || self.clear_history
            || self.clear_bests
            || self.clear_weak_keys
    }

    /// Persisted preferences with any values given on the command line applied
    fn merge_into(&self, mut config: Config) -> Config {
        if let Some(secs) = self.secs {
            config.duration_secs = secs;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(words) = self.words {
            config.target_count = Some(words);
        }
        config
    }
}

/// Persistence handles shared between the app and the session controller
pub struct Stores {
    history: Rc<RefCell<TestHistory<JsonFileStore>>>,
    leaderboard: Rc<RefCell<Leaderboard<JsonFileStore>>>,
    weak_keys: Option<Rc<RefCell<WeakKeyDb>>>,
}

impl Stores {
    fn open(dir: &Path, db_path: Option<PathBuf>) -> Self {
        let weak_keys = db_path.and_then(|path| match WeakKeyDb::open(&path) {
            Ok(db) => Some(Rc::new(RefCell::new(db))),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "weak key database unavailable");
                None
            }
        });

        Self {
            history: Rc::new(RefCell::new(TestHistory::open(JsonFileStore::named(
                dir,
                HISTORY_KEY,
            )))),
            leaderboard: Rc::new(RefCell::new(Leaderboard::open(JsonFileStore::named(
                dir,
                LEADERBOARD_KEY,
            )))),
            weak_keys,
        }
    }

    fn open_default() -> Self {
        Self::open(&AppDirs::store_dir(), AppDirs::db_path())
    }

    fn weak_keys_available(&self) -> bool {
        self.weak_keys
            .as_ref()
            .map(|db| db.borrow().has_weak_keys().unwrap_or(false))
            .unwrap_or(false)
    }

    fn current_weak_keys(&self) -> Vec<char> {
        let Some(db) = &self.weak_keys else {
            return Vec::new();
        };
        db.borrow()
            .weak_keys(DEFAULT_WEAK_KEY_LIMIT)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to read weak keys");
                Vec::new()
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Quit,
}

pub struct App<S: Scheduler> {
    controller: SessionController<S>,
    stores: Stores,
    config: Config,
    config_store: Box<dyn ConfigStore>,
}

impl<S: Scheduler> App<S> {
    pub fn new(
        scheduler: S,
        config: Config,
        stores: Stores,
        config_store: Box<dyn ConfigStore>,
    ) -> Self {
        let weak_keys = stores.current_weak_keys();
        let mut controller = SessionController::new(scheduler, config.session_config(weak_keys));

        controller.add_sink(Box::new(stores.history.clone()));
        controller.add_sink(Box::new(stores.leaderboard.clone()));
        if let Some(db) = &stores.weak_keys {
            controller.add_sink(Box::new(db.clone()));
        }

        let mut app = Self {
            controller,
            stores,
            config,
            config_store,
        };
        app.remember_settings();
        app
    }

    /// New text under the current settings
    fn new_session(&mut self) {
        let weak_keys = self.stores.current_weak_keys();
        self.controller
            .configure(self.config.duration_secs, self.config.mode, weak_keys);
        self.remember_settings();
    }

    // Persist what the controller actually ended up using.
    fn remember_settings(&mut self) {
        let used = self.controller.config();
        self.config.mode = used.mode;
        self.config.duration_secs = used.duration_secs;
        if let Err(e) = self.config_store.save(&self.config) {
            tracing::warn!(error = %e, "failed to save config");
        }
    }

    fn score(&self) -> Option<ScoreOutcome> {
        if self.controller.status() != Status::Finished {
            return None;
        }
        self.stores.leaderboard.borrow().last_outcome().cloned()
    }

    fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.kind == KeyEventKind::Release {
            return Action::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        let status = self.controller.status();
        match (key.code, status) {
            (KeyCode::Esc, _) => return Action::Quit,
            (KeyCode::Left, _) | (KeyCode::Char('r'), Status::Finished) => {
                self.controller.restart()
            }
            (KeyCode::Right, _) | (KeyCode::Char('n'), Status::Finished) => self.new_session(),
            (KeyCode::Tab, Status::Idle) => {
                self.config.mode = next_mode(self.config.mode, self.stores.weak_keys_available());
                self.new_session();
            }
            (KeyCode::Up, Status::Idle) => {
                self.config.duration_secs = next_duration(self.config.duration_secs, true);
                self.new_session();
            }
            (KeyCode::Down, Status::Idle) => {
                self.config.duration_secs = next_duration(self.config.duration_secs, false);
                self.new_session();
            }
            _ => self.controller.handle_key(Key::from(key)),
        }
        Action::Continue
    }

    fn on_tick(&mut self, id: TimerId) {
        self.controller.on_tick(id);
    }
}

/// Next mode in selection order; practice is skipped until there are weak keys
fn next_mode(current: Mode, practice_available: bool) -> Mode {
    let mut order: Vec<Mode> = Mode::RANKED.to_vec();
    if practice_available {
        order.push(Mode::Practice);
    }
    let idx = order.iter().position(|m| *m == current);
    match idx {
        Some(i) => order[(i + 1) % order.len()],
        None => order[0],
    }
}

/// Step through the duration presets, snapping unknown values to the nearest step
fn next_duration(current: u32, up: bool) -> u32 {
    if up {
        DURATION_PRESETS
            .iter()
            .copied()
            .find(|d| *d > current)
            .unwrap_or(DURATION_PRESETS[0])
    } else {
        DURATION_PRESETS
            .iter()
            .rev()
            .copied()
            .find(|d| *d < current)
            .unwrap_or(DURATION_PRESETS[DURATION_PRESETS.len() - 1])
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match AppDirs::log_path() {
        Some(path) => logging::init_file(&path),
        None => logging::init_stderr(),
    }

    if cli.is_command() {
        let stores = Stores::open_default();
        return run_command(&cli, &stores, &mut io::stdout());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let config = cli.merge_into(config_store.load());

    let events = CrosstermEventSource::new();
    let scheduler = ThreadScheduler::new(events.sender());
    let runner = Runner::new(events, Duration::from_millis(REDRAW_INTERVAL_MS));
    let mut app = App::new(scheduler, config, Stores::open_default(), Box::new(config_store));

    tracing::info!(mode = %app.config.mode, duration = app.config.duration_secs, "starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, S: Scheduler>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    loop {
        let score = app.score();
        terminal.draw(|f| {
            let view = SessionView::new(app.controller.session()).with_score(score.as_ref());
            f.render_widget(view, f.area());
        })?;

        match runner.step() {
            AppEvent::Key(key) => {
                if app.on_key(key) == Action::Quit {
                    break;
                }
            }
            AppEvent::Tick(id) => app.on_tick(id),
            AppEvent::Resize | AppEvent::Idle => {}
        }
    }
    Ok(())
}

fn run_command<W: Write>(cli: &Cli, stores: &Stores, out: &mut W) -> Result<(), Box<dyn Error>> {
    if cli.clear_history {
        stores.history.borrow_mut().clear();
        writeln!(out, "history cleared")?;
    }
    if cli.clear_bests {
        stores.leaderboard.borrow_mut().clear();
        writeln!(out, "personal bests cleared")?;
    }
    if cli.clear_weak_keys {
        match &stores.weak_keys {
            Some(db) => {
                db.borrow().clear()?;
                writeln!(out, "key statistics cleared")?;
            }
            None => writeln!(out, "key statistics unavailable, nothing cleared")?,
        }
    }
    if let Some(path) = &cli.export_history {
        let history = stores.history.borrow();
        history.export_csv(File::create(path)?)?;
        writeln!(out, "exported {} tests to {}", history.total(), path.display())?;
    }
    if cli.history {
        print_history(stores, out)?;
    }
    if cli.bests {
        print_bests(stores, out)?;
    }
    if cli.weak_keys {
        print_weak_keys(stores, out)?;
    }
    Ok(())
}

fn print_history<W: Write>(stores: &Stores, out: &mut W) -> io::Result<()> {
    let history = stores.history.borrow();
    if history.total() == 0 {
        return writeln!(out, "no tests recorded yet");
    }

    let now = chrono::Local::now();
    for entry in history.recent(HISTORY_LISTING_LIMIT) {
        let age = (now - entry.date).num_seconds().max(0);
        writeln!(
            out,
            "{:<18} {:<12} {:>4}s {:>4} wpm {:>4}%",
            HumanTime::from_seconds(-age).to_string(),
            entry.mode.to_string(),
            entry.duration,
            entry.wpm,
            entry.accuracy
        )?;
    }
    writeln!(
        out,
        "{} tests, average {} wpm at {}% accuracy",
        history.total(),
        history.average_wpm(),
        history.average_accuracy()
    )
}

fn print_bests<W: Write>(stores: &Stores, out: &mut W) -> io::Result<()> {
    let bests = stores.leaderboard.borrow().all_personal_bests();
    if bests.is_empty() {
        return writeln!(out, "no personal bests yet");
    }
    for best in bests {
        writeln!(
            out,
            "{:<12} {:>4}s {:>4} wpm {:>4}%  {}",
            best.mode.to_string(),
            best.duration,
            best.entry.wpm,
            best.entry.accuracy,
            best.entry.date.format("%Y-%m-%d")
        )?;
    }
    Ok(())
}

fn print_weak_keys<W: Write>(stores: &Stores, out: &mut W) -> Result<(), Box<dyn Error>> {
    let stats = match &stores.weak_keys {
        Some(db) => db.borrow().weak_key_stats()?,
        None => Vec::new(),
    };
    if stats.is_empty() {
        writeln!(out, "no missed keys recorded yet")?;
        return Ok(());
    }
    for stat in stats {
        let key = match stat.key {
            ' ' => "space".to_string(),
            c => c.to_string(),
        };
        writeln!(
            out,
            "{:<6} {:>4}%  {} missed of {}",
            key,
            stat.accuracy,
            stat.incorrect,
            stat.correct + stat.incorrect
        )?;
    }
    Ok(())
}
