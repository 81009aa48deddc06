pub mod ui;

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
use spectype::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    persist::{Gateway, HttpRemoteScores, MemoryScoreStore, RemoteScores, ScoreStore, SqliteScoreStore},
    runtime::{AppEvent, AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    scoring::RecoveryMode,
    session::{Command, InputOutcome, Session, SessionState},
    timer::{Clock, MonotonicClock},
    words::{RandomWords, ScriptedWords, Vocabulary, WordSource},
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::{mpsc::Sender, Arc},
    time::Duration,
};

/// Longest the loop sleeps when no game task is due (title and game over screens)
const IDLE_POLL_MS: u64 = 250;

pub type GameSession = Session<Box<dyn WordSource>, Gateway>;

/// type haunted words fast enough to keep the ghost away
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing game: every word you type pushes the ghost back, every moment you hesitate lets it creep closer. The ghost speeds up every 20 seconds."
)]
pub struct Cli {
    /// high score server to sync with, e.g. http://127.0.0.1:5000
    #[clap(short = 'u', long)]
    server_url: Option<String>,

    /// keep the high score on this machine only
    #[clap(long)]
    offline: bool,

    /// use the older flat recovery formula (correct letters + 2 for a perfect word)
    #[clap(long)]
    flat_recovery: bool,

    /// practise these comma separated words in order instead of random haunted words
    #[clap(short = 'w', long, value_delimiter = ',')]
    words: Vec<String>,

    /// config file to use instead of the per-user one
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// seed for the random word picker
    #[clap(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Command line flags win over the config file for this run
    fn apply(&self, mut config: Config) -> Config {
        if self.flat_recovery {
            config.rules.recovery = RecoveryMode::Flat;
        }
        if self.server_url.is_some() {
            config.server_url = self.server_url.clone();
        }
        if self.offline {
            config.server_url = None;
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn word_source(&self) -> Box<dyn WordSource> {
        if !self.words.is_empty() {
            return Box::new(ScriptedWords::new(self.words.clone()));
        }

        let vocab = Vocabulary::builtin();
        match self.seed {
            Some(seed) => Box::new(RandomWords::with_seed(vocab, seed)),
            None => Box::new(RandomWords::new(vocab)),
        }
    }
}

/// Build the persistence gateway. A broken local database or server url
/// degrades to a session-only high score rather than stopping the game.
fn build_gateway(config: &Config, events: Sender<AppEvent>) -> Gateway {
    let local: Box<dyn ScoreStore> = match SqliteScoreStore::open(AppDirs::high_score_db_path()) {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("local high score unavailable, keeping it in memory: {e}");
            Box::new(MemoryScoreStore::new())
        }
    };

    let remote = config
        .server_url
        .as_deref()
        .and_then(|url| match HttpRemoteScores::new(url) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn RemoteScores>),
            Err(e) => {
                log::warn!("not syncing high scores with {url}: {e}");
                None
            }
        });

    Gateway::new(local, remote, events)
}

fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// The log file, or a sink if it cannot be opened. The game runs either way.
fn log_target(path: &Path) -> (env_logger::Target, Option<io::Error>) {
    match open_log_file(path) {
        Ok(file) => (env_logger::Target::Pipe(Box::new(file)), None),
        Err(e) => (env_logger::Target::Pipe(Box::new(io::sink())), Some(e)),
    }
}

fn init_logging() {
    let path = AppDirs::log_path();
    let (target, failure) = log_target(&path);

    // the terminal is in raw mode while we run, so logs never go to it
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(target)
        .init();

    if let Some(e) = failure {
        eprintln!("spectype: not logging, cannot open {}: {e}", path.display());
    }
}

pub struct App {
    pub session: GameSession,
    /// The input line as the player sees it
    pub input: String,
}

impl App {
    pub fn new(session: GameSession) -> Self {
        Self {
            session,
            input: String::new(),
        }
    }

    /// Handle one event from the runner. Returns false when the player
    /// wants out.
    pub fn on_event(&mut self, event: AppEvent, now: Duration) -> bool {
        match event {
            AppEvent::Key(key) => return self.on_key(key, now),
            AppEvent::HighScore(score) => {
                self.session.handle(now, Command::ObserveHighScore(score));
            }
            AppEvent::Resize | AppEvent::Tick => {
                self.session.handle(now, Command::Advance);
            }
        }
        true
    }

    /// Handle one key press. Returns false when the player wants out.
    pub fn on_key(&mut self, key: KeyEvent, now: Duration) -> bool {
        if key.kind == KeyEventKind::Release {
            return true;
        }

        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Enter => {
                if self.session.handle(now, Command::Start) == InputOutcome::Started {
                    self.input.clear();
                }
            }
            KeyCode::Backspace => {
                if self.input.pop().is_some() {
                    self.submit(now);
                }
            }
            KeyCode::Char(c) if self.session.state() == SessionState::Playing => {
                self.input.push(c);
                self.submit(now);
            }
            _ => {
                self.session.handle(now, Command::Advance);
            }
        }

        true
    }

    fn submit(&mut self, now: Duration) {
        match self.session.handle(now, Command::Submit(&self.input)) {
            InputOutcome::Updated | InputOutcome::Started => {}
            InputOutcome::WordCompleted | InputOutcome::Ignored => self.input.clear(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let store = cli.config_store();
    let config = cli.apply(store.load_or_init());
    log::info!("config {}", store.path().display());
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(IDLE_POLL_MS)),
    );
    let gateway = build_gateway(&config, runner.sender());
    let mut app = App::new(Session::new(cli.word_source(), gateway, config.rules));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &runner, &MonotonicClock::new());
    app.session.teardown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend, E: AppEventSource, T: Ticker, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
    clock: &C,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let until_deadline = app
            .session
            .next_deadline()
            .map(|due| due.saturating_sub(clock.now()));
        let event = runner.step(until_deadline);

        if !app.on_event(event, clock.now()) {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn test_app(words: &[&str], high_score: u64) -> App {
    test_app_with_rules(words, high_score, spectype::scoring::Rules::default())
}

#[cfg(test)]
pub(crate) fn test_app_with_rules(
    words: &[&str],
    high_score: u64,
    rules: spectype::scoring::Rules,
) -> App {
    let (tx, _rx) = std::sync::mpsc::channel();
    let gateway = Gateway::offline(Box::new(MemoryScoreStore::with_score(high_score)), tx);
    let words: Box<dyn WordSource> = Box::new(ScriptedWords::new(words.iter().copied()));
    App::new(Session::new(words, gateway, rules))
}
