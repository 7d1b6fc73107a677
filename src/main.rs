use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::info;
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, EnvFilter};

use wordrush::{
    api::HttpGameApi,
    app::{App, Flow},
    app_dirs::AppDirs,
    auth::FileTokenStore,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, EventSource, Executor, FixedTicker, Runner, Ticker},
    ui,
};

const FRAME_RATE_MS: u64 = 100;

/// timed word-guessing game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Guess the hidden word before the clock runs out. Talks to a word-game server for scoring, accounts and leaderboards."
)]
pub struct Cli {
    /// base URL of the game server
    #[clap(short = 'u', long, env = "WORDRUSH_API_URL")]
    api_url: Option<String>,

    /// number of guesses per match
    #[clap(short = 'a', long)]
    attempts: Option<usize>,

    /// letters per word
    #[clap(short = 'l', long)]
    word_length: Option<usize>,

    /// match length in seconds
    #[clap(short = 'd', long)]
    duration: Option<u64>,

    /// request timeout in seconds
    #[clap(short = 't', long)]
    timeout: Option<u64>,

    /// config file to read instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write the merged settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// log filter used when WORDRUSH_LOG is unset
    #[clap(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Overlays command line values on top of the stored config.
    fn merge(&self, mut cfg: Config) -> Config {
        if let Some(url) = &self.api_url {
            cfg.api_url = url.clone();
        }
        if let Some(attempts) = self.attempts {
            cfg.total_attempts = attempts;
        }
        if let Some(len) = self.word_length {
            cfg.word_length = len;
        }
        if let Some(secs) = self.duration {
            cfg.game_duration_secs = secs;
        }
        if let Some(secs) = self.timeout {
            cfg.request_timeout_secs = secs;
        }
        cfg
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("WORDRUSH_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    let file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });
    let writer = match file {
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None => BoxMakeWriter::new(io::sink),
    };

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(&cli.log_level);

    let store = cli.config_store();
    let cfg = cli.merge(store.load());
    if cli.save_config {
        store.save(&cfg)?;
    }
    info!(api_url = %cfg.api_url, "starting");

    let api = HttpGameApi::new(cfg.api_url.clone(), cfg.request_timeout())?;
    let source = CrosstermEventSource::new();
    let executor = Executor::threaded(Arc::new(api), source.sender());
    let mut app = App::new(
        cfg.session_config(),
        Box::new(FileTokenStore::new()),
        executor,
    );
    let runner = Runner::new(source, FixedTicker::new(Duration::from_millis(FRAME_RATE_MS)));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.shutdown();
    info!("exited");
    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;
        if app.handle(runner.step()) == Flow::Quit {
            return Ok(());
        }
    }
}
