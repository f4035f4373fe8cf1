//! Audio Insights TUI entry point.

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;

use insights_tui::api::{self, ApiClient, ApiCommand, ApiMessage};
use insights_tui::app::App;
use insights_tui::config::{AppConfig, LogConfig, Overrides};
use insights_tui::dates::WeekStart;
use insights_tui::ui;

/// Frame rate for animations (approximately 30 FPS)
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Environment variable that overrides the log filter
const LOG_ENV: &str = "INSIGHTS_LOG";

#[derive(Debug, Parser)]
#[command(name = "insights-tui", version, about = "Audio meeting insights in the terminal")]
struct Args {
    /// Backend base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Config file (replaces ./insights.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Write logs here instead of the cache directory
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// First day of a timeline week: monday or sunday
    #[arg(long)]
    week_start: Option<WeekStart>,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install().ok();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply(Overrides {
        api_url: args.api_url,
        log_file: args.log_file,
        week_start: args.week_start,
    })?;

    init_tracing(&config.log)?;
    tracing::info!(api = %config.api.base_url, "starting");

    run_tui(config).await
}

/// Logs go to a file; stdout belongs to the terminal UI.
fn init_tracing(log: &LogConfig) -> Result<()> {
    let path = log.resolved_file();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log.filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// Run the TUI application
async fn run_tui(config: AppConfig) -> Result<()> {
    // Anything that can fail before the loop runs goes ahead of raw mode
    let client = ApiClient::new(&config.api.base_url, config.api.timeout())?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Create communication channels
    let (api_tx, mut api_rx) = mpsc::channel::<ApiMessage>(64);
    let (cmd_tx, cmd_rx) = mpsc::channel::<ApiCommand>(32);

    let api_task = tokio::spawn(api::run_worker(client, api_tx, cmd_rx));

    let today = chrono::Local::now().date_naive();
    let mut app = App::new(&config, today);

    // Initial task load
    cmd_tx.send(app.load_tasks()).await.ok();

    // Main event loop
    let result = run_event_loop(&mut terminal, &mut app, &mut api_rx, &cmd_tx).await;

    // Cleanup
    cmd_tx.send(ApiCommand::Shutdown).await.ok();
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    api_task.abort();
    tracing::info!("stopped");

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    api_rx: &mut mpsc::Receiver<ApiMessage>,
    cmd_tx: &mpsc::Sender<ApiCommand>,
) -> Result<()> {
    loop {
        // Advance reveal, notices and the timeline animation
        app.tick();

        // Render the UI
        terminal.draw(|frame| ui::render(frame, app))?;

        // Check for API messages (non-blocking)
        while let Ok(msg) = api_rx.try_recv() {
            app.handle_api_message(msg);
        }

        // Handle input events with timeout for animation
        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = app.handle_key(key) {
                        cmd_tx.send(cmd).await.ok();
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
