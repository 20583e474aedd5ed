use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use progress_tui::app::{Action, App, LogEntry, StreamController, StreamStatus, follow_stream};
use progress_tui::client::{StreamHandle, StreamUpdate};
use progress_tui::settings::{
    FileSettingsStore, MemorySettingsStore, SettingsStore, load_endpoint, save_endpoint,
};
use progress_tui::ui;

/// Watch a progress stream arrive over Server-Sent Events.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Stream endpoint. Saved as the new default when given.
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Print messages to stdout instead of opening the terminal UI.
    #[arg(long)]
    plain: bool,

    /// Settings file, defaults to `<config dir>/progress-stream/settings.toml`.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.plain)?;

    let path = args.settings.clone().or_else(FileSettingsStore::default_path);
    match path {
        Some(path) => {
            let store = FileSettingsStore::open(&path)
                .with_context(|| format!("Failed to open settings at {}", path.display()))?;
            launch(args, store).await
        }
        None => {
            warn!("No config directory available, settings will not be saved");
            launch(args, MemorySettingsStore::default()).await
        }
    }
}

async fn launch<S: SettingsStore>(args: Args, mut store: S) -> Result<ExitCode> {
    if let Some(endpoint) = &args.endpoint {
        save_endpoint(&mut store, endpoint).context("Failed to save endpoint")?;
    }

    if args.plain {
        run_plain(&load_endpoint(&store)).await
    } else {
        run_tui(App::new(store)).await?;
        Ok(ExitCode::SUCCESS)
    }
}

// ---------------------------------------------------------------------------
// Plain mode
// ---------------------------------------------------------------------------

async fn run_plain(endpoint: &str) -> Result<ExitCode> {
    let mut controller = StreamController::new();

    let Some(uri) = controller.start(endpoint) else {
        controller.log().iter().for_each(print_entry);
        return Ok(ExitCode::FAILURE);
    };
    controller.log().iter().for_each(print_entry);

    let mut handle = StreamHandle::spawn(uri);
    follow_stream(&mut controller, &mut handle, print_entry).await;

    Ok(match controller.status() {
        StreamStatus::Complete => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn print_entry(entry: &LogEntry) {
    println!(
        "{} [{}] {}",
        entry.at.format("%H:%M:%S"),
        entry.kind.as_str(),
        entry.text
    );
}

// ---------------------------------------------------------------------------
// Terminal UI
// ---------------------------------------------------------------------------

async fn run_tui<S: SettingsStore>(mut app: App<S>) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut app).await;

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

async fn event_loop<S: SettingsStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut stream: Option<StreamHandle> = None;

    loop {
        terminal.draw(|frame| ui::render(frame, &*app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match app.on_key(key) {
                        Action::Start(uri) => stream = Some(StreamHandle::spawn(uri)),
                        Action::Cancel => {
                            if let Some(handle) = stream.take() {
                                handle.cancel();
                            }
                            app.controller.cancel();
                        }
                        Action::Quit => break,
                        Action::None => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("Failed to read terminal events"),
                None => break,
            },
            update = next_update(&mut stream) => {
                match update {
                    Some(update) => app.controller.handle(update),
                    None => app.controller.channel_closed(),
                }
                if !app.controller.status().is_active() {
                    stream = None;
                }
            }
        }
    }

    if let Some(handle) = stream.take() {
        handle.cancel();
    }
    info!("Exiting");
    Ok(())
}

async fn next_update(stream: &mut Option<StreamHandle>) -> Option<StreamUpdate> {
    match stream {
        Some(handle) => handle.next().await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Plain mode logs to stderr; the TUI logs to a file so the screen stays clean.
fn init_logging(plain: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if plain {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return Ok(());
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("progress-stream");
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let file = File::create(dir.join("tui.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
