use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use benchdash::app::App;
use benchdash::catalog::ConfigLocator;
use benchdash::command::{BenchInvocation, ProcessRunner};
use benchdash::config::Settings;
use benchdash::error::DashError;
use benchdash::logging;
use benchdash::tail::{LogTailer, StreamSink};
use benchdash::tui::{Renderer, handle_key};

/// Redraw interval while no terminal event arrives (milliseconds)
const REDRAW_INTERVAL_MS: u64 = 100;

#[derive(Parser, Debug)]
#[command(
    name = "benchdash",
    author,
    version,
    about = "Browse fmbench configs, launch runs and tail their logs",
    long_about = None
)]
struct Args {
    /// Settings file (default: benchdash.yaml in the working directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Directory holding the config folders
    #[arg(long, global = true)]
    config_root: Option<PathBuf>,

    /// Log file the benchmarking tool writes to
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log polling interval in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print config folders, parameter sub-folders and config files
    List,
    /// Run one config without the TUI, streaming its log to stdout
    Run {
        /// Config file, relative to the config root
        config: PathBuf,
    },
}

fn load_settings(args: &Args) -> benchdash::error::Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::load()?,
    };
    if let Some(root) = &args.config_root {
        settings.config_root = root.clone();
    }
    if let Some(log_file) = &args.log_file {
        settings.bench.log_file = log_file.clone();
    }
    if let Some(ms) = args.interval_ms {
        settings.bench.poll_interval_ms = ms;
    }
    settings.validate()?;
    Ok(settings)
}

/// Initialize the terminal for TUI
fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to its original state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Run the application
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(Duration::from_millis(REDRAW_INTERVAL_MS));

    loop {
        // Apply snapshots and setup output from background tasks
        app.poll_events();

        terminal.draw(|frame| {
            Renderer::render(frame, &mut app);
        })?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut app, key);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => app.quit(),
            },
            _ = redraw.tick() => {}
        }

        if app.should_quit() {
            app.shutdown();
            break;
        }
    }

    Ok(())
}

async fn run_tui(settings: Settings) -> anyhow::Result<()> {
    let app = App::new(settings, ProcessRunner::global());

    let mut terminal = init_terminal().context("failed to set up terminal")?;
    let result = run_app(&mut terminal, app).await;
    restore_terminal(&mut terminal).context("failed to restore terminal")?;

    result.context("terminal event stream failed")
}

fn list(settings: &Settings) -> anyhow::Result<()> {
    let locator = ConfigLocator::new(&settings.config_root);
    let mut out = io::stdout().lock();

    for folder in locator.list_folders()? {
        writeln!(out, "{folder}")?;
        for file in locator.list_config_files(&folder, None)? {
            writeln!(out, "  {}", file.display())?;
        }
        for sub in locator.list_subfolders(&folder)? {
            writeln!(out, "  {sub}/")?;
            for file in locator.list_config_files(&folder, Some(sub.as_str()))? {
                writeln!(out, "    {}", file.display())?;
            }
        }
    }
    Ok(())
}

/// Launch one run, print its log as it grows and return its exit code
async fn run_headless(settings: &Settings, config: &Path) -> anyhow::Result<i32> {
    let locator = ConfigLocator::new(&settings.config_root);
    let config = locator.resolve(config);
    if !config.is_file() {
        return Err(DashError::NotFound(config).into());
    }

    let log_path = settings.bench.log_file.clone();
    let request = BenchInvocation::new(&settings.bench, config).into_request(&log_path)?;
    let runner = ProcessRunner::global();
    let handle = runner.start(&request)?;
    info!(run_id = handle.id(), command = %handle.command(), "headless run started");

    let stopper = {
        let runner = Arc::clone(&runner);
        let handle = Arc::clone(&handle);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(run_id = handle.id(), "interrupted, stopping run");
                let _ = runner.stop(&handle);
            }
        })
    };

    let tailer = LogTailer::new(settings.bench.poll_interval());
    let mut sink = StreamSink::new(io::stdout());
    let exit_code = tailer.tail(&handle, &log_path, &mut sink).await;
    stopper.abort();
    runner.release(&handle)?;

    Ok(exit_code)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args)?;
    let guard = logging::init(&settings.logging)?;
    info!(config_root = %settings.config_root.display(), "benchdash starting");

    match args.command {
        None => run_tui(settings).await,
        Some(Command::List) => list(&settings),
        Some(Command::Run { config }) => {
            let exit_code = run_headless(&settings, &config).await?;
            // process::exit skips destructors, flush the log first
            drop(guard);
            std::process::exit(exit_code)
        }
    }
}
