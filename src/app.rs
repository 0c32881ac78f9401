use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use tui_input::{Input, InputRequest};

use crate::buffer::{OutputBuffer, OutputKind};
use crate::catalog::{ConfigLocator, ConfigSelection, Picker};
use crate::command::{BenchInvocation, ProcessRunner, RunHandle, ShellCommand, ShellEvent};
use crate::config::Settings;
use crate::error::DashError;
use crate::event::{AppEvent, RunEvents};
use crate::tail::LogTailer;
use crate::tui::{LogView, PageManager};
use crate::upload::{ArtifactKind, ArtifactStore, MODELS, UploadReceipt};

/// Warning shown when the selected folder has no configs
pub const NO_CONFIGS_WARNING: &str = "No config files found in the selected folder or subfolder.";

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Typing the path of a file to upload
    Prompt,
}

/// Severity of a status-bar notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// One-line message shown in the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

/// Path prompt for an artifact upload
pub struct UploadPrompt {
    pub kind: ArtifactKind,
    pub input: Input,
}

/// Application state
pub struct App {
    settings: Settings,
    pages: PageManager,
    mode: Mode,
    should_quit: bool,
    notice: Option<Notice>,

    selection: ConfigSelection,
    focus: Picker,
    runner: Arc<ProcessRunner>,
    tailer: LogTailer,
    active_run: Option<Arc<RunHandle>>,
    log_view: LogView,
    log_final: bool,
    last_exit: Option<i32>,

    setup_output: OutputBuffer,
    setup_errors: OutputBuffer,
    setup_running: bool,
    /// Fires to kill the running setup command
    setup_cancel: Option<oneshot::Sender<()>>,
    store: ArtifactStore,
    model_index: usize,
    prompt: Option<UploadPrompt>,
    last_receipt: Option<UploadReceipt>,

    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Initialize the application and scan the config root
    pub fn new(settings: Settings, runner: Arc<ProcessRunner>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let max_lines = settings.ui.max_buffer_lines;
        let mut app = Self {
            pages: PageManager::new(),
            mode: Mode::Normal,
            should_quit: false,
            notice: None,
            selection: ConfigSelection::new(ConfigLocator::new(&settings.config_root)),
            focus: Picker::Folder,
            runner,
            tailer: LogTailer::new(settings.bench.poll_interval()),
            active_run: None,
            log_view: LogView::new(max_lines),
            log_final: false,
            last_exit: None,
            setup_output: OutputBuffer::new(max_lines),
            setup_errors: OutputBuffer::new(max_lines),
            setup_running: false,
            setup_cancel: None,
            store: ArtifactStore::new(settings.uploads.clone()),
            model_index: 0,
            prompt: None,
            last_receipt: None,
            events_tx,
            events_rx,
            settings,
        };
        app.refresh_configs();
        app
    }

    // --- run page ---

    /// Rescan the config root; an unusable root empties the pickers
    pub fn refresh_configs(&mut self) {
        if let Err(e) = self.selection.refresh() {
            warn!(error = %e, "config scan failed");
            self.selection.clear();
            self.set_notice(Level::Error, e.to_string());
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn select_next(&mut self) {
        if let Err(e) = self.selection.select_next(self.focus) {
            self.set_notice(Level::Error, e.to_string());
        }
    }

    pub fn select_prev(&mut self) {
        if let Err(e) = self.selection.select_prev(self.focus) {
            self.set_notice(Level::Error, e.to_string());
        }
    }

    /// Launch the benchmarking tool on the selected config and tail its log
    /// in a background task
    pub fn start_run(&mut self) {
        let Some(config) = self.selection.resolved_config() else {
            self.set_notice(Level::Warning, NO_CONFIGS_WARNING);
            return;
        };
        let log_path = self.settings.bench.log_file.clone();
        let request = match BenchInvocation::new(&self.settings.bench, config).into_request(&log_path) {
            Ok(request) => request,
            Err(e) => {
                self.set_notice(Level::Error, e.to_string());
                return;
            }
        };

        let handle = match self.runner.start(&request) {
            Ok(handle) => handle,
            Err(DashError::AlreadyRunning) => {
                self.set_notice(Level::Warning, "A process is already running.");
                return;
            }
            Err(e) => {
                self.set_notice(Level::Error, e.to_string());
                return;
            }
        };

        self.log_view.reset();
        self.log_final = false;
        self.last_exit = None;
        self.active_run = Some(Arc::clone(&handle));
        self.set_notice(Level::Info, "Running the command...");

        let tailer = self.tailer;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let mut sink = RunEvents::new(handle.id(), tx.clone());
            let exit_code = tailer.tail(&handle, &log_path, &mut sink).await;
            let _ = tx.send(AppEvent::RunFinished {
                run_id: handle.id(),
                exit_code,
            });
        });
    }

    /// Request termination of the active run
    pub fn stop_run(&mut self) {
        match self.runner.stop_active() {
            Ok(()) => self.set_notice(Level::Info, "Subprocess termination requested."),
            Err(DashError::NotRunning) => self.set_notice(Level::Warning, "No process is running."),
            Err(e) => self.set_notice(Level::Error, e.to_string()),
        }
    }

    // --- setup page ---

    /// Run the first-time setup shell line, streaming its output
    pub fn run_setup(&mut self) {
        if self.setup_running {
            self.set_notice(Level::Warning, "Setup is already running.");
            return;
        }
        let mut handle = match ShellCommand::spawn(&self.settings.setup.command) {
            Ok(handle) => handle,
            Err(e) => {
                self.set_notice(Level::Error, format!("Setup failed to start: {e}"));
                return;
            }
        };
        info!(command = %self.settings.setup.command, "setup started");

        self.setup_output.clear();
        self.setup_errors.clear();
        self.setup_running = true;
        self.set_notice(Level::Info, "Running setup command...");

        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        self.setup_cancel = Some(cancel_tx);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = handle.next_event() => match event {
                        Some(ShellEvent::Output(line)) => {
                            let _ = tx.send(AppEvent::SetupOutput(line));
                        }
                        None => break,
                    },
                    _ = &mut cancel_rx => {
                        if let Err(e) = handle.kill().await {
                            warn!(error = %e, "failed to kill setup command");
                        }
                        break;
                    }
                }
            }
            let event = match handle.wait().await {
                Ok(exit_code) => AppEvent::SetupFinished { exit_code },
                Err(e) => AppEvent::SetupFailed {
                    reason: e.to_string(),
                },
            };
            let _ = tx.send(event);
        });
    }

    /// Kill the running setup command; its exit is still reported
    pub fn cancel_setup(&mut self) {
        if let Some(cancel) = self.setup_cancel.take()
            && cancel.send(()).is_ok()
        {
            info!("setup cancelled");
            self.set_notice(Level::Warning, "Setup cancelled.");
        }
    }

    pub fn cycle_model(&mut self, forward: bool) {
        self.model_index = if forward {
            (self.model_index + 1) % MODELS.len()
        } else if self.model_index == 0 {
            MODELS.len() - 1
        } else {
            self.model_index - 1
        };
    }

    pub fn model(&self) -> &'static str {
        MODELS[self.model_index]
    }

    pub fn open_prompt(&mut self, kind: ArtifactKind) {
        self.prompt = Some(UploadPrompt {
            kind,
            input: Input::default(),
        });
        self.mode = Mode::Prompt;
    }

    pub fn prompt_input(&mut self, req: InputRequest) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.input.handle(req);
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
        self.mode = Mode::Normal;
    }

    /// Upload the file named in the prompt
    pub fn submit_prompt(&mut self) {
        self.mode = Mode::Normal;
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let path = prompt.input.value().trim();
        if path.is_empty() {
            return;
        }
        match self.store.upload(prompt.kind, Path::new(path), self.model()) {
            Ok(receipt) => {
                self.set_notice(Level::Success, receipt.summary());
                self.last_receipt = Some(receipt);
            }
            Err(e) => self.set_notice(Level::Error, e.to_string()),
        }
    }

    // --- events ---

    /// Apply all pending background events without blocking
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Snapshot { run_id, snapshot } => {
                if self.is_active_run(run_id) {
                    self.log_view.replace_content(&snapshot.content);
                    self.log_final = snapshot.is_final;
                }
            }
            AppEvent::RunFinished { run_id, exit_code } => {
                if !self.is_active_run(run_id) {
                    return;
                }
                if let Some(handle) = self.active_run.take()
                    && let Err(e) = self.runner.release(&handle)
                {
                    warn!(run_id, error = %e, "release failed");
                }
                self.last_exit = Some(exit_code);
                if exit_code == 0 {
                    self.set_notice(Level::Success, "Command completed!");
                } else {
                    self.set_notice(
                        Level::Error,
                        format!("Command exited with code {exit_code}"),
                    );
                }
            }
            AppEvent::SetupOutput(line) => match line.kind {
                OutputKind::Stderr => self.setup_errors.push(line),
                _ => self.setup_output.push(line),
            },
            AppEvent::SetupFinished { exit_code } => {
                self.setup_running = false;
                self.setup_cancel = None;
                if exit_code == 0 {
                    self.set_notice(Level::Success, "Setup completed.");
                } else {
                    self.set_notice(Level::Error, format!("Setup exited with code {exit_code}"));
                }
            }
            AppEvent::SetupFailed { reason } => {
                self.setup_running = false;
                self.setup_cancel = None;
                self.set_notice(Level::Error, format!("Setup failed: {reason}"));
            }
        }
    }

    fn is_active_run(&self, run_id: u64) -> bool {
        self.active_run.as_ref().is_some_and(|h| h.id() == run_id)
    }

    /// Stop the active run and any setup command before exiting
    pub fn shutdown(&mut self) {
        self.cancel_setup();
        if self.active_run.is_some() {
            match self.runner.stop_active() {
                Ok(()) | Err(DashError::NotRunning) => {}
                Err(e) => warn!(error = %e, "failed to stop run on shutdown"),
            }
        }
    }

    // --- accessors ---

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pages(&self) -> &PageManager {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut PageManager {
        &mut self.pages
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, level: Level, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
        });
    }

    pub fn selection(&self) -> &ConfigSelection {
        &self.selection
    }

    pub fn focus(&self) -> Picker {
        self.focus
    }

    pub fn active_run(&self) -> Option<&Arc<RunHandle>> {
        self.active_run.as_ref()
    }

    pub fn log_view(&self) -> &LogView {
        &self.log_view
    }

    pub fn log_view_mut(&mut self) -> &mut LogView {
        &mut self.log_view
    }

    /// Whether the log pane shows the final snapshot
    pub fn log_final(&self) -> bool {
        self.log_final
    }

    pub fn last_exit(&self) -> Option<i32> {
        self.last_exit
    }

    pub fn setup_output(&self) -> &OutputBuffer {
        &self.setup_output
    }

    pub fn setup_errors(&self) -> &OutputBuffer {
        &self.setup_errors
    }

    pub fn setup_running(&self) -> bool {
        self.setup_running
    }

    pub fn prompt(&self) -> Option<&UploadPrompt> {
        self.prompt.as_ref()
    }

    pub fn last_receipt(&self) -> Option<&UploadReceipt> {
        self.last_receipt.as_ref()
    }
}
