use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};

use crate::app::{App, Level, Mode, NO_CONFIGS_WARNING};
use crate::buffer::OutputBuffer;
use crate::catalog::Picker;
use crate::tui::Page;
use crate::upload::ArtifactKind;

const HOME_TEXT: &[&str] = &[
    "FMBench runs performance benchmarks for foundation models deployed on AWS",
    "generative AI services: SageMaker, Bedrock, EKS or EC2.",
    "",
    "First Time Setup  fetch the tool's default content and upload a token,",
    "                  tokenizer or model config.",
    "Config Setup      pick a config, launch a benchmark and watch its log.",
];

/// TUI rendering handler
pub struct Renderer;

impl Renderer {
    /// Render application state.
    ///
    /// Takes the app mutably so the log view learns how many rows it has.
    pub fn render(frame: &mut Frame, app: &mut App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        Self::render_tabs(frame, chunks[0], app);
        match app.pages().current() {
            Page::Home => Self::render_home(frame, chunks[1]),
            Page::Setup => Self::render_setup(frame, chunks[1], app),
            Page::Run => Self::render_run(frame, chunks[1], app),
        }
        Self::render_status(frame, chunks[2], app);
    }

    fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
        let titles: Vec<Line> = Page::ALL.iter().map(|p| Line::from(p.title())).collect();
        let tabs = Tabs::new(titles)
            .select(app.pages().active_index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Foundation Model Benchmarking Tool "),
            )
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn render_home(frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = HOME_TEXT.iter().map(|l| Line::from(*l)).collect();
        let home = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Home "))
            .wrap(Wrap { trim: false });
        frame.render_widget(home, area);
    }

    // --- setup page ---

    fn render_setup(frame: &mut Frame, area: Rect, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(4), Constraint::Length(9)])
            .split(area);

        let state = if app.setup_running() {
            Span::styled("running", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("press r to run", Style::default().fg(Color::DarkGray))
        };
        let intro = Paragraph::new(vec![
            Line::from("This page is designed to get you up and running on EC2."),
            Line::from(vec![
                Span::raw("Setup command: "),
                Span::styled(
                    app.settings().setup.command.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                state,
            ]),
        ])
        .block(Block::default().borders(Borders::ALL).title(" First Time Setup "));
        frame.render_widget(intro, chunks[0]);

        // The error box only appears once stderr produced something
        if app.setup_errors().is_empty() {
            render_tail(frame, chunks[1], " Command Output ", app.setup_output());
        } else {
            let streams = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[1]);
            render_tail(frame, streams[0], " Command Output ", app.setup_output());
            render_tail(frame, streams[1], " Command Error ", app.setup_errors());
        }

        Self::render_uploads(frame, chunks[2], app);
    }

    fn render_uploads(frame: &mut Frame, area: Rect, app: &App) {
        let mut lines = vec![
            Line::from(vec![
                Span::raw("Model: "),
                Span::styled(app.model(), Style::default().fg(Color::Cyan)),
                Span::styled("  (m/M to change)", Style::default().fg(Color::DarkGray)),
            ]),
            Line::from(format!(
                "[t] {}  [k] {}  [c] {}",
                ArtifactKind::HfToken.label(),
                ArtifactKind::Tokenizer.label(),
                ArtifactKind::ModelConfig.label()
            )),
        ];

        if let Some(prompt) = app.prompt() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} path (.{}): ", prompt.kind.label(), prompt.kind.extension()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(prompt.input.value().to_string()),
            ]));
        }

        if let Some(receipt) = app.last_receipt() {
            lines.push(Line::from(""));
            lines.push(Line::from(format!("File name: {}", receipt.file_name)));
            lines.push(Line::from(format!("File type: {}", receipt.content_type)));
            lines.push(Line::from(format!("File size: {} bytes", receipt.size)));
            lines.push(Line::from(format!("Saved to: {}", receipt.saved_to.display())));
        }

        let uploads =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Uploads "));
        frame.render_widget(uploads, area);

        // Cursor sits after the prompt text
        if let Some(prompt) = app.prompt() {
            let prefix = format!("{} path (.{}): ", prompt.kind.label(), prompt.kind.extension());
            let x = area.x + 1 + (prefix.len() + prompt.input.visual_cursor()) as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 3));
        }
    }

    // --- run page ---

    fn render_run(frame: &mut Frame, area: Rect, app: &mut App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Length(2), Constraint::Min(3)])
            .split(area);

        let pickers = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(50),
            ])
            .split(chunks[0]);
        for (picker, rect) in [Picker::Folder, Picker::Parameter, Picker::Config]
            .into_iter()
            .zip(pickers.iter())
        {
            Self::render_picker(frame, *rect, app, picker);
        }

        Self::render_run_info(frame, chunks[1], app);
        Self::render_log(frame, chunks[2], app);
    }

    fn render_picker(frame: &mut Frame, area: Rect, app: &App, picker: Picker) {
        let (entries, selected) = app.selection().entries(picker);
        let focused = app.focus() == picker;
        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let items: Vec<ListItem> = entries.into_iter().map(ListItem::new).collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(format!(" {} ", picker.title())),
            )
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(selected);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_run_info(frame: &mut Frame, area: Rect, app: &App) {
        let selected = match app.selection().selected_config() {
            Some(config) => Line::from(format!("Selected config file: {}", config.display())),
            None => Line::from(Span::styled(
                NO_CONFIGS_WARNING,
                Style::default().fg(Color::Yellow),
            )),
        };

        let status = match (app.active_run(), app.last_exit()) {
            (Some(handle), _) => Line::from(vec![
                Span::styled("Running ", Style::default().fg(Color::Green)),
                Span::raw(format!(
                    "{} ({}s)",
                    handle.command(),
                    handle.elapsed().as_secs()
                )),
            ]),
            (None, Some(code)) => Line::from(format!("Last run exited with code {code}")),
            (None, None) => Line::from(Span::styled("Idle", Style::default().fg(Color::DarkGray))),
        };

        frame.render_widget(Paragraph::new(vec![selected, status]), area);
    }

    fn render_log(frame: &mut Frame, area: Rect, app: &mut App) {
        let visible = area.height.saturating_sub(2) as usize;
        app.log_view_mut().set_visible_lines(visible);
        let view = app.log_view();

        let mut title = if app.log_final() {
            " Final Log Output ".to_string()
        } else {
            " Live Log Output ".to_string()
        };
        if view.follow() {
            title.push_str("[follow] ");
        }

        let lines: Vec<Line> = view
            .buffer()
            .get_range(view.scroll_offset(), visible)
            .into_iter()
            .map(|l| Line::from(l.spans().to_vec()))
            .collect();
        let log = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .scroll((0, view.horizontal_scroll() as u16));
        frame.render_widget(log, area);
    }

    // --- status bar ---

    fn render_status(frame: &mut Frame, area: Rect, app: &App) {
        let line = match app.notice() {
            Some(notice) => {
                let color = match notice.level {
                    Level::Info => Color::Cyan,
                    Level::Success => Color::Green,
                    Level::Warning => Color::Yellow,
                    Level::Error => Color::Red,
                };
                Line::from(Span::styled(notice.text.clone(), Style::default().fg(color)))
            }
            None => Line::from(Span::styled(
                key_hints(app),
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn key_hints(app: &App) -> &'static str {
    if app.mode() == Mode::Prompt {
        return "Enter upload  Esc cancel";
    }
    match app.pages().current() {
        Page::Home => "Tab next page  q quit",
        Page::Setup => "r setup  m/M model  t/k/c upload  Tab page  q quit",
        Page::Run => "←/→ picker  ↑/↓ select  R rescan  Enter run  s stop  j/k scroll  f follow  q quit",
    }
}

/// Bordered box showing the last lines of a buffer that fit
fn render_tail(frame: &mut Frame, area: Rect, title: &str, buffer: &OutputBuffer) {
    let rows = area.height.saturating_sub(2) as usize;
    let start = buffer.len().saturating_sub(rows);
    let lines: Vec<Line> = buffer
        .get_range(start, rows)
        .into_iter()
        .map(|l| Line::from(l.spans().to_vec()))
        .collect();
    let block = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(block, area);
}
