use std::collections::VecDeque;

use ansi_to_tui::IntoText;
use ratatui::text::Span;

/// Where a line of output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Stdout,
    Stderr,
    /// Log file holding both streams of the benchmarking tool
    Combined,
}

/// Output line structure
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub kind: OutputKind,
    /// Pre-parsed spans with styles (for rendering)
    spans: Vec<Span<'static>>,
}

impl OutputLine {
    /// Create a new OutputLine
    ///
    /// Parses ANSI escape sequences into styled spans.
    pub fn new(kind: OutputKind, content: String) -> Self {
        let spans = match content.as_str().into_text() {
            Ok(text) => text
                .lines
                .into_iter()
                .next()
                .map(|line| line.spans)
                .unwrap_or_default(),
            Err(_) => vec![Span::raw(content)],
        };

        Self { kind, spans }
    }

    pub fn spans(&self) -> &[Span<'static>] {
        &self.spans
    }

    /// Plain text without ANSI escape sequences
    pub fn plain(&self) -> String {
        self.spans.iter().map(|s| s.content.as_ref()).collect()
    }
}

/// Bounded line buffer backing the log and setup panes
///
/// When max lines is exceeded, old lines are discarded.
pub struct OutputBuffer {
    lines: VecDeque<OutputLine>,
    max_lines: usize,
}

impl OutputBuffer {
    /// `max_lines` of 0 means unlimited
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines,
        }
    }

    /// Append a line, discarding the oldest when full
    pub fn push(&mut self, line: OutputLine) {
        if self.max_lines > 0 && self.lines.len() >= self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Replace the whole buffer with the lines of `content`.
    ///
    /// Only the last `max_lines` lines are parsed. A trailing line without a
    /// newline (a write still in progress, or cut off by termination) is kept.
    pub fn replace_text(&mut self, content: &str) {
        self.lines.clear();
        let total = content.lines().count();
        let skip = if self.max_lines > 0 {
            total.saturating_sub(self.max_lines)
        } else {
            0
        };
        for line in content.lines().skip(skip) {
            self.lines
                .push_back(OutputLine::new(OutputKind::Combined, line.to_string()));
        }
    }

    /// Lines in `start..start + count`, clipped to the buffer
    pub fn get_range(&self, start: usize, count: usize) -> Vec<&OutputLine> {
        self.lines.iter().skip(start).take(count).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputLine> {
        self.lines.iter()
    }
}
