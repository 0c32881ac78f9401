use crate::buffer::OutputBuffer;

/// Scrollable view over the latest log snapshot of a run
pub struct LogView {
    buffer: OutputBuffer,
    scroll_offset: usize,
    horizontal_scroll: usize,
    follow: bool,
    visible_lines: usize,
}

impl LogView {
    pub fn new(max_buffer_lines: usize) -> Self {
        Self {
            buffer: OutputBuffer::new(max_buffer_lines),
            scroll_offset: 0,
            horizontal_scroll: 0,
            follow: true,
            visible_lines: 0,
        }
    }

    /// Swap in a new snapshot, staying at the bottom when following
    pub fn replace_content(&mut self, content: &str) {
        self.buffer.replace_text(content);
        if self.follow {
            self.scroll_to_bottom();
        } else {
            self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());
        }
    }

    pub fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    pub fn set_visible_lines(&mut self, lines: usize) {
        self.visible_lines = lines;
        if self.follow {
            self.scroll_to_bottom();
        }
    }

    pub fn visible_lines(&self) -> usize {
        self.visible_lines
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_down(&mut self) {
        if self.scroll_offset < self.max_scroll_offset() {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.visible_lines / 2;
        self.scroll_offset = (self.scroll_offset + half_page).min(self.max_scroll_offset());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.visible_lines / 2;
        self.scroll_offset = self.scroll_offset.saturating_sub(half_page);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll_offset();
    }

    pub fn follow(&self) -> bool {
        self.follow
    }

    pub fn toggle_follow(&mut self) {
        self.set_follow(!self.follow);
    }

    pub fn set_follow(&mut self, enabled: bool) {
        self.follow = enabled;
        if enabled {
            self.scroll_to_bottom();
        }
    }

    pub fn horizontal_scroll(&self) -> usize {
        self.horizontal_scroll
    }

    pub fn scroll_left(&mut self) {
        self.horizontal_scroll = self.horizontal_scroll.saturating_sub(1);
    }

    pub fn scroll_right(&mut self) {
        self.horizontal_scroll += 1;
    }

    pub fn scroll_to_left(&mut self) {
        self.horizontal_scroll = 0;
    }

    /// Clear for a new run
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scroll_offset = 0;
        self.horizontal_scroll = 0;
        self.follow = true;
    }

    fn max_scroll_offset(&self) -> usize {
        self.buffer.len().saturating_sub(self.visible_lines)
    }
}
