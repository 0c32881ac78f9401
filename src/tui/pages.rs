/// Dashboard pages, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Setup,
    Run,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Home, Page::Setup, Page::Run];

    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Setup => "First Time Setup",
            Page::Run => "Config Setup",
        }
    }
}

/// Tracks which page is shown
pub struct PageManager {
    active_index: usize,
}

impl PageManager {
    pub fn new() -> Self {
        Self { active_index: 0 }
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn current(&self) -> Page {
        Page::ALL[self.active_index]
    }

    /// Switch to next page (wrapping)
    pub fn next_page(&mut self) {
        self.active_index = (self.active_index + 1) % Page::ALL.len();
    }

    /// Switch to previous page (wrapping)
    pub fn prev_page(&mut self) {
        self.active_index = if self.active_index == 0 {
            Page::ALL.len() - 1
        } else {
            self.active_index - 1
        };
    }

    pub fn select(&mut self, page: Page) {
        if let Some(index) = Page::ALL.iter().position(|p| *p == page) {
            self.active_index = index;
        }
    }
}

impl Default for PageManager {
    fn default() -> Self {
        Self::new()
    }
}
