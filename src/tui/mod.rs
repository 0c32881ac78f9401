mod input;
mod log_view;
mod pages;
mod renderer;

pub use input::handle_key;
pub use log_view::LogView;
pub use pages::{Page, PageManager};
pub use renderer::Renderer;
