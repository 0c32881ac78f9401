pub mod app;
pub mod buffer;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod tail;
pub mod tui;
pub mod upload;
