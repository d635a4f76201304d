// Terminal UI implementation using ratatui
// The dashboard, drawn in a terminal

pub mod app;
pub mod help_ui;
pub mod runner;
pub mod sparkline;
pub mod ui;

pub use app::{Action, App, InputMode, ServicesPane};
pub use runner::{run_tui, terminal_width};
