pub mod cli;
pub mod config;
pub mod countdown;
pub mod events;
pub mod tailer;
pub mod triggers;
pub mod tui;
pub mod users;

pub use countdown::*;
pub use events::*;
pub use tailer::*;
pub use triggers::*;
