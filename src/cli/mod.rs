pub mod app;
pub mod commands;
pub mod report;

pub use app::{Cli, Commands, LogLevel, OutputFormat};
