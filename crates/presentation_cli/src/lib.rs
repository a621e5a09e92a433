//! Weather Watch command-line layer
//!
//! Argument parsing, pipeline wiring, signal handling and hot configuration
//! reload for the `weatherwatch` binary.

pub mod app;
pub mod cli;
pub mod config_reload;

pub use app::{AppError, Pipeline};
pub use cli::{Cli, Command};
pub use config_reload::{ReloadableConfig, spawn_config_reload_handler};
