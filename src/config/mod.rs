//! Configuration loading for the reader CLI.
//!
//! Settings are read from `conf/config.toml` (or `--config`). Missing or
//! invalid entries fall back to defaults so the reader still starts.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, serialize_config};
pub use models::{AppConfig, LogLevel};
