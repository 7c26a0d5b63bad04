//! Configuration
//!
//! Built-in defaults, then `scribe.toml`/`scribe.yaml`, then `SCRIBE_*` and
//! the conventional service variables, then command-line flags.

pub mod loader;
pub mod merge;

pub use loader::load_config;
pub use merge::{merge_cli_with_config, CliOverrides};
