//! Application Layer
//!
//! The `motion-synth` command line and the TOML file that seeds engine,
//! execution and override settings.

pub mod cli;
pub mod config;

pub use cli::{parse_point, Cli, Commands, ConfigAction};
pub use config::{Config, EngineConfig, ExecutionConfig};
