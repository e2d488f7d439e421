//! Command-Line Interface

use crate::motion::Point;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Motion Synth - Human-like pointer trajectories from Fitts' law, Bézier paths and personas
#[derive(Parser, Debug)]
#[command(name = "motion-synth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a waypoint sequence and print it as JSON
    Synthesize {
        /// Start position as X,Y
        #[arg(long, value_parser = parse_point)]
        from: Point,

        /// Target position as X,Y
        #[arg(long, value_parser = parse_point)]
        to: Point,

        /// Target width in pixels (config default if omitted)
        #[arg(short, long)]
        width: Option<f64>,

        /// Motion profile or persona name
        #[arg(short, long)]
        profile: Option<String>,

        /// RNG seed for a reproducible path
        #[arg(short, long)]
        seed: Option<u64>,

        /// Write JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a one-line summary instead of the full sequence
        #[arg(long)]
        summary: bool,
    },

    /// Perform a movement against the logging injector
    Run {
        /// Start position as X,Y
        #[arg(long, value_parser = parse_point)]
        from: Point,

        /// Target position as X,Y
        #[arg(long, value_parser = parse_point)]
        to: Point,

        /// Target width in pixels (config default if omitted)
        #[arg(short, long)]
        width: Option<f64>,

        /// Motion profile or persona name
        #[arg(short, long)]
        profile: Option<String>,

        /// RNG seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of back-and-forth movements
        #[arg(short, long, default_value = "1")]
        repeat: u32,

        /// Use a virtual clock instead of sleeping in real time
        #[arg(long)]
        dry_clock: bool,
    },

    /// List motion profiles and personas
    Profiles {
        /// Show parameters for each entry
        #[arg(short, long)]
        detailed: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "engine.behavior", "overrides.jitter_amount")
        key: String,

        /// Value to set
        value: String,
    },

    /// Get a specific configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Parse `X,Y` (whitespace allowed) into a point.
pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid X coordinate '{}'", x.trim()))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid Y coordinate '{}'", y.trim()))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("coordinates must be finite, got '{}'", s));
    }
    Ok(Point::new(x, y))
}
