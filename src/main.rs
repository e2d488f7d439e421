//! Motion Synth - Human Motion Synthesis Engine
//!
//! Generates and replays human-like pointer trajectories from the command line.

use motion_synth::app::cli::{Cli, Commands, ConfigAction};
use motion_synth::app::config::Config;
use motion_synth::execution::{PointerWorker, TracingInjector};
use motion_synth::motion::{MovementRequest, Point};
use motion_synth::profile::{self, MotionPreset, PersonaKind};
use motion_synth::time::clock::{Clock, ManualClock, SystemClock};
use motion_synth::MotionEngine;
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    // Execute command
    match cli.command {
        Commands::Synthesize {
            from,
            to,
            width,
            profile,
            seed,
            output,
            summary,
        } => {
            run_synthesize(from, to, width, profile, seed, output, summary, &config)?;
        }
        Commands::Run {
            from,
            to,
            width,
            profile,
            seed,
            repeat,
            dry_clock,
        } => {
            run_movements(from, to, width, profile, seed, repeat, dry_clock, &config)?;
        }
        Commands::Profiles { detailed } => {
            run_profiles(detailed)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config, cli.config)?;
        }
    }

    Ok(())
}

fn make_rng(seed: Option<u64>, config: &Config) -> StdRng {
    match seed.or(config.engine.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn make_engine(profile: Option<String>, config: &Config) -> anyhow::Result<MotionEngine<SystemClock>> {
    let mut engine = MotionEngine::from_config(config)?;
    if let Some(name) = profile {
        engine.switch_behavior(&name)?;
    }
    Ok(engine)
}

#[allow(clippy::too_many_arguments)]
fn run_synthesize(
    from: Point,
    to: Point,
    width: Option<f64>,
    profile: Option<String>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    summary: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let mut engine = make_engine(profile, config)?;
    let request = engine.request(from, to, width);
    let mut rng = make_rng(seed, config);
    let path = engine.synthesize(&request, &mut rng)?;

    if summary {
        println!(
            "{}: {:.0}px in {:.3}s, {} waypoints (total {:.3}s), overshoot: {}",
            path.profile,
            request.distance(),
            path.duration,
            path.len(),
            path.total_duration(),
            path.overshoot
        );
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&path)?;
    match output {
        Some(file) => {
            if let Some(parent) = file.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&file, json)?;
            info!("Wrote {} waypoints to {:?}", path.len(), file);
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_movements(
    from: Point,
    to: Point,
    width: Option<f64>,
    profile: Option<String>,
    seed: Option<u64>,
    repeat: u32,
    dry_clock: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let engine = make_engine(profile, config)?;
    let request = engine.request(from, to, width);
    let rng = make_rng(seed, config);

    if dry_clock {
        drive_worker(engine.with_clock(ManualClock::new()), rng, request, repeat)
    } else {
        drive_worker(engine, rng, request, repeat)
    }
}

fn drive_worker<C>(engine: MotionEngine<C>, rng: StdRng, request: MovementRequest, repeat: u32) -> anyhow::Result<()>
where
    C: Clock + Send + 'static,
{
    let bound = engine.worst_case_duration(&request)?;
    info!("Worst-case duration per movement: {:?}", bound);

    let (sx, sy) = request.start.rounded();
    let mut worker = PointerWorker::spawn(engine, TracingInjector::at(sx, sy), rng)?;
    let handle = worker.handle();

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_handler = stop_flag.clone();
    let cancel_handle = handle.clone();
    ctrlc::set_handler(move || {
        stop_flag_handler.store(true, Ordering::SeqCst);
        cancel_handle.cancel_current();
    })?;

    for i in 0..repeat {
        if stop_flag.load(Ordering::SeqCst) {
            break;
        }

        // Alternate direction so the cursor ends where the next movement starts
        let movement = if i % 2 == 0 {
            request.clone()
        } else {
            MovementRequest::new(request.target, request.start, request.target_width)
        };

        match handle.move_to(movement) {
            Ok(report) => {
                println!(
                    "#{}: {} waypoints, {} moves, {:.3}s (dwell {:.3}s), final ({}, {}){}",
                    i + 1,
                    report.waypoints_executed,
                    report.moves_issued,
                    report.elapsed.as_secs_f64(),
                    report.dwell.as_secs_f64(),
                    report.final_position.0,
                    report.final_position.1,
                    if report.overshoot { ", overshoot" } else { "" }
                );
            }
            Err(e @ motion_synth::Error::Cancelled { .. }) => {
                warn!("{}", e);
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(status) = handle.persona_status()? {
        println!("\nPersona:\n{}", serde_json::to_string_pretty(&status)?);
    }
    println!("\nSession:\n{}", serde_json::to_string_pretty(&handle.stats()?)?);

    worker.shutdown();
    Ok(())
}

fn run_profiles(detailed: bool) -> anyhow::Result<()> {
    println!("Motion profiles:");
    for preset in MotionPreset::ALL {
        println!("  {:<18} {}", preset.key(), preset.description());
        if detailed {
            println!("{}", indent(&toml::to_string_pretty(&preset.profile())?));
        }
    }

    println!("\nPersonas:");
    for (key, description) in profile::persona_summaries() {
        println!("  {:<18} {}", key, description);
    }
    if detailed {
        for kind in PersonaKind::ALL {
            let persona = kind.persona();
            println!(
                "\n  {} ({}, {})",
                persona.key(),
                persona.name,
                persona.experience_level.as_str()
            );
            println!("{}", indent(&toml::to_string_pretty(&persona.traits)?));
        }
    }
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("      {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save_default()?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config, explicit_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = explicit_path.unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let toml_str = config.to_toml()?;
            println!("Configuration ({:?}):\n", config_path);
            println!("{}", toml_str);
        }
        ConfigAction::Get { key } => {
            let table: toml::Table = toml::from_str(&config.to_toml()?)?;
            match find_toml_value(&table, &key) {
                Some(v) => println!("{} = {}", key, v),
                None => {
                    anyhow::bail!("Configuration key '{}' not found", key);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            if !config_path.exists() {
                anyhow::bail!("No config file found. Run 'motion-synth init' first.");
            }

            // Load, modify, validate, and save
            let mut table: toml::Table = toml::from_str(&std::fs::read_to_string(&config_path)?)?;
            set_toml_value(&mut table, &key, &value)?;
            let updated: Config = toml::Value::Table(table).try_into()?;
            updated.validate()?;
            updated.save(&config_path)?;
            println!("Set {} = {}", key, value);
        }
        ConfigAction::Reset { force } => {
            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save(&config_path)?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}

/// TOML value lookup by dotted key
fn find_toml_value<'a>(table: &'a toml::Table, key: &str) -> Option<&'a toml::Value> {
    let mut parts = key.split('.');
    let mut current = table.get(parts.next()?)?;
    for part in parts {
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

/// TOML value setter by dotted `section.key`; the value's type is inferred
/// (integer, float, bool, otherwise string). Missing sections and keys are
/// created so optional overrides can be set.
fn set_toml_value(table: &mut toml::Table, key: &str, value: &str) -> anyhow::Result<()> {
    let (section, leaf) = key
        .split_once('.')
        .ok_or_else(|| anyhow::anyhow!("Key '{}' must be of the form section.key", key))?;
    if leaf.is_empty() || leaf.contains('.') {
        anyhow::bail!("Key '{}' must be of the form section.key", key);
    }

    let section_table = table
        .entry(section.to_string())
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("'{}' is not a config section", section))?;
    section_table.insert(leaf.to_string(), infer_toml_value(value));
    Ok(())
}

fn infer_toml_value(value: &str) -> toml::Value {
    let trimmed = value.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = trimmed.parse::<f64>() {
        toml::Value::Float(f)
    } else if let Ok(b) = trimmed.parse::<bool>() {
        toml::Value::Boolean(b)
    } else {
        toml::Value::String(trimmed.trim_matches('"').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_toml_value() {
        let table: toml::Table = toml::from_str(&Config::default().to_toml().unwrap()).unwrap();
        assert_eq!(
            find_toml_value(&table, "engine.behavior"),
            Some(&toml::Value::String("natural".into()))
        );
        assert!(find_toml_value(&table, "engine.missing").is_none());
        assert!(find_toml_value(&table, "nope.behavior").is_none());
    }

    #[test]
    fn test_set_toml_value_creates_override() {
        let mut table: toml::Table = toml::from_str(&Config::default().to_toml().unwrap()).unwrap();
        set_toml_value(&mut table, "overrides.jitter_amount", "0.5").unwrap();
        set_toml_value(&mut table, "engine.behavior", "senior_user").unwrap();
        set_toml_value(&mut table, "engine.seed", "9").unwrap();

        let config: Config = toml::Value::Table(table).try_into().unwrap();
        assert_eq!(config.overrides.jitter_amount, Some(0.5));
        assert_eq!(config.engine.behavior, "senior_user");
        assert_eq!(config.engine.seed, Some(9));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_set_toml_value_rejects_bare_key() {
        let mut table = toml::Table::new();
        assert!(set_toml_value(&mut table, "behavior", "fast").is_err());
    }

    #[test]
    fn test_infer_toml_value() {
        assert_eq!(infer_toml_value("3"), toml::Value::Integer(3));
        assert_eq!(infer_toml_value("0.25"), toml::Value::Float(0.25));
        assert_eq!(infer_toml_value("true"), toml::Value::Boolean(true));
        assert_eq!(infer_toml_value("\"casual\""), toml::Value::String("casual".into()));
    }
}
