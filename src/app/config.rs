//! Configuration Management

use crate::execution::executor::DEFAULT_STEP_JITTER_BASE_SECS;
use crate::motion::timing::MIN_DURATION_SECS;
use crate::profile::{ProfileOverrides, ProfileSelection};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings
    pub engine: EngineConfig,
    /// Real-time execution settings
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Profile field overrides applied to whichever behaviour is active
    #[serde(default)]
    pub overrides: ProfileOverrides,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Motion profile or persona name
    pub behavior: String,
    /// Fitts' target width when a request does not give one (pixels)
    pub default_target_width: f64,
    /// Floor for movement duration (seconds)
    pub min_duration_secs: f64,
    /// Fixed RNG seed for reproducible runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Execution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Send one absolute move to the path start before relative moves
    pub anchor_absolute: bool,
    /// Base of the persona per-step extra delay (seconds)
    pub step_jitter_base_secs: f64,
    /// Wait the hand-eye delay before moving
    pub apply_hand_eye_delay: bool,
    /// Pause for the dwell time after arriving
    pub apply_dwell: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            behavior: "natural".to_string(),
            default_target_width: 20.0,
            min_duration_secs: MIN_DURATION_SECS,
            seed: None,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            anchor_absolute: false,
            step_jitter_base_secs: DEFAULT_STEP_JITTER_BASE_SECS,
            apply_hand_eye_delay: true,
            apply_dwell: true,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let selection = ProfileSelection::parse(&self.engine.behavior)?;
        if !self.engine.default_target_width.is_finite() || self.engine.default_target_width <= 0.0 {
            return Err(crate::Error::Config(format!(
                "default_target_width must be > 0, got {}", self.engine.default_target_width
            )));
        }
        if !self.engine.min_duration_secs.is_finite() || self.engine.min_duration_secs <= 0.0 {
            return Err(crate::Error::Config(format!(
                "min_duration_secs must be > 0, got {}", self.engine.min_duration_secs
            )));
        }
        if !self.execution.step_jitter_base_secs.is_finite() || self.execution.step_jitter_base_secs < 0.0 {
            return Err(crate::Error::Config(format!(
                "step_jitter_base_secs must be >= 0, got {}", self.execution.step_jitter_base_secs
            )));
        }
        // Overrides must leave the configured behaviour valid
        selection.build().motion().with_overrides(&self.overrides)?;
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".motion_synth").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
