//! Motion Profiles
//!
//! Static, named parameter sets describing how a hand moves: speed, jitter,
//! tremor, overshoot probability, Fitts' coefficients and curvature.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Longest dwell or hand-eye pause a profile may ask for (seconds)
pub const MAX_PAUSE_SECS: f64 = 60.0;

/// Closed interval of seconds or pixels, sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Draw a value uniformly from the interval.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Both ends scaled by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    /// Require finite, non-negative bounds with `min <= max`.
    pub fn validate(&self, field: &str) -> Result<(), crate::Error> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(crate::Error::Config(format!(
                "{} must be finite, got [{}, {}]",
                field, self.min, self.max
            )));
        }
        if self.min < 0.0 {
            return Err(crate::Error::Config(format!(
                "{} must be >= 0, got min {}",
                field, self.min
            )));
        }
        if self.min > self.max {
            return Err(crate::Error::Config(format!(
                "{} has min > max ({} > {})",
                field, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Inclusive integer bounds, e.g. number of correction attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    pub fn validate(&self, field: &str) -> Result<(), crate::Error> {
        if self.min < 1 {
            return Err(crate::Error::Config(format!("{} must be >= 1, got {}", field, self.min)));
        }
        if self.min > self.max {
            return Err(crate::Error::Config(format!(
                "{} has min > max ({} > {})",
                field, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Canonical motion profile presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPreset {
    Natural,
    Careful,
    Fast,
}

impl MotionPreset {
    pub const ALL: [MotionPreset; 3] = [MotionPreset::Natural, MotionPreset::Careful, MotionPreset::Fast];

    /// Canonical lookup key
    pub fn key(&self) -> &'static str {
        match self {
            MotionPreset::Natural => "natural",
            MotionPreset::Careful => "careful",
            MotionPreset::Fast => "fast",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MotionPreset::Natural => "Everyday pointer use: moderate speed, light curvature, occasional overshoot",
            MotionPreset::Careful => "Slow, deliberate aiming with little jitter and rare overshoot",
            MotionPreset::Fast => "Quick flicks with more jitter, tremor and frequent overshoot",
        }
    }

    pub fn profile(&self) -> MotionProfile {
        match self {
            MotionPreset::Natural => MotionProfile::natural(),
            MotionPreset::Careful => MotionProfile::careful(),
            MotionPreset::Fast => MotionProfile::fast(),
        }
    }
}

/// Immutable motion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    /// Profile name
    pub name: String,
    /// Peak pointer velocity (pixels/second)
    pub max_velocity: f64,
    /// Acceleration character (pixels/second²)
    pub acceleration: f64,
    /// Per-axis uniform jitter amplitude (pixels)
    pub jitter_amount: f64,
    /// Probability of overshooting the target
    pub overshoot_chance: f64,
    /// Pause after arrival (seconds)
    pub dwell_time: ValueRange,
    /// Fitts' intercept (seconds)
    pub fitts_a: f64,
    /// Fitts' slope (seconds per bit)
    pub fitts_b: f64,
    /// Tremor oscillation amplitude (pixels)
    pub tremor_intensity: f64,
    /// Reaction latency before motion starts (seconds)
    pub hand_eye_delay: ValueRange,
    /// Perpendicular control-point offset as a fraction of distance
    pub path_curvature: f64,
    /// Distance travelled past the target on overshoot (pixels)
    pub overshoot_distance: ValueRange,
}

impl MotionProfile {
    pub fn natural() -> Self {
        Self {
            name: "natural".to_string(),
            max_velocity: 800.0,
            acceleration: 2000.0,
            jitter_amount: 2.0,
            overshoot_chance: 0.15,
            dwell_time: ValueRange::new(0.02, 0.08),
            fitts_a: 0.1,
            fitts_b: 0.15,
            tremor_intensity: 0.5,
            hand_eye_delay: ValueRange::new(0.05, 0.15),
            path_curvature: 0.15,
            overshoot_distance: ValueRange::new(8.0, 25.0),
        }
    }

    pub fn careful() -> Self {
        Self {
            name: "careful".to_string(),
            max_velocity: 400.0,
            acceleration: 1200.0,
            jitter_amount: 1.0,
            overshoot_chance: 0.05,
            dwell_time: ValueRange::new(0.05, 0.12),
            fitts_a: 0.15,
            fitts_b: 0.2,
            tremor_intensity: 0.3,
            hand_eye_delay: ValueRange::new(0.1, 0.25),
            path_curvature: 0.1,
            overshoot_distance: ValueRange::new(5.0, 15.0),
        }
    }

    pub fn fast() -> Self {
        Self {
            name: "fast".to_string(),
            max_velocity: 1200.0,
            acceleration: 3000.0,
            jitter_amount: 3.0,
            overshoot_chance: 0.25,
            dwell_time: ValueRange::new(0.01, 0.04),
            fitts_a: 0.05,
            fitts_b: 0.1,
            tremor_intensity: 0.8,
            hand_eye_delay: ValueRange::new(0.03, 0.08),
            path_curvature: 0.2,
            overshoot_distance: ValueRange::new(10.0, 30.0),
        }
    }

    /// Check every range is ordered and every magnitude is non-negative.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let magnitudes = [
            ("max_velocity", self.max_velocity),
            ("acceleration", self.acceleration),
            ("jitter_amount", self.jitter_amount),
            ("fitts_a", self.fitts_a),
            ("fitts_b", self.fitts_b),
            ("tremor_intensity", self.tremor_intensity),
            ("path_curvature", self.path_curvature),
        ];
        for (field, value) in magnitudes {
            if !value.is_finite() || value < 0.0 {
                return Err(crate::Error::Config(format!(
                    "{}.{} must be a finite value >= 0, got {}",
                    self.name, field, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.overshoot_chance) {
            return Err(crate::Error::Config(format!(
                "{}.overshoot_chance must be in [0, 1], got {}",
                self.name, self.overshoot_chance
            )));
        }
        for (field, range) in [("dwell_time", self.dwell_time), ("hand_eye_delay", self.hand_eye_delay)] {
            range.validate(&format!("{}.{}", self.name, field))?;
            if range.max > MAX_PAUSE_SECS {
                return Err(crate::Error::Config(format!(
                    "{}.{} must be at most {}s, got max {}",
                    self.name, field, MAX_PAUSE_SECS, range.max
                )));
            }
        }
        self.overshoot_distance.validate(&format!("{}.overshoot_distance", self.name))?;
        Ok(())
    }

    /// Copy of this profile with caller overrides applied, validated.
    pub fn with_overrides(&self, overrides: &ProfileOverrides) -> Result<Self, crate::Error> {
        let mut profile = self.clone();
        overrides.apply_to(&mut profile);
        profile.validate()?;
        Ok(profile)
    }
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self::natural()
    }
}

/// Per-field overrides for a motion profile.
///
/// Every field is optional; unset fields keep the profile's value. Used for
/// the `[overrides]` config section and for per-request tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_velocity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overshoot_chance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dwell_time_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dwell_time_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitts_a: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitts_b: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tremor_intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_eye_delay_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_eye_delay_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_curvature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overshoot_distance_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overshoot_distance_max: Option<f64>,
}

impl ProfileOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combine two override sets; values in `other` win.
    pub fn merged_with(&self, other: &ProfileOverrides) -> ProfileOverrides {
        ProfileOverrides {
            max_velocity: other.max_velocity.or(self.max_velocity),
            acceleration: other.acceleration.or(self.acceleration),
            jitter_amount: other.jitter_amount.or(self.jitter_amount),
            overshoot_chance: other.overshoot_chance.or(self.overshoot_chance),
            dwell_time_min: other.dwell_time_min.or(self.dwell_time_min),
            dwell_time_max: other.dwell_time_max.or(self.dwell_time_max),
            fitts_a: other.fitts_a.or(self.fitts_a),
            fitts_b: other.fitts_b.or(self.fitts_b),
            tremor_intensity: other.tremor_intensity.or(self.tremor_intensity),
            hand_eye_delay_min: other.hand_eye_delay_min.or(self.hand_eye_delay_min),
            hand_eye_delay_max: other.hand_eye_delay_max.or(self.hand_eye_delay_max),
            path_curvature: other.path_curvature.or(self.path_curvature),
            overshoot_distance_min: other.overshoot_distance_min.or(self.overshoot_distance_min),
            overshoot_distance_max: other.overshoot_distance_max.or(self.overshoot_distance_max),
        }
    }

    fn apply_to(&self, profile: &mut MotionProfile) {
        fn set(slot: &mut f64, value: Option<f64>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut profile.max_velocity, self.max_velocity);
        set(&mut profile.acceleration, self.acceleration);
        set(&mut profile.jitter_amount, self.jitter_amount);
        set(&mut profile.overshoot_chance, self.overshoot_chance);
        set(&mut profile.dwell_time.min, self.dwell_time_min);
        set(&mut profile.dwell_time.max, self.dwell_time_max);
        set(&mut profile.fitts_a, self.fitts_a);
        set(&mut profile.fitts_b, self.fitts_b);
        set(&mut profile.tremor_intensity, self.tremor_intensity);
        set(&mut profile.hand_eye_delay.min, self.hand_eye_delay_min);
        set(&mut profile.hand_eye_delay.max, self.hand_eye_delay_max);
        set(&mut profile.path_curvature, self.path_curvature);
        set(&mut profile.overshoot_distance.min, self.overshoot_distance_min);
        set(&mut profile.overshoot_distance.max, self.overshoot_distance_max);
    }
}
