//! User Personas
//!
//! A persona bundles behavioural traits of a class of computer user (speed,
//! precision, hesitation, correction habits) with mutable session state.
//! Each persona derives its motion family from those traits, so a persona is
//! a superset of a [`MotionProfile`].

use super::motion::{CountRange, MotionProfile, ValueRange};
use crate::session::SessionState;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Self-reported computer experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Expert => "expert",
        }
    }
}

/// Coefficient tier keyed on a persona's base speed.
///
/// Selects Fitts' coefficients and the fatigue rate: faster users have
/// smaller coefficients and tire more slowly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedTier {
    Fast,
    Moderate,
    Slow,
}

impl SpeedTier {
    pub fn from_base_speed(base_speed: f64) -> Self {
        if base_speed >= 1000.0 {
            SpeedTier::Fast
        } else if base_speed >= 600.0 {
            SpeedTier::Moderate
        } else {
            SpeedTier::Slow
        }
    }

    /// Fitts' (a, b) in seconds
    pub fn fitts_coefficients(&self) -> (f64, f64) {
        match self {
            SpeedTier::Fast => (0.05, 0.10),
            SpeedTier::Moderate => (0.10, 0.15),
            SpeedTier::Slow => (0.15, 0.20),
        }
    }

    /// Fatigue gained per session minute
    pub fn fatigue_rate(&self) -> f64 {
        match self {
            SpeedTier::Fast => 0.01,
            SpeedTier::Moderate => 0.015,
            SpeedTier::Slow => 0.02,
        }
    }
}

/// Canonical personas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaKind {
    TechProfessional,
    CasualUser,
    SeniorUser,
}

impl PersonaKind {
    pub const ALL: [PersonaKind; 3] = [
        PersonaKind::TechProfessional,
        PersonaKind::CasualUser,
        PersonaKind::SeniorUser,
    ];

    /// Canonical lookup key
    pub fn key(&self) -> &'static str {
        match self {
            PersonaKind::TechProfessional => "tech_professional",
            PersonaKind::CasualUser => "casual_user",
            PersonaKind::SeniorUser => "senior_user",
        }
    }

    /// Fresh persona instance with default session state.
    pub fn persona(&self) -> PersonaProfile {
        match self {
            PersonaKind::TechProfessional => PersonaProfile::tech_professional(),
            PersonaKind::CasualUser => PersonaProfile::casual_user(),
            PersonaKind::SeniorUser => PersonaProfile::senior_user(),
        }
    }
}

/// Behavioural traits of a persona's pointer hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaTraits {
    /// Base pointer speed (pixels/second)
    pub base_speed: f64,
    /// ± fractional speed variance per movement
    pub speed_variance: f64,
    /// How quickly the hand accelerates (0.5-2.0)
    pub acceleration_preference: f64,
    /// Aiming precision in [0, 1]
    pub precision_level: f64,
    /// Probability of overshooting a target
    pub overshoot_tendency: f64,
    /// Corrective sub-movements after an overshoot
    pub correction_attempts: CountRange,
    /// Button hold time (seconds)
    pub click_duration: ValueRange,
    /// Gap between the clicks of a double click (seconds)
    pub double_click_interval: f64,
    /// Pause after arrival (seconds)
    pub dwell_time: ValueRange,
    /// How curved the hand's paths are
    pub curvature_preference: f64,
    /// Whether the hand makes small involuntary adjustments
    pub micro_movements: bool,
    /// Tremor amplitude (pixels)
    pub tremor_intensity: f64,
    /// Probability of an extra pause before moving
    pub hesitation_tendency: f64,
    /// Decision speed multiplier (> 0, 1.0 is average)
    pub decision_speed: f64,
    /// Reaction latency before motion (seconds)
    pub hand_eye_delay: ValueRange,
}

impl PersonaTraits {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.base_speed.is_finite() || self.base_speed <= 0.0 {
            return Err(crate::Error::Config(format!(
                "base_speed must be > 0, got {}",
                self.base_speed
            )));
        }
        if !(0.0..1.0).contains(&self.speed_variance) {
            return Err(crate::Error::Config(format!(
                "speed_variance must be in [0, 1), got {}",
                self.speed_variance
            )));
        }
        let unit_fields = [
            ("precision_level", self.precision_level),
            ("overshoot_tendency", self.overshoot_tendency),
            ("hesitation_tendency", self.hesitation_tendency),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::Error::Config(format!(
                    "{} must be in [0, 1], got {}",
                    field, value
                )));
            }
        }
        if !self.decision_speed.is_finite() || self.decision_speed <= 0.0 {
            return Err(crate::Error::Config(format!(
                "decision_speed must be > 0, got {}",
                self.decision_speed
            )));
        }
        let magnitudes = [
            ("acceleration_preference", self.acceleration_preference),
            ("curvature_preference", self.curvature_preference),
            ("tremor_intensity", self.tremor_intensity),
            ("double_click_interval", self.double_click_interval),
        ];
        for (field, value) in magnitudes {
            if !value.is_finite() || value < 0.0 {
                return Err(crate::Error::Config(format!(
                    "{} must be a finite value >= 0, got {}",
                    field, value
                )));
            }
        }
        self.correction_attempts.validate("correction_attempts")?;
        self.click_duration.validate("click_duration")?;
        self.dwell_time.validate("dwell_time")?;
        self.hand_eye_delay.validate("hand_eye_delay")?;
        Ok(())
    }

    pub fn speed_tier(&self) -> SpeedTier {
        SpeedTier::from_base_speed(self.base_speed)
    }
}

/// A persona: identity, traits, derived motion family and session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub kind: PersonaKind,
    /// Display name
    pub name: String,
    pub description: String,
    pub experience_level: ExperienceLevel,
    pub traits: PersonaTraits,
    /// Motion family derived from the traits, possibly overridden
    pub motion: MotionProfile,
    /// Mutable session state, updated before every movement
    pub state: SessionState,
}

/// Read-only view of a persona's identity and current session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaStatus {
    pub key: String,
    pub name: String,
    pub description: String,
    pub experience_level: ExperienceLevel,
    pub energy_level: f64,
    pub focus_level: f64,
    pub fatigue_accumulation: f64,
}

impl PersonaProfile {
    /// Build a persona from validated traits, deriving its motion family.
    pub fn new(
        kind: PersonaKind,
        name: &str,
        description: &str,
        experience_level: ExperienceLevel,
        traits: PersonaTraits,
    ) -> Result<Self, crate::Error> {
        traits.validate()?;
        let motion = Self::motion_family(kind, &traits);
        motion.validate()?;
        Ok(Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            experience_level,
            traits,
            motion,
            state: SessionState::default(),
        })
    }

    /// Motion profile equivalent of a persona's traits.
    pub fn motion_family(kind: PersonaKind, traits: &PersonaTraits) -> MotionProfile {
        let (fitts_a, fitts_b) = traits.speed_tier().fitts_coefficients();
        MotionProfile {
            name: format!("{}_persona", kind.key()),
            max_velocity: traits.base_speed,
            acceleration: traits.base_speed * 2.5,
            jitter_amount: 2.0 * (1.0 - traits.precision_level),
            overshoot_chance: traits.overshoot_tendency,
            dwell_time: traits.dwell_time,
            fitts_a,
            fitts_b,
            tremor_intensity: traits.tremor_intensity,
            hand_eye_delay: traits.hand_eye_delay,
            path_curvature: traits.curvature_preference * 0.5,
            overshoot_distance: ValueRange::new(8.0, 25.0),
        }
    }

    /// Software engineer: fast, precise, confident.
    pub fn tech_professional() -> Self {
        Self::from_preset(
            PersonaKind::TechProfessional,
            "Alex Chen",
            "Senior Software Engineer at tech company",
            ExperienceLevel::Expert,
            PersonaTraits {
                base_speed: 1200.0,
                speed_variance: 0.15,
                acceleration_preference: 1.8,
                precision_level: 0.9,
                overshoot_tendency: 0.05,
                correction_attempts: CountRange::new(1, 2),
                click_duration: ValueRange::new(0.045, 0.065),
                double_click_interval: 0.18,
                dwell_time: ValueRange::new(0.02, 0.05),
                curvature_preference: 0.2,
                micro_movements: true,
                tremor_intensity: 0.3,
                hesitation_tendency: 0.05,
                decision_speed: 1.8,
                hand_eye_delay: ValueRange::new(0.04, 0.10),
            },
        )
    }

    /// Office worker: moderate speed, occasionally hesitant.
    pub fn casual_user() -> Self {
        Self::from_preset(
            PersonaKind::CasualUser,
            "Sarah Johnson",
            "Marketing Manager with moderate computer experience",
            ExperienceLevel::Intermediate,
            PersonaTraits {
                base_speed: 800.0,
                speed_variance: 0.25,
                acceleration_preference: 1.2,
                precision_level: 0.75,
                overshoot_tendency: 0.15,
                correction_attempts: CountRange::new(1, 3),
                click_duration: ValueRange::new(0.06, 0.09),
                double_click_interval: 0.22,
                dwell_time: ValueRange::new(0.05, 0.15),
                curvature_preference: 0.4,
                micro_movements: true,
                tremor_intensity: 0.5,
                hesitation_tendency: 0.2,
                decision_speed: 1.0,
                hand_eye_delay: ValueRange::new(0.08, 0.18),
            },
        )
    }

    /// Retiree: slow, deliberate, frequent corrections.
    pub fn senior_user() -> Self {
        Self::from_preset(
            PersonaKind::SeniorUser,
            "Robert Williams",
            "Retiree learning to use computers more",
            ExperienceLevel::Beginner,
            PersonaTraits {
                base_speed: 400.0,
                speed_variance: 0.3,
                acceleration_preference: 0.8,
                precision_level: 0.6,
                overshoot_tendency: 0.3,
                correction_attempts: CountRange::new(2, 5),
                click_duration: ValueRange::new(0.08, 0.12),
                double_click_interval: 0.35,
                dwell_time: ValueRange::new(0.15, 0.4),
                curvature_preference: 0.6,
                micro_movements: true,
                tremor_intensity: 0.8,
                hesitation_tendency: 0.4,
                decision_speed: 0.6,
                hand_eye_delay: ValueRange::new(0.15, 0.35),
            },
        )
    }

    // Preset traits are known-valid (see test_presets_validate).
    fn from_preset(
        kind: PersonaKind,
        name: &str,
        description: &str,
        experience_level: ExperienceLevel,
        traits: PersonaTraits,
    ) -> Self {
        let motion = Self::motion_family(kind, &traits);
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            experience_level,
            traits,
            motion,
            state: SessionState::default(),
        }
    }

    pub fn key(&self) -> &'static str {
        self.kind.key()
    }

    pub fn speed_tier(&self) -> SpeedTier {
        self.traits.speed_tier()
    }

    /// Sample a button hold time typical for this persona.
    pub fn click_duration<R: Rng + ?Sized>(&self, rng: &mut R) -> std::time::Duration {
        crate::time::clock::secs_to_duration(self.traits.click_duration.sample(rng))
    }

    pub fn status(&self) -> PersonaStatus {
        PersonaStatus {
            key: self.key().to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            experience_level: self.experience_level,
            energy_level: self.state.energy_level,
            focus_level: self.state.focus_level,
            fatigue_accumulation: self.state.fatigue_accumulation,
        }
    }
}
