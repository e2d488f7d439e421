//! Profiles and Personas
//!
//! Selectable behaviour for the motion engine. A [`Behavior`] is either a
//! static [`MotionProfile`] or a [`PersonaProfile`] with session state; both
//! are chosen by name through [`ProfileSelection`].

pub mod motion;
pub mod persona;

pub use motion::{CountRange, MotionPreset, MotionProfile, ProfileOverrides, ValueRange};
pub use persona::{
    ExperienceLevel, PersonaKind, PersonaProfile, PersonaStatus, PersonaTraits, SpeedTier,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named profile or persona, resolved from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileSelection {
    Motion(MotionPreset),
    Persona(PersonaKind),
}

impl ProfileSelection {
    /// Resolve a profile or persona name.
    ///
    /// Matching is case-insensitive; spaces and dashes count as underscores.
    /// Unknown names are a configuration error.
    pub fn parse(name: &str) -> Result<Self, crate::Error> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        let selection = match normalized.as_str() {
            "natural" | "default" | "normal" => ProfileSelection::Motion(MotionPreset::Natural),
            "careful" | "slow" | "precise" => ProfileSelection::Motion(MotionPreset::Careful),
            "fast" | "quick" => ProfileSelection::Motion(MotionPreset::Fast),
            "tech_professional" | "techprofessional" | "tech" | "expert" | "developer" => {
                ProfileSelection::Persona(PersonaKind::TechProfessional)
            }
            "casual_user" | "casualuser" | "casual" | "intermediate" => {
                ProfileSelection::Persona(PersonaKind::CasualUser)
            }
            "senior_user" | "senioruser" | "senior" | "beginner" => {
                ProfileSelection::Persona(PersonaKind::SeniorUser)
            }
            _ => {
                return Err(crate::Error::Config(format!(
                    "Unknown profile or persona '{}'. Available: {}",
                    name,
                    list_names().join(", ")
                )))
            }
        };
        Ok(selection)
    }

    pub fn key(&self) -> &'static str {
        match self {
            ProfileSelection::Motion(preset) => preset.key(),
            ProfileSelection::Persona(kind) => kind.key(),
        }
    }

    /// Fresh behaviour instance for this selection.
    pub fn build(&self) -> Behavior {
        match self {
            ProfileSelection::Motion(preset) => Behavior::Motion(preset.profile()),
            ProfileSelection::Persona(kind) => Behavior::Persona(Box::new(kind.persona())),
        }
    }
}

impl FromStr for ProfileSelection {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProfileSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Active behaviour of a motion engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Motion(MotionProfile),
    Persona(Box<PersonaProfile>),
}

impl Behavior {
    /// Resolve a name into a fresh behaviour.
    pub fn from_name(name: &str) -> Result<Self, crate::Error> {
        Ok(ProfileSelection::parse(name)?.build())
    }

    pub fn name(&self) -> &str {
        match self {
            Behavior::Motion(profile) => &profile.name,
            Behavior::Persona(persona) => persona.key(),
        }
    }

    /// The motion profile in effect (a persona's derived family).
    pub fn motion(&self) -> &MotionProfile {
        match self {
            Behavior::Motion(profile) => profile,
            Behavior::Persona(persona) => &persona.motion,
        }
    }

    pub fn persona(&self) -> Option<&PersonaProfile> {
        match self {
            Behavior::Persona(persona) => Some(persona),
            Behavior::Motion(_) => None,
        }
    }
}

impl From<MotionProfile> for Behavior {
    fn from(profile: MotionProfile) -> Self {
        Behavior::Motion(profile)
    }
}

impl From<PersonaProfile> for Behavior {
    fn from(persona: PersonaProfile) -> Self {
        Behavior::Persona(Box::new(persona))
    }
}

/// Canonical names of every profile and persona.
pub fn list_names() -> Vec<&'static str> {
    MotionPreset::ALL
        .iter()
        .map(|p| p.key())
        .chain(PersonaKind::ALL.iter().map(|k| k.key()))
        .collect()
}

/// Canonical motion profile names.
pub fn list_profiles() -> Vec<&'static str> {
    MotionPreset::ALL.iter().map(|p| p.key()).collect()
}

/// Canonical persona names.
pub fn list_personas() -> Vec<&'static str> {
    PersonaKind::ALL.iter().map(|k| k.key()).collect()
}

/// `(key, description)` for every persona.
pub fn persona_summaries() -> Vec<(&'static str, String)> {
    PersonaKind::ALL
        .iter()
        .map(|k| (k.key(), k.persona().description))
        .collect()
}
