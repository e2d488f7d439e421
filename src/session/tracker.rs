//! Session tracker
//!
//! Owns the session start time and, before each movement, advances a
//! persona's fatigue, drifts its energy and focus, and derives the speed and
//! precision for that one movement.

use crate::profile::PersonaProfile;
use crate::time::clock::Timestamp;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Speed factor limits applied to movement duration
const SPEED_FACTOR_MIN: f64 = 0.5;
const SPEED_FACTOR_MAX: f64 = 2.0;

/// Speed and precision in effect for a single movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedParameters {
    /// Adjusted pointer speed (pixels/second)
    pub speed: f64,
    /// `speed / base_speed`, clamped to [0.5, 2.0]; movement time divides by it
    pub speed_factor: f64,
    /// Adjusted precision in (0, 1]
    pub precision: f64,
}

impl AdjustedParameters {
    /// Apply energy, focus, fatigue and a random speed variance to a persona's traits.
    pub fn compute<R: Rng + ?Sized>(persona: &PersonaProfile, rng: &mut R) -> Self {
        let traits = &persona.traits;
        let state = &persona.state;

        let variance = if traits.speed_variance > 0.0 {
            rng.gen_range(-traits.speed_variance..=traits.speed_variance)
        } else {
            0.0
        };
        let speed = traits.base_speed * (1.0 + variance) * state.energy_level * state.speed_fatigue_factor();
        let precision = (traits.precision_level * state.focus_level * state.precision_fatigue_factor()).min(1.0);

        Self {
            speed,
            speed_factor: (speed / traits.base_speed).clamp(SPEED_FACTOR_MIN, SPEED_FACTOR_MAX),
            precision,
        }
    }
}

/// Tracks one automation session's elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct SessionTracker {
    started_at: Timestamp,
    movements: u64,
}

impl SessionTracker {
    /// Start a session at `now`.
    pub fn start(now: Timestamp) -> Self {
        Self {
            started_at: now,
            movements: 0,
        }
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Movements prepared so far in this session
    pub fn movements(&self) -> u64 {
        self.movements
    }

    pub fn elapsed_minutes(&self, now: Timestamp) -> f64 {
        now.duration_since(self.started_at).as_secs_f64() / 60.0
    }

    /// Update the persona's session state and return the parameters for the
    /// next movement.
    pub fn begin_movement<R: Rng + ?Sized>(
        &mut self,
        persona: &mut PersonaProfile,
        now: Timestamp,
        rng: &mut R,
    ) -> AdjustedParameters {
        let minutes = self.elapsed_minutes(now);
        let rate = persona.speed_tier().fatigue_rate();
        persona.state.accumulate_fatigue(minutes, rate);
        persona.state.drift(rng);
        self.movements += 1;

        let adjusted = AdjustedParameters::compute(persona, rng);
        debug!(
            persona = persona.key(),
            energy = persona.state.energy_level,
            focus = persona.state.focus_level,
            fatigue = persona.state.fatigue_accumulation,
            speed = adjusted.speed,
            precision = adjusted.precision,
            "Session state updated"
        );
        adjusted
    }
}
