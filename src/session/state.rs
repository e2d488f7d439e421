//! Mutable persona session state

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lower bound for energy and focus
pub const LEVEL_MIN: f64 = 0.5;
/// Upper bound for energy and focus
pub const LEVEL_MAX: f64 = 1.5;
/// Fatigue never exceeds this value
pub const FATIGUE_MAX: f64 = 0.5;

/// Per-movement drift of the energy level
const ENERGY_DRIFT: f64 = 0.05;
/// Per-movement drift of the focus level
const FOCUS_DRIFT: f64 = 0.1;

/// Energy, focus and fatigue of one persona instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Affects speed, in [0.5, 1.5]
    pub energy_level: f64,
    /// Affects precision, in [0.5, 1.5]
    pub focus_level: f64,
    /// Grows with session time, in [0, 0.5]
    pub fatigue_accumulation: f64,
}

impl SessionState {
    /// Random walk of energy (slow) and focus (faster), clamped to bounds.
    pub fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.energy_level = (self.energy_level + rng.gen_range(-ENERGY_DRIFT..=ENERGY_DRIFT))
            .clamp(LEVEL_MIN, LEVEL_MAX);
        self.focus_level = (self.focus_level + rng.gen_range(-FOCUS_DRIFT..=FOCUS_DRIFT))
            .clamp(LEVEL_MIN, LEVEL_MAX);
    }

    /// Set fatigue from elapsed session minutes and a per-minute rate.
    pub fn accumulate_fatigue(&mut self, session_minutes: f64, fatigue_rate: f64) {
        let raw = session_minutes.max(0.0) * fatigue_rate.max(0.0);
        self.fatigue_accumulation = if raw.is_finite() { raw.min(FATIGUE_MAX) } else { FATIGUE_MAX };
    }

    /// Speed multiplier from fatigue, floored at 0.7.
    pub fn speed_fatigue_factor(&self) -> f64 {
        (1.0 - self.fatigue_accumulation * 0.1).max(0.7)
    }

    /// Precision multiplier from fatigue, floored at 0.8.
    pub fn precision_fatigue_factor(&self) -> f64 {
        (1.0 - self.fatigue_accumulation * 0.05).max(0.8)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            energy_level: 1.0,
            focus_level: 1.0,
            fatigue_accumulation: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_default_state() {
        let state = SessionState::default();
        assert_eq!(state.energy_level, 1.0);
        assert_eq!(state.focus_level, 1.0);
        assert_eq!(state.fatigue_accumulation, 0.0);
    }

    #[test]
    fn test_drift_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut state = SessionState::default();
        for _ in 0..5_000 {
            state.drift(&mut rng);
            assert!((LEVEL_MIN..=LEVEL_MAX).contains(&state.energy_level));
            assert!((LEVEL_MIN..=LEVEL_MAX).contains(&state.focus_level));
        }
    }

    #[test]
    fn test_single_drift_step_is_small() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = SessionState::default();
        state.drift(&mut rng);
        assert!((state.energy_level - 1.0).abs() <= ENERGY_DRIFT);
        assert!((state.focus_level - 1.0).abs() <= FOCUS_DRIFT);
    }

    #[test]
    fn test_fatigue_caps_at_max() {
        let mut state = SessionState::default();
        state.accumulate_fatigue(10.0, 0.02);
        assert!((state.fatigue_accumulation - 0.2).abs() < 1e-12);
        state.accumulate_fatigue(600.0, 0.02);
        assert_eq!(state.fatigue_accumulation, FATIGUE_MAX);
    }

    #[test]
    fn test_fatigue_ignores_negative_minutes() {
        let mut state = SessionState::default();
        state.accumulate_fatigue(-5.0, 0.01);
        assert_eq!(state.fatigue_accumulation, 0.0);
    }

    #[test]
    fn test_fatigue_factors() {
        let mut state = SessionState::default();
        assert_eq!(state.speed_fatigue_factor(), 1.0);
        assert_eq!(state.precision_fatigue_factor(), 1.0);
        state.fatigue_accumulation = FATIGUE_MAX;
        assert!((state.speed_fatigue_factor() - 0.95).abs() < 1e-12);
        assert!((state.precision_fatigue_factor() - 0.975).abs() < 1e-12);
    }
}
