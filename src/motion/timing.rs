//! Fitts'-law timing model
//!
//! `duration = a + b * log2(distance / width + 1)`, divided by the movement's
//! speed factor, perturbed by a natural variance and floored.

use super::MovementParams;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default duration floor (seconds)
pub const MIN_DURATION_SECS: f64 = 0.1;

/// Smallest width used in the index of difficulty
const MIN_EFFECTIVE_WIDTH: f64 = 1e-6;

/// Random variance applied to the nominal duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationVariance {
    /// Multiply by a uniform factor in [min, max]
    Multiplicative { min: f64, max: f64 },
    /// Add a uniform offset in [-spread, +spread] seconds
    Additive(f64),
}

impl DurationVariance {
    fn apply<R: Rng + ?Sized>(&self, duration: f64, rng: &mut R) -> f64 {
        match *self {
            DurationVariance::Multiplicative { min, max } if max > min => duration * rng.gen_range(min..=max),
            DurationVariance::Multiplicative { min, .. } => duration * min,
            DurationVariance::Additive(spread) if spread > 0.0 => duration + rng.gen_range(-spread..=spread),
            DurationVariance::Additive(_) => duration,
        }
    }

    /// Largest duration the variance can produce from `duration`.
    fn upper_bound(&self, duration: f64) -> f64 {
        match *self {
            DurationVariance::Multiplicative { min, max } => duration * min.max(max),
            DurationVariance::Additive(spread) => duration + spread.max(0.0),
        }
    }
}

/// Index of difficulty in bits: `log2(distance / width + 1)`.
///
/// Zero or negative distance yields 0; tiny widths are clamped so the result
/// stays finite.
pub fn index_of_difficulty(distance: f64, target_width: f64) -> f64 {
    if !distance.is_finite() || distance <= 0.0 {
        return 0.0;
    }
    let width = if target_width.is_finite() {
        target_width.max(MIN_EFFECTIVE_WIDTH)
    } else {
        MIN_EFFECTIVE_WIDTH
    };
    (distance / width + 1.0).log2()
}

/// Raw Fitts' movement time `a + b * ID` (seconds).
pub fn fitts_duration(a: f64, b: f64, distance: f64, target_width: f64) -> f64 {
    a + b * index_of_difficulty(distance, target_width)
}

/// Duration without randomness: Fitts' time over speed factor, floored.
pub fn nominal_duration(params: &MovementParams, distance: f64, target_width: f64) -> f64 {
    let raw = fitts_duration(params.fitts_a, params.fitts_b, distance, target_width) / params.speed_factor;
    floor(raw, params.min_duration)
}

/// Duration for one movement, including natural variance.
pub fn movement_duration<R: Rng + ?Sized>(
    params: &MovementParams,
    distance: f64,
    target_width: f64,
    rng: &mut R,
) -> f64 {
    let raw = fitts_duration(params.fitts_a, params.fitts_b, distance, target_width) / params.speed_factor;
    floor(params.duration_variance.apply(raw, rng), params.min_duration)
}

/// Largest duration `movement_duration` can return for these inputs.
pub fn max_movement_duration(params: &MovementParams, distance: f64, target_width: f64) -> f64 {
    let raw = fitts_duration(params.fitts_a, params.fitts_b, distance, target_width) / params.speed_factor;
    floor(params.duration_variance.upper_bound(raw), params.min_duration)
}

fn floor(duration: f64, min_duration: f64) -> f64 {
    if duration.is_finite() {
        duration.max(min_duration)
    } else {
        min_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::MotionProfile;
    use rand::{rngs::StdRng, SeedableRng};

    fn natural() -> MovementParams {
        MovementParams::from_motion(&MotionProfile::natural(), MIN_DURATION_SECS)
    }

    #[test]
    fn test_index_of_difficulty() {
        assert_eq!(index_of_difficulty(300.0, 20.0), 4.0);
        assert_eq!(index_of_difficulty(0.0, 20.0), 0.0);
        assert_eq!(index_of_difficulty(-5.0, 20.0), 0.0);
        assert!(index_of_difficulty(100.0, 0.0).is_finite());
        assert!(index_of_difficulty(100.0, f64::NAN).is_finite());
    }

    #[test]
    fn test_example_nominal_duration() {
        // 0.1 + 0.15 * log2(300 / 20 + 1) = 0.7
        let nominal = nominal_duration(&natural(), 300.0, 20.0);
        assert!((nominal - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_duration_within_variance_band() {
        let params = natural();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..500 {
            let d = movement_duration(&params, 300.0, 20.0, &mut rng);
            assert!(d >= 0.7 * 0.85 - 1e-12 && d <= 0.7 * 1.15 + 1e-12, "duration {}", d);
        }
        assert!((max_movement_duration(&params, 300.0, 20.0) - 0.805).abs() < 1e-12);
    }

    #[test]
    fn test_zero_distance_yields_floor() {
        let mut params = natural();
        params.fitts_a = 0.0;
        let mut rng = StdRng::seed_from_u64(1);
        let d = movement_duration(&params, 0.0, 20.0, &mut rng);
        assert_eq!(d, MIN_DURATION_SECS);
        assert!(!d.is_nan());
    }

    #[test]
    fn test_duration_monotonic_in_difficulty() {
        let params = natural();
        let mut previous = 0.0;
        for distance in (0..2000).step_by(25) {
            for width in [5.0, 20.0, 80.0] {
                let d = nominal_duration(&params, distance as f64, width);
                assert!(d >= MIN_DURATION_SECS);
            }
            let d = nominal_duration(&params, distance as f64, 20.0);
            assert!(d >= previous, "duration decreased at distance {}", distance);
            previous = d;
        }
    }

    #[test]
    fn test_smaller_width_is_slower() {
        let params = natural();
        assert!(nominal_duration(&params, 500.0, 5.0) > nominal_duration(&params, 500.0, 50.0));
    }

    #[test]
    fn test_additive_variance_band() {
        let mut params = natural();
        params.duration_variance = DurationVariance::Additive(0.15);
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..200 {
            let d = movement_duration(&params, 300.0, 20.0, &mut rng);
            assert!(d >= 0.55 - 1e-12 && d <= 0.85 + 1e-12);
        }
    }

    #[test]
    fn test_speed_factor_shortens_duration() {
        let mut params = natural();
        params.speed_factor = 2.0;
        assert!((nominal_duration(&params, 300.0, 20.0) - 0.35).abs() < 1e-12);
    }
}
