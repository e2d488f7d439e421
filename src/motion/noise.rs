//! Bounded positional noise: uniform jitter, low-frequency tremor and, for
//! personas, precision-scaled micro-movements.

use super::MovementParams;
use rand::Rng;
use std::f64::consts::PI;

/// Noise magnitude never exceeds this multiple of `jitter + tremor`.
pub const NOISE_BOUND_FACTOR: f64 = 3.0;

/// Micro-movement amplitude before precision scaling (pixels)
const MICRO_MOVEMENT_AMPLITUDE: f64 = 0.3;

/// Tremor oscillations across one movement, per axis
const TREMOR_X_FREQUENCY: f64 = 8.0 * PI;
const TREMOR_Y_FREQUENCY: f64 = 6.0 * PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseModel {
    jitter: f64,
    tremor: f64,
    micro: f64,
}

impl NoiseModel {
    pub fn new(jitter: f64, tremor: f64) -> Self {
        Self {
            jitter: jitter.max(0.0),
            tremor: tremor.max(0.0),
            micro: 0.0,
        }
    }

    /// Add micro-movements of amplitude `0.3 * (2 - precision)`.
    pub fn with_micro_movements(mut self, precision: f64) -> Self {
        self.micro = MICRO_MOVEMENT_AMPLITUDE * (2.0 - precision.clamp(0.0, 1.0));
        self
    }

    pub fn from_params(params: &MovementParams) -> Self {
        let model = Self::new(params.jitter_amount, params.tremor_intensity);
        if params.micro_movements {
            model.with_micro_movements(params.precision)
        } else {
            model
        }
    }

    /// Largest displacement `sample` can return (pixels).
    pub fn bound(&self) -> f64 {
        NOISE_BOUND_FACTOR * (self.jitter + self.tremor)
    }

    /// Displacement `(dx, dy)` at linear progress `progress`.
    pub fn sample<R: Rng + ?Sized>(&self, progress: f64, rng: &mut R) -> (f64, f64) {
        let mut dx = 0.0;
        let mut dy = 0.0;

        if self.jitter > 0.0 {
            dx += rng.gen_range(-self.jitter..=self.jitter);
            dy += rng.gen_range(-self.jitter..=self.jitter);
        }
        if self.tremor > 0.0 {
            dx += (progress * TREMOR_X_FREQUENCY).sin() * self.tremor * rng.gen_range(0.5..=1.0);
            dy += (progress * TREMOR_Y_FREQUENCY).cos() * self.tremor * rng.gen_range(0.5..=1.0);
        }
        if self.micro > 0.0 {
            dx += rng.gen_range(-self.micro..=self.micro);
            dy += rng.gen_range(-self.micro..=self.micro);
        }

        let magnitude = (dx * dx + dy * dy).sqrt();
        let bound = self.bound();
        if magnitude > bound {
            if magnitude > 0.0 && bound > 0.0 {
                let scale = bound / magnitude;
                return (dx * scale, dy * scale);
            }
            return (0.0, 0.0);
        }
        (dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_noise_respects_bound() {
        let mut rng = StdRng::seed_from_u64(3);
        let model = NoiseModel::new(3.0, 0.8).with_micro_movements(0.0);
        for i in 0..2000 {
            let (dx, dy) = model.sample(i as f64 / 2000.0, &mut rng);
            assert!((dx * dx + dy * dy).sqrt() <= model.bound() + 1e-9);
        }
    }

    #[test]
    fn test_zero_noise_is_silent() {
        let mut rng = StdRng::seed_from_u64(3);
        let model = NoiseModel::new(0.0, 0.0);
        assert_eq!(model.sample(0.5, &mut rng), (0.0, 0.0));
        assert_eq!(model.bound(), 0.0);
    }

    #[test]
    fn test_micro_movement_scales_with_precision() {
        let sloppy = NoiseModel::new(1.0, 0.0).with_micro_movements(0.2);
        let precise = NoiseModel::new(1.0, 0.0).with_micro_movements(1.0);
        assert!(sloppy.micro > precise.micro);
        assert!((precise.micro - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_negative_amplitudes_are_ignored() {
        let model = NoiseModel::new(-1.0, -2.0);
        assert_eq!(model.bound(), 0.0);
    }
}
