//! Motion Synthesis
//!
//! Turns a movement request into a timestamped waypoint sequence:
//! Fitts'-law duration, eased cubic Bézier positions, jitter/tremor noise,
//! settle points and an optional overshoot with corrections.

pub mod easing;
pub mod noise;
pub mod overshoot;
pub mod path;
pub mod timing;

pub use overshoot::OvershootDirection;
pub use path::PathGenerator;
pub use timing::DurationVariance;

use crate::profile::{CountRange, MotionProfile, PersonaProfile, ProfileOverrides, ValueRange};
use crate::session::AdjustedParameters;
use serde::{Deserialize, Serialize};

/// Largest absolute coordinate a request or waypoint may use (pixels)
pub const MAX_COORDINATE_PX: f64 = 1_000_000.0;
/// Largest absolute waypoint coordinate the executor can round to `i32`
const MAX_PIXEL_PX: f64 = i32::MAX as f64;

/// Screen position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation towards `other`.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Nearest integer pixel.
    pub fn rounded(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Finite and at most `limit` from the origin on both axes.
    pub fn is_within(&self, limit: f64) -> bool {
        self.is_finite() && self.x.abs() <= limit && self.y.abs() <= limit
    }
}

/// Role of a waypoint within a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointKind {
    /// On the nominal Bézier path
    Path,
    /// Micro-adjustment after nominal arrival
    Settle,
    /// Past the target
    Overshoot,
    /// Corrective step back towards the target
    Correction,
}

/// A position with its scheduled offset from movement start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    /// Seconds from movement start
    pub t: f64,
    pub kind: WaypointKind,
}

impl Waypoint {
    pub fn new(point: Point, t: f64, kind: WaypointKind) -> Self {
        Self {
            x: point.x,
            y: point.y,
            t,
            kind,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Execution pacing that travels with a synthesized path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pacing {
    /// Post-motion pause (seconds)
    pub dwell_time: ValueRange,
    /// Multiplier on the executor's per-step extra delay; 0 disables it
    pub step_jitter_scale: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            dwell_time: ValueRange::new(0.0, 0.0),
            step_jitter_scale: 0.0,
        }
    }
}

/// Ordered, timestamped output of the path generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointSequence {
    /// Behaviour that produced the path
    pub profile: String,
    pub start: Point,
    pub target: Point,
    pub target_width: f64,
    /// Nominal movement duration from the timing model (seconds)
    pub duration: f64,
    pub waypoints: Vec<Waypoint>,
    /// Whether an overshoot and corrections were appended
    pub overshoot: bool,
    pub pacing: Pacing,
}

impl WaypointSequence {
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn first(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// Waypoints on the nominal Bézier path, excluding settle and overshoot.
    pub fn nominal(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter().filter(|w| w.kind == WaypointKind::Path)
    }

    /// Offset of the final waypoint (seconds).
    pub fn total_duration(&self) -> f64 {
        self.last().map(|w| w.t).unwrap_or(0.0)
    }

    /// Mean gap between consecutive timestamps (seconds).
    pub fn mean_step_interval(&self) -> f64 {
        if self.waypoints.len() < 2 {
            return 0.0;
        }
        let first = self.waypoints[0].t;
        (self.total_duration() - first) / (self.waypoints.len() - 1) as f64
    }

    /// Reject sequences the executor cannot run: empty, non-finite values or
    /// timestamps going backwards.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.waypoints.is_empty() {
            return Err(crate::Error::InvalidState("waypoint sequence is empty".to_string()));
        }
        let mut previous = f64::NEG_INFINITY;
        for (i, waypoint) in self.waypoints.iter().enumerate() {
            if !waypoint.point().is_finite() || !waypoint.t.is_finite() {
                return Err(crate::Error::InvalidState(format!(
                    "waypoint {} has a non-finite value",
                    i
                )));
            }
            if !waypoint.point().is_within(MAX_PIXEL_PX) {
                return Err(crate::Error::InvalidState(format!(
                    "waypoint {} at ({}, {}) is outside the integer pixel range",
                    i, waypoint.x, waypoint.y
                )));
            }
            if waypoint.t < 0.0 || waypoint.t < previous {
                return Err(crate::Error::InvalidState(format!(
                    "waypoint {} timestamp {} is out of order",
                    i, waypoint.t
                )));
            }
            previous = waypoint.t;
        }
        Ok(())
    }
}

/// A caller's request to move the pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub start: Point,
    pub target: Point,
    /// Landing tolerance used by Fitts' law (pixels, > 0)
    pub target_width: f64,
    /// Per-request profile tuning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ProfileOverrides>,
}

impl MovementRequest {
    pub fn new(start: Point, target: Point, target_width: f64) -> Self {
        Self {
            start,
            target,
            target_width,
            overrides: None,
        }
    }

    pub fn with_overrides(mut self, overrides: ProfileOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn distance(&self) -> f64 {
        self.start.distance_to(&self.target)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.start.is_finite() || !self.target.is_finite() {
            return Err(crate::Error::Config(format!(
                "movement endpoints must be finite, got {:?} -> {:?}",
                self.start, self.target
            )));
        }
        if !self.start.is_within(MAX_COORDINATE_PX) || !self.target.is_within(MAX_COORDINATE_PX) {
            return Err(crate::Error::Config(format!(
                "movement endpoints must lie within {} px of the origin, got {:?} -> {:?}",
                MAX_COORDINATE_PX, self.start, self.target
            )));
        }
        if !self.target_width.is_finite() || self.target_width <= 0.0 {
            return Err(crate::Error::Config(format!(
                "target_width must be > 0, got {}",
                self.target_width
            )));
        }
        Ok(())
    }
}

/// Flattened parameters for a single movement.
///
/// Built either from a motion profile or from a persona plus the session
/// adjustments for this movement, so the generator has one code path.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementParams {
    pub name: String,
    pub fitts_a: f64,
    pub fitts_b: f64,
    pub duration_variance: DurationVariance,
    /// Movement time is divided by this
    pub speed_factor: f64,
    /// Floor for movement duration (seconds)
    pub min_duration: f64,
    /// Precision in (0, 1]; drives step density
    pub precision: f64,
    pub jitter_amount: f64,
    pub tremor_intensity: f64,
    pub path_curvature: f64,
    pub micro_movements: bool,
    pub overshoot_chance: f64,
    pub overshoot_distance: ValueRange,
    pub overshoot_direction: OvershootDirection,
    pub correction_attempts: CountRange,
    /// Fractional increase of each correction's wait per step
    pub correction_wait_growth: f64,
    pub dwell_time: ValueRange,
    pub hand_eye_delay: ValueRange,
    /// Probability of an extra pause before moving
    pub hesitation_chance: f64,
    /// Hesitation pause range (seconds)
    pub hesitation_pause: ValueRange,
    pub step_jitter_scale: f64,
}

/// Base-engine correction count
const BASE_CORRECTION_ATTEMPTS: CountRange = CountRange::new(2, 4);
/// Base-engine overshoot angle deviation (radians)
const BASE_OVERSHOOT_DEVIATION: f64 = 0.3;
/// Persona correction waits grow by this fraction per step
const PERSONA_CORRECTION_GROWTH: f64 = 0.5;
/// Persona additive duration variance (seconds)
const PERSONA_DURATION_VARIANCE: f64 = 0.15;
/// Hesitation pause before dividing by decision speed (seconds)
const HESITATION_PAUSE: ValueRange = ValueRange::new(0.1, 0.4);
/// Lowest precision used for step density and noise scaling
const MIN_PRECISION: f64 = 0.05;

impl MovementParams {
    /// Parameters for a static motion profile.
    pub fn from_motion(profile: &MotionProfile, min_duration: f64) -> Self {
        Self {
            name: profile.name.clone(),
            fitts_a: profile.fitts_a,
            fitts_b: profile.fitts_b,
            duration_variance: DurationVariance::Multiplicative { min: 0.85, max: 1.15 },
            speed_factor: 1.0,
            min_duration,
            precision: 1.0,
            jitter_amount: profile.jitter_amount,
            tremor_intensity: profile.tremor_intensity,
            path_curvature: profile.path_curvature,
            micro_movements: false,
            overshoot_chance: profile.overshoot_chance,
            overshoot_distance: profile.overshoot_distance,
            overshoot_direction: OvershootDirection::Directional {
                max_deviation: BASE_OVERSHOOT_DEVIATION,
            },
            correction_attempts: BASE_CORRECTION_ATTEMPTS,
            correction_wait_growth: 0.0,
            dwell_time: profile.dwell_time,
            hand_eye_delay: profile.hand_eye_delay,
            hesitation_chance: 0.0,
            hesitation_pause: ValueRange::new(0.0, 0.0),
            step_jitter_scale: 0.0,
        }
    }

    /// Parameters for a persona, given its (possibly overridden) motion
    /// family and this movement's session adjustments.
    pub fn from_persona(
        motion: &MotionProfile,
        persona: &PersonaProfile,
        adjusted: &AdjustedParameters,
        min_duration: f64,
    ) -> Self {
        let traits = &persona.traits;
        let precision = adjusted.precision.clamp(MIN_PRECISION, 1.0);
        Self {
            name: persona.key().to_string(),
            fitts_a: motion.fitts_a / traits.decision_speed,
            fitts_b: motion.fitts_b / traits.decision_speed,
            duration_variance: DurationVariance::Additive(PERSONA_DURATION_VARIANCE),
            speed_factor: adjusted.speed_factor,
            min_duration,
            precision,
            jitter_amount: motion.jitter_amount,
            tremor_intensity: motion.tremor_intensity,
            path_curvature: motion.path_curvature,
            micro_movements: traits.micro_movements,
            overshoot_chance: motion.overshoot_chance,
            overshoot_distance: motion.overshoot_distance.scaled(1.0 - precision),
            overshoot_direction: OvershootDirection::Uniform,
            correction_attempts: traits.correction_attempts,
            correction_wait_growth: PERSONA_CORRECTION_GROWTH,
            dwell_time: motion.dwell_time,
            hand_eye_delay: motion.hand_eye_delay,
            hesitation_chance: traits.hesitation_tendency,
            hesitation_pause: HESITATION_PAUSE.scaled(1.0 / traits.decision_speed),
            step_jitter_scale: (2.0 - traits.decision_speed).max(0.0),
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            dwell_time: self.dwell_time,
            step_jitter_scale: self.step_jitter_scale,
        }
    }
}
