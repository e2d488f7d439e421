//! Path generation
//!
//! Builds the nominal cubic Bézier path, samples it with eased progress,
//! adds noise to interior points, then appends settle points and an optional
//! overshoot.
//!
//! ```text
//! start ──► control 1 ──► control 2 ──► target ──► settle ──► [overshoot ──► corrections]
//!   t=0                                   t=duration
//! ```

use super::easing::ease;
use super::noise::NoiseModel;
use super::overshoot::{self, append_overshoot, should_overshoot};
use super::timing::{max_movement_duration, movement_duration};
use super::{MovementParams, MovementRequest, Point, Waypoint, WaypointKind, WaypointSequence};
use rand::Rng;
use tracing::trace;

/// Minimum number of path steps
pub const MIN_STEPS: usize = 15;
/// Maximum number of path steps
pub const MAX_STEPS: usize = 10_000;

/// Pixels per step at full precision
const STEP_SPACING_PX: f64 = 10.0;

/// Settle points after nominal arrival
const SETTLE_POINTS: std::ops::RangeInclusive<usize> = 1..=3;
/// Settle scatter around the target (pixels)
const SETTLE_SCATTER_PX: f64 = 0.5;
/// Gap before each settle point (seconds)
const SETTLE_GAP_MIN: f64 = 0.01;
const SETTLE_GAP_MAX: f64 = 0.02;

/// Point on the cubic Bézier defined by `p0..p3` at parameter `t`.
pub fn cubic_bezier(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Turns a movement request into a waypoint sequence for one set of
/// movement parameters.
#[derive(Debug, Clone, Copy)]
pub struct PathGenerator<'a> {
    params: &'a MovementParams,
}

impl<'a> PathGenerator<'a> {
    pub fn new(params: &'a MovementParams) -> Self {
        Self { params }
    }

    /// `max(15, distance / (10 / precision))`, capped at `MAX_STEPS`
    pub fn step_count(&self, distance: f64) -> usize {
        if !distance.is_finite() || distance <= 0.0 {
            return MIN_STEPS;
        }
        let spacing = STEP_SPACING_PX / self.params.precision;
        ((distance / spacing) as usize).clamp(MIN_STEPS, MAX_STEPS)
    }

    /// Control points offset perpendicular to the start→target line by
    /// `curvature * distance * U(0.5, 1.5)`, each with a random side.
    pub fn control_points<R: Rng + ?Sized>(&self, start: Point, target: Point, rng: &mut R) -> (Point, Point) {
        let dx = target.x - start.x;
        let dy = target.y - start.y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance <= f64::EPSILON {
            return (start, target);
        }

        // Unit normal to the travel direction
        let nx = -dy / distance;
        let ny = dx / distance;

        let mut control = |fraction: f64| {
            let base = start.lerp(&target, fraction);
            let magnitude = self.params.path_curvature * distance * rng.gen_range(0.5..=1.5);
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            base.offset(nx * magnitude * sign, ny * magnitude * sign)
        };
        let c1 = control(1.0 / 3.0);
        let c2 = control(2.0 / 3.0);
        (c1, c2)
    }

    /// Synthesize the full waypoint sequence for `request`.
    pub fn generate<R: Rng + ?Sized>(&self, request: &MovementRequest, rng: &mut R) -> WaypointSequence {
        let start = request.start;
        let target = request.target;
        let distance = start.distance_to(&target);

        let duration = movement_duration(self.params, distance, request.target_width, rng);
        let (c1, c2) = self.control_points(start, target, rng);
        let steps = self.step_count(distance);
        let noise = NoiseModel::from_params(self.params);

        let mut waypoints = Vec::with_capacity(steps + 1 + *SETTLE_POINTS.end());
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let mut point = if i == steps {
                target
            } else {
                cubic_bezier(start, c1, c2, target, ease(t))
            };
            if i > 0 && i < steps {
                let (dx, dy) = noise.sample(t, rng);
                point = point.offset(dx, dy);
            }
            waypoints.push(Waypoint::new(point, duration * t, WaypointKind::Path));
        }

        append_settle(&mut waypoints, target, duration, rng);

        let overshoot = should_overshoot(self.params, rng);
        if overshoot {
            append_overshoot(&mut waypoints, start, target, self.params, rng);
        }

        trace!(
            profile = %self.params.name,
            distance,
            duration,
            steps,
            waypoints = waypoints.len(),
            overshoot,
            "Generated path"
        );

        WaypointSequence {
            profile: self.params.name.clone(),
            start,
            target,
            target_width: request.target_width,
            duration,
            waypoints,
            overshoot,
            pacing: self.params.pacing(),
        }
    }

    /// Upper bound on the final waypoint's timestamp for a movement of
    /// `distance` (seconds).
    pub fn max_sequence_secs(&self, distance: f64, target_width: f64) -> f64 {
        let movement = max_movement_duration(self.params, distance, target_width);
        let settle = *SETTLE_POINTS.end() as f64 * SETTLE_GAP_MAX;
        let overshoot = if self.params.overshoot_chance > 0.0 {
            overshoot::max_overshoot_secs(self.params)
        } else {
            0.0
        };
        movement + settle + overshoot
    }

    /// Upper bound on the number of waypoints for a movement of `distance`.
    pub fn max_waypoints(&self, distance: f64) -> usize {
        let overshoot = if self.params.overshoot_chance > 0.0 {
            1 + self.params.correction_attempts.max.max(1) as usize
        } else {
            0
        };
        self.step_count(distance) + 1 + *SETTLE_POINTS.end() + overshoot
    }
}

fn append_settle<R: Rng + ?Sized>(waypoints: &mut Vec<Waypoint>, target: Point, duration: f64, rng: &mut R) {
    let count = rng.gen_range(SETTLE_POINTS);
    let mut t = duration;
    for _ in 0..count {
        t += rng.gen_range(SETTLE_GAP_MIN..=SETTLE_GAP_MAX);
        let point = target.offset(
            rng.gen_range(-SETTLE_SCATTER_PX..=SETTLE_SCATTER_PX),
            rng.gen_range(-SETTLE_SCATTER_PX..=SETTLE_SCATTER_PX),
        );
        waypoints.push(Waypoint::new(point, t, WaypointKind::Settle));
    }
}
