//! Overshoot and corrective sub-movements.
//!
//! After the nominal path, a movement may land past the target and then
//! converge back in a few corrective steps whose noise decays quadratically.
//! The final correction lands exactly on the target.

use super::{MovementParams, Point, Waypoint, WaypointKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Correction noise amplitude as a fraction of the overshoot distance
const CORRECTION_NOISE_FRACTION: f64 = 0.25;

/// How the overshoot angle is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvershootDirection {
    /// Travel direction plus a uniform deviation in radians
    Directional { max_deviation: f64 },
    /// Any direction
    Uniform,
}

impl OvershootDirection {
    fn angle<R: Rng + ?Sized>(&self, start: Point, target: Point, rng: &mut R) -> f64 {
        match *self {
            OvershootDirection::Directional { max_deviation } => {
                let heading = (target.y - start.y).atan2(target.x - start.x);
                if max_deviation > 0.0 {
                    heading + rng.gen_range(-max_deviation..=max_deviation)
                } else {
                    heading
                }
            }
            OvershootDirection::Uniform => rng.gen_range(0.0..TAU),
        }
    }
}

/// Decide whether this movement overshoots.
pub fn should_overshoot<R: Rng + ?Sized>(params: &MovementParams, rng: &mut R) -> bool {
    params.overshoot_chance > 0.0 && rng.gen::<f64>() < params.overshoot_chance
}

/// Append one overshoot waypoint and its corrections after `waypoints`.
///
/// Timestamps continue from the last existing waypoint. Returns the number of
/// corrections appended.
pub fn append_overshoot<R: Rng + ?Sized>(
    waypoints: &mut Vec<Waypoint>,
    start: Point,
    target: Point,
    params: &MovementParams,
    rng: &mut R,
) -> u32 {
    let angle = params.overshoot_direction.angle(start, target, rng);
    let distance = params.overshoot_distance.sample(rng);
    let overshoot = target.offset(angle.cos() * distance, angle.sin() * distance);

    let mut t = waypoints.last().map(|w| w.t).unwrap_or(0.0);
    t += params.dwell_time.sample(rng);
    waypoints.push(Waypoint::new(overshoot, t, WaypointKind::Overshoot));

    let attempts = params.correction_attempts.sample(rng).max(1);
    for k in 1..=attempts {
        let fraction = f64::from(k) / f64::from(attempts);
        let decay = (1.0 - fraction) * (1.0 - fraction);
        let amplitude = distance * CORRECTION_NOISE_FRACTION * decay;

        let mut position = overshoot.lerp(&target, fraction);
        if k == attempts {
            position = target;
        } else if amplitude > 0.0 {
            position = position.offset(
                rng.gen_range(-amplitude..=amplitude),
                rng.gen_range(-amplitude..=amplitude),
            );
        }

        let growth = 1.0 + params.correction_wait_growth * f64::from(k);
        t += params.dwell_time.sample(rng) * growth;
        waypoints.push(Waypoint::new(position, t, WaypointKind::Correction));
    }
    attempts
}

/// Longest time an overshoot phase can add (seconds).
pub fn max_overshoot_secs(params: &MovementParams) -> f64 {
    let correction_waits: f64 = (1..=params.correction_attempts.max.max(1))
        .map(|k| 1.0 + params.correction_wait_growth * f64::from(k))
        .sum();
    params.dwell_time.max * (1.0 + correction_waits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{MotionProfile, ValueRange};
    use rand::{rngs::StdRng, SeedableRng};

    fn params() -> MovementParams {
        MovementParams::from_motion(&MotionProfile::natural(), 0.1)
    }

    #[test]
    fn test_corrections_converge_on_target() {
        let target = Point::new(400.0, 300.0);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let mut waypoints = vec![Waypoint::new(target, 0.5, WaypointKind::Path)];
            let n = append_overshoot(&mut waypoints, Point::new(100.0, 100.0), target, &params(), &mut rng);
            assert!((2..=4).contains(&n));
            assert_eq!(waypoints.len(), n as usize + 2);
            assert_eq!(waypoints[1].kind, WaypointKind::Overshoot);
            let last = waypoints.last().unwrap();
            assert_eq!(last.kind, WaypointKind::Correction);
            assert_eq!(last.point(), target);
        }
    }

    #[test]
    fn test_overshoot_distance_in_range() {
        let target = Point::new(0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let mut waypoints = Vec::new();
            append_overshoot(&mut waypoints, Point::new(-300.0, 0.0), target, &params(), &mut rng);
            let d = waypoints[0].point().distance_to(&target);
            assert!((8.0 - 1e-9..=25.0 + 1e-9).contains(&d), "overshoot distance {}", d);
        }
    }

    #[test]
    fn test_directional_overshoot_lands_past_target() {
        let target = Point::new(0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let mut waypoints = Vec::new();
            append_overshoot(&mut waypoints, Point::new(-300.0, 0.0), target, &params(), &mut rng);
            // heading is +x with at most 0.3 rad deviation
            assert!(waypoints[0].x > 0.0);
        }
    }

    #[test]
    fn test_timestamps_increase_and_waits_grow() {
        let mut p = params();
        p.dwell_time = ValueRange::new(0.1, 0.1);
        p.correction_wait_growth = 0.5;
        let mut rng = StdRng::seed_from_u64(1);
        let mut waypoints = vec![Waypoint::new(Point::new(10.0, 10.0), 1.0, WaypointKind::Path)];
        append_overshoot(&mut waypoints, Point::new(0.0, 0.0), Point::new(10.0, 10.0), &p, &mut rng);

        let gaps: Vec<f64> = waypoints.windows(2).map(|w| w[1].t - w[0].t).collect();
        assert!(gaps.iter().all(|g| *g > 0.0));
        for pair in gaps[1..].windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_should_overshoot_respects_chance() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut p = params();
        p.overshoot_chance = 0.0;
        assert!((0..200).all(|_| !should_overshoot(&p, &mut rng)));
        p.overshoot_chance = 1.0;
        assert!((0..200).all(|_| should_overshoot(&p, &mut rng)));
    }
}
