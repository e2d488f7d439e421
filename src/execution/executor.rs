//! Real-time executor
//!
//! Replays a waypoint sequence through an injection primitive, pacing each
//! move against the schedule. Sleeps target absolute deadlines measured from
//! the movement start, so late wake-ups shorten the next wait instead of
//! accumulating.
//!
//! Per movement:
//!
//! ```text
//! Idle → HandEyeDelay → Generating → Executing → Settling → [Overshooting] → Done
//! ```

use super::injector::Injector;
use crate::motion::{WaypointKind, WaypointSequence};
use crate::time::clock::{secs_to_duration, Clock};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default base for the persona per-step extra delay (seconds)
pub const DEFAULT_STEP_JITTER_BASE_SECS: f64 = 0.003;

/// Stage of a single movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPhase {
    Idle,
    HandEyeDelay,
    Generating,
    Executing,
    Settling,
    Overshooting,
    Done,
}

impl MovementPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementPhase::Idle => "idle",
            MovementPhase::HandEyeDelay => "hand_eye_delay",
            MovementPhase::Generating => "generating",
            MovementPhase::Executing => "executing",
            MovementPhase::Settling => "settling",
            MovementPhase::Overshooting => "overshooting",
            MovementPhase::Done => "done",
        }
    }

    /// Phase in which a waypoint of `kind` is executed.
    pub fn for_waypoint(kind: WaypointKind) -> Self {
        match kind {
            WaypointKind::Path => MovementPhase::Executing,
            WaypointKind::Settle => MovementPhase::Settling,
            WaypointKind::Overshoot | WaypointKind::Correction => MovementPhase::Overshooting,
        }
    }
}

/// Records the phases a movement passed through.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: MovementPhase,
    history: Vec<MovementPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: MovementPhase::Idle,
            history: vec![MovementPhase::Idle],
        }
    }

    pub fn current(&self) -> MovementPhase {
        self.current
    }

    pub fn history(&self) -> &[MovementPhase] {
        &self.history
    }

    /// Move to `phase`; repeated transitions to the current phase are ignored.
    pub fn transition(&mut self, phase: MovementPhase) {
        if phase == self.current {
            return;
        }
        debug!(from = self.current.as_str(), to = phase.as_str(), "Movement phase");
        self.current = phase;
        self.history.push(phase);
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative cancellation, checked between waypoints.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Executor settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Issue one absolute move to the first waypoint before relative moves
    pub anchor_absolute: bool,
    /// Base of the per-step extra delay, scaled by the path's pacing
    pub step_jitter_base_secs: f64,
    /// Pause for the path's dwell time after the last waypoint
    pub apply_dwell: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            anchor_absolute: false,
            step_jitter_base_secs: DEFAULT_STEP_JITTER_BASE_SECS,
            apply_dwell: true,
        }
    }
}

/// Outcome of one executed movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Waypoints processed, including the starting waypoint
    pub waypoints_executed: usize,
    /// Relative moves actually sent
    pub moves_issued: usize,
    /// Moves dropped by transient injection errors
    pub transient_failures: usize,
    /// Wall time from first move to end of dwell
    pub elapsed: Duration,
    pub dwell: Duration,
    /// Where the executor believes the cursor is
    pub final_position: (i32, i32),
    pub overshoot: bool,
    pub phases: Vec<MovementPhase>,
}

/// Paces a waypoint sequence through an injector against a clock.
pub struct Executor<'a, C: Clock + ?Sized> {
    clock: &'a C,
    options: ExecutionOptions,
}

impl<'a, C: Clock + ?Sized> Executor<'a, C> {
    pub fn new(clock: &'a C, options: ExecutionOptions) -> Self {
        Self { clock, options }
    }

    /// Execute `sequence`, assuming the cursor starts on its first waypoint.
    ///
    /// # Errors
    /// - `InvalidState` for an empty or malformed sequence, before any motion
    /// - `Injection` on a fatal injection error, with the executed count
    /// - `Cancelled` when `cancel` fires between waypoints
    pub fn run<I, R>(
        &self,
        sequence: &WaypointSequence,
        injector: &mut I,
        rng: &mut R,
        cancel: Option<&CancelToken>,
        phases: &mut PhaseTracker,
    ) -> crate::Result<ExecutionReport>
    where
        I: Injector + ?Sized,
        R: Rng + ?Sized,
    {
        sequence.validate()?;
        let waypoints = &sequence.waypoints;
        let origin = waypoints[0];
        let mut cursor = origin.point().rounded();

        if self.options.anchor_absolute {
            if let Err(e) = injector.move_absolute(cursor.0, cursor.1) {
                if e.is_fatal() {
                    return Err(crate::Error::Injection {
                        executed: 0,
                        message: e.to_string(),
                    });
                }
                warn!(error = %e, "Anchor move dropped");
            }
        }

        let jitter_ceiling = self.options.step_jitter_base_secs.max(0.0) * sequence.pacing.step_jitter_scale;
        let start = self.clock.now();
        let mut extra_delay = 0.0;
        let mut moves_issued = 0;
        let mut transient_failures = 0;

        for (index, waypoint) in waypoints.iter().enumerate().skip(1) {
            if cancel.is_some_and(|token| token.is_cancelled()) {
                debug!(executed = index, "Movement cancelled");
                return Err(crate::Error::Cancelled { executed: index });
            }
            phases.transition(MovementPhase::for_waypoint(waypoint.kind));

            let next = waypoint.point().rounded();
            let (dx, dy) = (next.0.saturating_sub(cursor.0), next.1.saturating_sub(cursor.1));
            if dx != 0 || dy != 0 {
                match injector.move_relative(dx, dy) {
                    Ok(()) => {
                        cursor = next;
                        moves_issued += 1;
                        trace!(index, dx, dy, t = waypoint.t, "Waypoint");
                    }
                    Err(e) if e.is_fatal() => {
                        return Err(crate::Error::Injection {
                            executed: index,
                            message: e.to_string(),
                        });
                    }
                    Err(e) => {
                        // Cursor stays put; the next move carries the missed delta
                        transient_failures += 1;
                        warn!(index, error = %e, "Skipping waypoint after transient injection error");
                    }
                }
            }

            if jitter_ceiling > 0.0 {
                extra_delay += rng.gen_range(0.0..=jitter_ceiling);
            }
            let deadline = start.offset_by_secs(waypoint.t - origin.t + extra_delay);
            self.clock.sleep_until(deadline);
        }

        let dwell = if self.options.apply_dwell {
            let dwell = secs_to_duration(sequence.pacing.dwell_time.sample(rng));
            self.clock.sleep(dwell);
            dwell
        } else {
            Duration::ZERO
        };
        phases.transition(MovementPhase::Done);

        Ok(ExecutionReport {
            waypoints_executed: waypoints.len(),
            moves_issued,
            transient_failures,
            elapsed: self.clock.now().duration_since(start),
            dwell,
            final_position: cursor,
            overshoot: sequence.overshoot,
            phases: phases.history().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{InjectionError, RecordingInjector};
    use crate::motion::{Pacing, Point, Waypoint};
    use crate::profile::ValueRange;
    use crate::time::clock::ManualClock;
    use rand::{rngs::StdRng, SeedableRng};

    fn straight_sequence(points: &[(f64, f64, f64)]) -> WaypointSequence {
        let waypoints: Vec<Waypoint> = points
            .iter()
            .map(|&(x, y, t)| Waypoint::new(Point::new(x, y), t, WaypointKind::Path))
            .collect();
        WaypointSequence {
            profile: "test".into(),
            start: waypoints[0].point(),
            target: waypoints[waypoints.len() - 1].point(),
            target_width: 20.0,
            duration: points[points.len() - 1].2,
            waypoints,
            overshoot: false,
            pacing: Pacing {
                dwell_time: ValueRange::new(0.05, 0.05),
                step_jitter_scale: 0.0,
            },
        }
    }

    #[test]
    fn test_paces_against_schedule() {
        let clock = ManualClock::new();
        let executor = Executor::new(&clock, ExecutionOptions::default());
        let seq = straight_sequence(&[(0.0, 0.0, 0.0), (5.0, 0.0, 0.1), (10.0, 0.0, 0.25)]);
        let mut injector = RecordingInjector::new();
        let mut rng = StdRng::seed_from_u64(1);

        let report = executor
            .run(&seq, &mut injector, &mut rng, None, &mut PhaseTracker::new())
            .unwrap();

        assert_eq!(report.waypoints_executed, 3);
        assert_eq!(report.moves_issued, 2);
        assert_eq!(report.final_position, (10, 0));
        assert_eq!(report.dwell, Duration::from_millis(50));
        assert_eq!(report.elapsed, Duration::from_millis(300));
        assert_eq!(injector.net_displacement(), (10, 0));
    }

    #[test]
    fn test_sleeps_only_remainder_after_slow_injection() {
        let clock = ManualClock::new();
        let seq = straight_sequence(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.1), (2.0, 0.0, 0.2)]);
        let options = ExecutionOptions {
            apply_dwell: false,
            ..ExecutionOptions::default()
        };

        // Each injected move costs 30ms of wall time
        struct SlowInjector<'c> {
            clock: &'c ManualClock,
        }
        impl Injector for SlowInjector<'_> {
            fn move_relative(&mut self, _: i32, _: i32) -> Result<(), InjectionError> {
                self.clock.advance(Duration::from_millis(30));
                Ok(())
            }
            fn move_absolute(&mut self, _: i32, _: i32) -> Result<(), InjectionError> {
                Ok(())
            }
            fn click(&mut self, _: crate::execution::MouseButton, _: Duration) -> Result<(), InjectionError> {
                Ok(())
            }
            fn scroll(&mut self, _: i32, _: i32) -> Result<(), InjectionError> {
                Ok(())
            }
        }

        let mut injector = SlowInjector { clock: &clock };
        let report = Executor::new(&clock, options)
            .run(&seq, &mut injector, &mut StdRng::seed_from_u64(1), None, &mut PhaseTracker::new())
            .unwrap();

        assert_eq!(report.elapsed, Duration::from_millis(200));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(70), Duration::from_millis(70)]);
    }

    #[test]
    fn test_fatal_error_reports_partial_progress() {
        let clock = ManualClock::new();
        let seq = straight_sequence(&[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.1),
            (2.0, 0.0, 0.2),
            (3.0, 0.0, 0.3),
        ]);
        let mut injector = RecordingInjector::new().with_failure(1, InjectionError::Fatal("unplugged".into()));

        let err = Executor::new(&clock, ExecutionOptions::default())
            .run(&seq, &mut injector, &mut StdRng::seed_from_u64(1), None, &mut PhaseTracker::new())
            .unwrap_err();

        assert_eq!(err.waypoints_executed(), Some(2));
        assert!(err.to_string().contains("unplugged"));
        assert_eq!(injector.calls(), 2);
    }

    #[test]
    fn test_transient_error_carries_delta() {
        let clock = ManualClock::new();
        let seq = straight_sequence(&[(0.0, 0.0, 0.0), (4.0, 0.0, 0.1), (9.0, 2.0, 0.2)]);
        let mut injector = RecordingInjector::new().with_failure(0, InjectionError::Transient("busy".into()));

        let report = Executor::new(&clock, ExecutionOptions::default())
            .run(&seq, &mut injector, &mut StdRng::seed_from_u64(1), None, &mut PhaseTracker::new())
            .unwrap();

        assert_eq!(report.transient_failures, 1);
        assert_eq!(report.moves_issued, 1);
        assert_eq!(injector.net_displacement(), (9, 2));
        assert_eq!(report.final_position, (9, 2));
    }

    #[test]
    fn test_cancel_between_waypoints() {
        let clock = ManualClock::new();
        let seq = straight_sequence(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.1)]);
        let token = CancelToken::new();
        token.cancel();
        let mut injector = RecordingInjector::new();

        let err = Executor::new(&clock, ExecutionOptions::default())
            .run(&seq, &mut injector, &mut StdRng::seed_from_u64(1), Some(&token), &mut PhaseTracker::new())
            .unwrap_err();

        assert!(matches!(err, crate::Error::Cancelled { executed: 1 }));
        assert_eq!(injector.calls(), 0);
    }

    #[test]
    fn test_empty_sequence_is_invalid_state() {
        let clock = ManualClock::new();
        let mut seq = straight_sequence(&[(0.0, 0.0, 0.0)]);
        seq.waypoints.clear();
        let mut injector = RecordingInjector::new();

        let err = Executor::new(&clock, ExecutionOptions::default())
            .run(&seq, &mut injector, &mut StdRng::seed_from_u64(1), None, &mut PhaseTracker::new())
            .unwrap_err();

        assert!(matches!(err, crate::Error::InvalidState(_)));
        assert_eq!(injector.calls(), 0);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_out_of_range_waypoint_rejected_before_motion() {
        let clock = ManualClock::new();
        let seq = straight_sequence(&[(0.0, 0.0, 0.0), (1e30, 0.0, 0.1)]);
        let mut injector = RecordingInjector::new();

        let err = Executor::new(&clock, ExecutionOptions::default())
            .run(&seq, &mut injector, &mut StdRng::seed_from_u64(1), None, &mut PhaseTracker::new())
            .unwrap_err();

        assert!(matches!(err, crate::Error::InvalidState(_)));
        assert_eq!(injector.calls(), 0);
    }

    #[test]
    fn test_full_pixel_range_deltas_saturate() {
        let clock = ManualClock::new();
        let low = i32::MIN as f64 + 1.0;
        let high = i32::MAX as f64;
        let seq = straight_sequence(&[(low, 0.0, 0.0), (high, 0.0, 0.1)]);
        let mut injector = RecordingInjector::new();

        let report = Executor::new(&clock, ExecutionOptions::default())
            .run(&seq, &mut injector, &mut StdRng::seed_from_u64(1), None, &mut PhaseTracker::new())
            .unwrap();

        assert_eq!(report.moves_issued, 1);
        assert_eq!(injector.net_displacement(), (i64::from(i32::MAX), 0));
    }

    #[test]
    fn test_anchor_and_step_jitter() {
        let clock = ManualClock::new();
        let mut seq = straight_sequence(&[(5.0, 5.0, 0.0), (6.0, 5.0, 0.1), (7.0, 5.0, 0.2)]);
        seq.pacing.step_jitter_scale = 1.0;
        let options = ExecutionOptions {
            anchor_absolute: true,
            step_jitter_base_secs: 0.01,
            apply_dwell: false,
        };
        let mut injector = RecordingInjector::new();

        let report = Executor::new(&clock, options)
            .run(&seq, &mut injector, &mut StdRng::seed_from_u64(3), None, &mut PhaseTracker::new())
            .unwrap();

        assert_eq!(
            injector.events()[0],
            crate::execution::InjectedEvent::MoveAbsolute { x: 5, y: 5 }
        );
        assert!(report.elapsed >= Duration::from_millis(200));
        assert!(report.elapsed <= Duration::from_millis(220));
    }

    #[test]
    fn test_phase_history() {
        let clock = ManualClock::new();
        let mut seq = straight_sequence(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.1), (1.0, 0.0, 0.12)]);
        seq.waypoints[2].kind = WaypointKind::Settle;
        let mut phases = PhaseTracker::new();
        let report = Executor::new(&clock, ExecutionOptions::default())
            .run(&seq, &mut RecordingInjector::new(), &mut StdRng::seed_from_u64(1), None, &mut phases)
            .unwrap();

        assert_eq!(
            report.phases,
            vec![
                MovementPhase::Idle,
                MovementPhase::Executing,
                MovementPhase::Settling,
                MovementPhase::Done
            ]
        );
        assert_eq!(phases.current(), MovementPhase::Done);
    }
}
