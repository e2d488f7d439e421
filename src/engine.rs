//! Motion Engine
//!
//! High-level entry point: owns the active behaviour (motion profile or
//! persona), the session tracker and the clock, and exposes `synthesize`,
//! `execute` and the combined `move_to`.
//!
//! One engine drives one pointer. It is not shared between threads; wrap it in
//! a [`crate::execution::PointerWorker`] to serialize concurrent callers.

use crate::app::config::Config;
use crate::execution::executor::{ExecutionOptions, Executor, MovementPhase, PhaseTracker};
use crate::execution::{CancelToken, ExecutionReport, Injector};
use crate::motion::timing::MIN_DURATION_SECS;
use crate::motion::{MovementParams, MovementRequest, PathGenerator, Point, WaypointSequence};
use crate::profile::{Behavior, MotionProfile, PersonaStatus, ProfileOverrides};
use crate::session::{AdjustedParameters, SessionTracker};
use crate::time::clock::{secs_to_duration, Clock, SystemClock};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Default Fitts' target width (pixels)
pub const DEFAULT_TARGET_WIDTH: f64 = 20.0;

/// Counters for one automation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Active profile or persona
    pub behavior: String,
    pub movements_synthesized: u64,
    pub movements_executed: u64,
    pub movements_overshot: u64,
    pub movements_cancelled: u64,
    /// Movements aborted by a fatal injection error
    pub injection_failures: u64,
    /// Individual moves dropped by transient errors
    pub transient_failures: u64,
    pub waypoints_executed: u64,
    pub session_minutes: f64,
}

impl SessionStats {
    fn new(behavior: &str) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            behavior: behavior.to_string(),
            movements_synthesized: 0,
            movements_executed: 0,
            movements_overshot: 0,
            movements_cancelled: 0,
            injection_failures: 0,
            transient_failures: 0,
            waypoints_executed: 0,
            session_minutes: 0.0,
        }
    }
}

/// Human motion synthesis engine for one pointer.
pub struct MotionEngine<C: Clock = SystemClock> {
    behavior: Behavior,
    overrides: ProfileOverrides,
    min_duration: f64,
    default_target_width: f64,
    apply_hand_eye_delay: bool,
    options: ExecutionOptions,
    clock: C,
    tracker: SessionTracker,
    stats: SessionStats,
}

impl MotionEngine<SystemClock> {
    /// Engine on the system clock with the given behaviour.
    pub fn new(behavior: Behavior) -> Self {
        Self::with_parts(behavior, SystemClock::new())
    }

    /// Engine for a profile or persona name (case-insensitive, aliases allowed).
    pub fn from_name(name: &str) -> crate::Result<Self> {
        Ok(Self::new(Behavior::from_name(name)?))
    }

    /// Engine configured from a validated [`Config`].
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        config.validate()?;
        let engine = Self::from_name(&config.engine.behavior)?
            .with_overrides(config.overrides.clone())?
            .with_min_duration(config.engine.min_duration_secs)?
            .with_default_target_width(config.engine.default_target_width)?
            .with_execution_options(ExecutionOptions {
                anchor_absolute: config.execution.anchor_absolute,
                step_jitter_base_secs: config.execution.step_jitter_base_secs,
                apply_dwell: config.execution.apply_dwell,
            })
            .with_hand_eye_delay(config.execution.apply_hand_eye_delay);
        Ok(engine)
    }
}

impl<C: Clock> MotionEngine<C> {
    fn with_parts(behavior: Behavior, clock: C) -> Self {
        info!(behavior = behavior.name(), "Motion engine created");
        let tracker = SessionTracker::start(clock.now());
        let stats = SessionStats::new(behavior.name());
        Self {
            behavior,
            overrides: ProfileOverrides::default(),
            min_duration: MIN_DURATION_SECS,
            default_target_width: DEFAULT_TARGET_WIDTH,
            apply_hand_eye_delay: true,
            options: ExecutionOptions::default(),
            clock,
            tracker,
            stats,
        }
    }

    /// Same engine on another clock; the session restarts at that clock's now.
    pub fn with_clock<D: Clock>(self, clock: D) -> MotionEngine<D> {
        let tracker = SessionTracker::start(clock.now());
        MotionEngine {
            behavior: self.behavior,
            overrides: self.overrides,
            min_duration: self.min_duration,
            default_target_width: self.default_target_width,
            apply_hand_eye_delay: self.apply_hand_eye_delay,
            options: self.options,
            clock,
            tracker,
            stats: self.stats,
        }
    }

    /// Engine-wide overrides applied on top of the active behaviour.
    pub fn with_overrides(mut self, overrides: ProfileOverrides) -> crate::Result<Self> {
        self.behavior.motion().with_overrides(&overrides)?;
        self.overrides = overrides;
        Ok(self)
    }

    pub fn with_min_duration(mut self, secs: f64) -> crate::Result<Self> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(crate::Error::Config(format!(
                "min_duration_secs must be > 0, got {}",
                secs
            )));
        }
        self.min_duration = secs;
        Ok(self)
    }

    pub fn with_default_target_width(mut self, width: f64) -> crate::Result<Self> {
        if !width.is_finite() || width <= 0.0 {
            return Err(crate::Error::Config(format!(
                "default_target_width must be > 0, got {}",
                width
            )));
        }
        self.default_target_width = width;
        Ok(self)
    }

    pub fn with_execution_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable or disable the reaction delay in `move_to`.
    pub fn with_hand_eye_delay(mut self, enabled: bool) -> Self {
        self.apply_hand_eye_delay = enabled;
        self
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Request from `start` to `target`, falling back to the configured
    /// default target width.
    pub fn request(&self, start: Point, target: Point, width: Option<f64>) -> MovementRequest {
        MovementRequest::new(start, target, width.unwrap_or(self.default_target_width))
    }

    /// Switch to another profile or persona by name.
    ///
    /// Personas start with fresh session state and the session clock restarts.
    /// Unknown names leave the current behaviour in place.
    pub fn switch_behavior(&mut self, name: &str) -> crate::Result<()> {
        let behavior = Behavior::from_name(name)?;
        behavior.motion().with_overrides(&self.overrides)?;
        self.set_behavior(behavior);
        Ok(())
    }

    /// Replace the active behaviour and restart the session clock.
    pub fn set_behavior(&mut self, behavior: Behavior) {
        info!(from = self.behavior.name(), to = behavior.name(), "Switched behavior");
        self.stats.behavior = behavior.name().to_string();
        self.behavior = behavior;
        self.tracker = SessionTracker::start(self.clock.now());
    }

    /// Generate a waypoint sequence without moving anything.
    ///
    /// For personas this advances the session state (fatigue, energy, focus).
    pub fn synthesize<R: Rng + ?Sized>(
        &mut self,
        request: &MovementRequest,
        rng: &mut R,
    ) -> crate::Result<WaypointSequence> {
        let params = self.prepare(request, rng)?;
        Ok(self.generate(&params, request, rng))
    }

    /// Replay `path` through `injector` in real time.
    pub fn execute<I, R>(
        &mut self,
        path: &WaypointSequence,
        injector: &mut I,
        rng: &mut R,
        cancel: Option<&CancelToken>,
    ) -> crate::Result<ExecutionReport>
    where
        I: Injector + ?Sized,
        R: Rng + ?Sized,
    {
        let mut phases = PhaseTracker::new();
        self.run(path, injector, rng, cancel, &mut phases)
    }

    /// Hand-eye delay, synthesis and execution in one blocking call.
    pub fn move_to<I, R>(
        &mut self,
        request: &MovementRequest,
        injector: &mut I,
        rng: &mut R,
        cancel: Option<&CancelToken>,
    ) -> crate::Result<ExecutionReport>
    where
        I: Injector + ?Sized,
        R: Rng + ?Sized,
    {
        let params = self.prepare(request, rng)?;
        let mut phases = PhaseTracker::new();

        phases.transition(MovementPhase::HandEyeDelay);
        if self.apply_hand_eye_delay {
            self.clock.sleep(secs_to_duration(params.hand_eye_delay.sample(rng)));
        }
        if params.hesitation_chance > 0.0 && rng.gen::<f64>() < params.hesitation_chance {
            let pause = secs_to_duration(params.hesitation_pause.sample(rng));
            debug!(?pause, "Hesitating before movement");
            self.clock.sleep(pause);
        }

        phases.transition(MovementPhase::Generating);
        let path = self.generate(&params, request, rng);
        self.run(&path, injector, rng, cancel, &mut phases)
    }

    /// Upper bound on how long `move_to` can block for `request`, for
    /// callers' own timeout policies. Does not touch session state.
    pub fn worst_case_duration(&self, request: &MovementRequest) -> crate::Result<Duration> {
        request.validate()?;
        let motion = self.effective_motion(request)?;
        let params = match &self.behavior {
            Behavior::Motion(_) => MovementParams::from_motion(&motion, self.min_duration),
            Behavior::Persona(persona) => {
                let slowest = AdjustedParameters {
                    speed: persona.traits.base_speed * 0.5,
                    speed_factor: 0.5,
                    precision: 1.0,
                };
                MovementParams::from_persona(&motion, persona, &slowest, self.min_duration)
            }
        };

        let generator = PathGenerator::new(&params);
        let distance = request.distance();
        let mut secs = generator.max_sequence_secs(distance, request.target_width);
        secs += generator.max_waypoints(distance) as f64
            * self.options.step_jitter_base_secs.max(0.0)
            * params.step_jitter_scale;
        if self.apply_hand_eye_delay {
            secs += params.hand_eye_delay.max;
        }
        if params.hesitation_chance > 0.0 {
            secs += params.hesitation_pause.max;
        }
        if self.options.apply_dwell {
            secs += params.dwell_time.max;
        }
        Ok(secs_to_duration(secs))
    }

    /// Active persona's identity and session state.
    pub fn persona_status(&self) -> Option<PersonaStatus> {
        self.behavior.persona().map(|p| p.status())
    }

    pub fn stats(&self) -> SessionStats {
        let mut stats = self.stats.clone();
        stats.session_minutes = self.tracker.elapsed_minutes(self.clock.now());
        stats
    }

    fn effective_motion(&self, request: &MovementRequest) -> crate::Result<MotionProfile> {
        let overrides = match &request.overrides {
            Some(per_request) => self.overrides.merged_with(per_request),
            None => self.overrides.clone(),
        };
        if overrides.is_empty() {
            Ok(self.behavior.motion().clone())
        } else {
            self.behavior.motion().with_overrides(&overrides)
        }
    }

    /// Validate the request and resolve this movement's parameters, advancing
    /// persona session state.
    fn prepare<R: Rng + ?Sized>(
        &mut self,
        request: &MovementRequest,
        rng: &mut R,
    ) -> crate::Result<MovementParams> {
        request.validate()?;
        let motion = self.effective_motion(request)?;
        let params = match &mut self.behavior {
            Behavior::Motion(_) => MovementParams::from_motion(&motion, self.min_duration),
            Behavior::Persona(persona) => {
                let adjusted = self.tracker.begin_movement(persona, self.clock.now(), rng);
                MovementParams::from_persona(&motion, persona, &adjusted, self.min_duration)
            }
        };
        Ok(params)
    }

    fn generate<R: Rng + ?Sized>(
        &mut self,
        params: &MovementParams,
        request: &MovementRequest,
        rng: &mut R,
    ) -> WaypointSequence {
        let path = PathGenerator::new(params).generate(request, rng);
        self.stats.movements_synthesized += 1;
        debug!(
            profile = %path.profile,
            distance = request.distance(),
            duration = path.duration,
            waypoints = path.len(),
            overshoot = path.overshoot,
            "Synthesized movement"
        );
        path
    }

    fn run<I, R>(
        &mut self,
        path: &WaypointSequence,
        injector: &mut I,
        rng: &mut R,
        cancel: Option<&CancelToken>,
        phases: &mut PhaseTracker,
    ) -> crate::Result<ExecutionReport>
    where
        I: Injector + ?Sized,
        R: Rng + ?Sized,
    {
        let result = Executor::new(&self.clock, self.options).run(path, injector, rng, cancel, phases);
        match &result {
            Ok(report) => {
                self.stats.movements_executed += 1;
                self.stats.waypoints_executed += report.waypoints_executed as u64;
                self.stats.transient_failures += report.transient_failures as u64;
                if report.overshoot {
                    self.stats.movements_overshot += 1;
                }
                debug!(
                    waypoints = report.waypoints_executed,
                    moves = report.moves_issued,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Executed movement"
                );
            }
            Err(crate::Error::Injection { executed, message }) => {
                self.stats.injection_failures += 1;
                self.stats.waypoints_executed += *executed as u64;
                error!(executed, %message, "Movement aborted by injection failure");
            }
            Err(crate::Error::Cancelled { executed }) => {
                self.stats.movements_cancelled += 1;
                self.stats.waypoints_executed += *executed as u64;
            }
            Err(_) => {}
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{InjectionError, RecordingInjector};
    use crate::motion::Point;
    use crate::time::clock::ManualClock;
    use rand::{rngs::StdRng, SeedableRng};

    fn request() -> MovementRequest {
        MovementRequest::new(Point::new(100.0, 100.0), Point::new(400.0, 100.0), 20.0)
    }

    fn engine(name: &str) -> MotionEngine<ManualClock> {
        MotionEngine::from_name(name).unwrap().with_clock(ManualClock::new())
    }

    #[test]
    fn test_unknown_name_is_config_error() {
        assert!(matches!(
            MotionEngine::from_name("robot"),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_request_width_defaults_from_config() {
        let mut config = Config::default();
        config.engine.default_target_width = 48.0;
        let engine = MotionEngine::from_config(&config).unwrap();
        let (from, to) = (Point::new(0.0, 0.0), Point::new(300.0, 0.0));

        assert_eq!(engine.request(from, to, None).target_width, 48.0);
        assert_eq!(engine.request(from, to, Some(12.0)).target_width, 12.0);
        assert_eq!(
            MotionEngine::from_name("natural").unwrap().request(from, to, None).target_width,
            DEFAULT_TARGET_WIDTH
        );
    }

    #[test]
    fn test_synthesize_counts_and_validates() {
        let mut engine = engine("natural");
        let mut rng = StdRng::seed_from_u64(1);
        let path = engine.synthesize(&request(), &mut rng).unwrap();
        assert!(path.len() >= 16);
        assert_eq!(engine.stats().movements_synthesized, 1);

        let bad = MovementRequest::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0), 0.0);
        assert!(matches!(engine.synthesize(&bad, &mut rng), Err(crate::Error::Config(_))));
        assert_eq!(engine.stats().movements_synthesized, 1);
    }

    #[test]
    fn test_move_to_lands_on_target() {
        let mut engine = engine("careful");
        let mut rng = StdRng::seed_from_u64(5);
        let injector = RecordingInjector::new();
        let report = engine
            .move_to(&request(), &mut injector.clone(), &mut rng, None)
            .unwrap();

        assert_eq!(report.final_position, (400, 100));
        assert_eq!(injector.net_displacement(), (300, 0));
        assert_eq!(report.phases[0], MovementPhase::Idle);
        assert_eq!(report.phases[1], MovementPhase::HandEyeDelay);
        assert_eq!(report.phases[2], MovementPhase::Generating);
        assert_eq!(*report.phases.last().unwrap(), MovementPhase::Done);
        assert_eq!(engine.stats().movements_executed, 1);
    }

    #[test]
    fn test_move_to_within_worst_case() {
        let mut rng = StdRng::seed_from_u64(21);
        for name in ["natural", "fast", "senior_user", "tech_professional"] {
            let clock = ManualClock::new();
            let mut engine = MotionEngine::from_name(name).unwrap().with_clock(clock.clone());
            let bound = engine.worst_case_duration(&request()).unwrap();
            for _ in 0..10 {
                let before = clock.now();
                engine
                    .move_to(&request(), &mut RecordingInjector::new(), &mut rng, None)
                    .unwrap();
                let took = clock.now().duration_since(before);
                assert!(took <= bound + Duration::from_millis(1), "{}: {:?} > {:?}", name, took, bound);
            }
        }
    }

    #[test]
    fn test_fatal_failure_counted() {
        let mut engine = engine("natural");
        let mut rng = StdRng::seed_from_u64(2);
        let mut injector = RecordingInjector::new().with_failure(3, InjectionError::Fatal("gone".into()));
        let err = engine.move_to(&request(), &mut injector, &mut rng, None).unwrap_err();
        assert!(err.waypoints_executed().is_some());
        let stats = engine.stats();
        assert_eq!(stats.injection_failures, 1);
        assert_eq!(stats.movements_executed, 0);
    }

    #[test]
    fn test_persona_session_advances() {
        let clock = ManualClock::new();
        let mut engine = MotionEngine::from_name("casual_user").unwrap().with_clock(clock.clone());
        let mut rng = StdRng::seed_from_u64(3);

        clock.advance(Duration::from_secs(600));
        engine.synthesize(&request(), &mut rng).unwrap();
        let status = engine.persona_status().unwrap();
        assert!((status.fatigue_accumulation - 0.15).abs() < 1e-9);
        assert!((engine.stats().session_minutes - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_switch_behavior_resets_persona() {
        let clock = ManualClock::new();
        let mut engine = MotionEngine::from_name("senior").unwrap().with_clock(clock.clone());
        let mut rng = StdRng::seed_from_u64(3);
        clock.advance(Duration::from_secs(1200));
        engine.synthesize(&request(), &mut rng).unwrap();
        assert!(engine.persona_status().unwrap().fatigue_accumulation > 0.0);

        engine.switch_behavior("SENIOR_USER").unwrap();
        let status = engine.persona_status().unwrap();
        assert_eq!(status.fatigue_accumulation, 0.0);
        assert_eq!(engine.stats().behavior, "senior_user");

        assert!(engine.switch_behavior("nobody").is_err());
        assert_eq!(engine.behavior().name(), "senior_user");

        engine.switch_behavior("fast").unwrap();
        assert!(engine.persona_status().is_none());
    }

    #[test]
    fn test_invalid_overrides_rejected_eagerly() {
        let overrides = ProfileOverrides {
            dwell_time_min: Some(0.5),
            dwell_time_max: Some(0.1),
            ..ProfileOverrides::default()
        };
        assert!(matches!(
            MotionEngine::from_name("natural").unwrap().with_overrides(overrides),
            Err(crate::Error::Config(_))
        ));

        let mut engine = engine("natural");
        let bad = request().with_overrides(ProfileOverrides {
            overshoot_chance: Some(2.0),
            ..ProfileOverrides::default()
        });
        assert!(engine.synthesize(&bad, &mut StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn test_request_overrides_apply() {
        let mut engine = engine("natural");
        let quiet = request().with_overrides(ProfileOverrides {
            jitter_amount: Some(0.0),
            tremor_intensity: Some(0.0),
            path_curvature: Some(0.0),
            overshoot_chance: Some(0.0),
            ..ProfileOverrides::default()
        });
        let path = engine.synthesize(&quiet, &mut StdRng::seed_from_u64(9)).unwrap();
        assert!(!path.overshoot);
        for w in path.nominal() {
            assert!((w.y - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_hand_eye_delay_can_be_disabled() {
        let clock = ManualClock::new();
        let mut engine = MotionEngine::from_name("natural")
            .unwrap()
            .with_clock(clock.clone())
            .with_hand_eye_delay(false)
            .with_execution_options(ExecutionOptions {
                apply_dwell: false,
                ..ExecutionOptions::default()
            });
        let mut rng = StdRng::seed_from_u64(4);
        let report = engine
            .move_to(&request(), &mut RecordingInjector::new(), &mut rng, None)
            .unwrap();
        assert_eq!(report.dwell, Duration::ZERO);
        // nothing slept before the first waypoint deadline
        let total = clock.total_slept();
        assert!(total <= report.elapsed + Duration::from_millis(1));
    }
}
