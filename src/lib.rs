//! # Motion Synth
//!
//! A human motion synthesis engine that turns an on-screen destination into a
//! timed sequence of pointer positions resembling genuine hand movement.
//!
//! ## Overview
//!
//! Movements are timed with a Fitts'-law model, shaped along randomized cubic
//! Bézier curves with a three-stage easing profile, perturbed by jitter and
//! tremor, and optionally finished with an overshoot plus corrective
//! sub-movements. Behaviour is selected either from a static motion profile
//! (`natural`, `careful`, `fast`) or from a persona (`tech_professional`,
//! `casual_user`, `senior_user`) whose energy, focus and fatigue drift over
//! the session.
//!
//! ## Quick Start
//!
//! ```no_run
//! use motion_synth::{MotionEngine, MovementRequest, Point, RecordingInjector};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut engine = MotionEngine::from_name("casual_user").expect("known persona");
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let request = MovementRequest::new(Point::new(100.0, 100.0), Point::new(400.0, 100.0), 20.0);
//! let path = engine.synthesize(&request, &mut rng).expect("valid request");
//!
//! let mut injector = RecordingInjector::new();
//! let report = engine.execute(&path, &mut injector, &mut rng, None).expect("executed");
//! println!("{} waypoints in {:?}", report.waypoints_executed, report.elapsed);
//! ```
//!
//! ## Architecture
//!
//! - [`time`]: Monotonic and virtual clocks used for pacing
//! - [`profile`]: Motion profiles, personas and name lookup
//! - [`session`]: Persona energy/focus/fatigue tracking
//! - [`motion`]: Fitts' timing, easing, noise, Bézier paths and overshoot
//! - [`execution`]: Injection primitive contract, real-time executor, pointer worker
//! - [`engine`]: High-level `synthesize` / `execute` / `move_to`
//! - [`app`]: CLI and configuration management
//!
//! ## Movement Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Session   │───▶│   Timing    │───▶│ Bézier Path │───▶│  Overshoot  │
//! │   Tracker   │    │  (Fitts')   │    │ + Noise     │    │ Correction  │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                                                 │
//!                                                                 ▼
//!                    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!                    │  Injection  │◀───│  Executor   │◀───│  Waypoint   │
//!                    │  Primitive  │    │ (real time) │    │  Sequence   │
//!                    └─────────────┘    └─────────────┘    └─────────────┘
//! ```
//!
//! ## Concurrency
//!
//! Movements block their thread for the full gesture. One physical pointer is
//! a single shared resource, so route concurrent callers through a
//! [`execution::PointerWorker`], which owns the device and serializes requests.

pub mod time;
pub mod profile;
pub mod session;
pub mod motion;
pub mod execution;
pub mod engine;
pub mod app;

// Re-export commonly used types
pub use engine::{MotionEngine, SessionStats};
pub use execution::{
    CancelToken, ExecutionReport, Injector, InjectionError, MouseButton, PointerHandle,
    PointerWorker, RecordingInjector, TracingInjector,
};
pub use motion::{MovementRequest, Point, Waypoint, WaypointKind, WaypointSequence};
pub use profile::{Behavior, MotionProfile, PersonaProfile, ProfileOverrides, ProfileSelection};
pub use time::clock::{Clock, ManualClock, SystemClock};

/// Result type alias for the motion engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the motion engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Injection failed after {executed} waypoints: {message}")]
    Injection { executed: usize, message: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Movement cancelled after {executed} waypoints")]
    Cancelled { executed: usize },

    #[error("Pointer worker unavailable: {0}")]
    WorkerUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Number of waypoints executed before the failure, when the error
    /// interrupted a movement in progress.
    pub fn waypoints_executed(&self) -> Option<usize> {
        match self {
            Error::Injection { executed, .. } | Error::Cancelled { executed } => Some(*executed),
            _ => None,
        }
    }
}
