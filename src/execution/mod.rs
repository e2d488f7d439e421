//! Execution Module
//!
//! Real-time replay of synthesized paths:
//! - Injection primitive contract and test/dry-run implementations
//! - Drift-correcting executor with a per-movement phase state machine
//! - Dedicated pointer worker that serializes requests per device

pub mod executor;
pub mod injector;
pub mod worker;

pub use executor::{CancelToken, ExecutionOptions, ExecutionReport, Executor, MovementPhase, PhaseTracker};
pub use injector::{InjectedEvent, InjectionError, Injector, MouseButton, RecordingInjector, TracingInjector};
pub use worker::{PointerHandle, PointerWorker};
