//! Session State Tracking
//!
//! Persona energy, focus and fatigue drift over the wall-clock length of an
//! automation session. The tracker updates them before every movement and
//! derives the speed and precision that movement will use.

pub mod state;
pub mod tracker;

pub use state::SessionState;
pub use tracker::{AdjustedParameters, SessionTracker};
