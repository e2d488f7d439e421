//! Clock module for real-time pacing
//!
//! This module provides the time sources the executor paces against:
//! - Monotonic (never goes backward)
//! - Nanosecond resolution, stored as raw offsets from the clock origin
//! - Swappable for a virtual clock so pacing can be tested without sleeping

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
