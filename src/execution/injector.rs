//! Injection primitive contract
//!
//! The OS-level pointer is an external collaborator. The executor only ever
//! issues relative and absolute moves; clicks and scrolls exist so callers can
//! orchestrate them around engine-produced movements on the same device.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Mouse button for click injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Failure reported by an injection primitive
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectionError {
    /// The device is gone or refused input; execution must stop
    #[error("fatal injection error: {0}")]
    Fatal(String),

    /// A single event was dropped; the next move may succeed
    #[error("transient injection error: {0}")]
    Transient(String),
}

impl InjectionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, InjectionError::Fatal(_))
    }
}

/// OS pointer injection primitive.
///
/// Coordinates are integer pixels. Implementations must not sleep; pacing is
/// the executor's job.
pub trait Injector {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError>;

    fn move_absolute(&mut self, x: i32, y: i32) -> Result<(), InjectionError>;

    fn click(&mut self, button: MouseButton, duration: Duration) -> Result<(), InjectionError>;

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError>;
}

impl<I: Injector + ?Sized> Injector for &mut I {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        (**self).move_relative(dx, dy)
    }

    fn move_absolute(&mut self, x: i32, y: i32) -> Result<(), InjectionError> {
        (**self).move_absolute(x, y)
    }

    fn click(&mut self, button: MouseButton, duration: Duration) -> Result<(), InjectionError> {
        (**self).click(button, duration)
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        (**self).scroll(dx, dy)
    }
}

impl<I: Injector + ?Sized> Injector for Box<I> {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        (**self).move_relative(dx, dy)
    }

    fn move_absolute(&mut self, x: i32, y: i32) -> Result<(), InjectionError> {
        (**self).move_absolute(x, y)
    }

    fn click(&mut self, button: MouseButton, duration: Duration) -> Result<(), InjectionError> {
        (**self).click(button, duration)
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        (**self).scroll(dx, dy)
    }
}

/// One call received by a [`RecordingInjector`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InjectedEvent {
    MoveRelative { dx: i32, dy: i32 },
    MoveAbsolute { x: i32, y: i32 },
    Click { button: MouseButton, duration_ms: u64 },
    Scroll { dx: i32, dy: i32 },
}

#[derive(Debug, Default)]
struct Recording {
    events: Vec<InjectedEvent>,
    calls: usize,
    failures: Vec<(usize, InjectionError)>,
}

/// In-memory injector that records every successful call.
///
/// Clones share the same recording, so a test can keep one handle while the
/// other is moved into an engine or worker. Failures can be scripted by call
/// index (0-based, counting every call, failed ones included).
#[derive(Debug, Clone, Default)]
pub struct RecordingInjector {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `call_index`-th call with `error`.
    pub fn with_failure(self, call_index: usize, error: InjectionError) -> Self {
        self.inner.lock().failures.push((call_index, error));
        self
    }

    pub fn events(&self) -> Vec<InjectedEvent> {
        self.inner.lock().events.clone()
    }

    /// Total calls, including failed ones
    pub fn calls(&self) -> usize {
        self.inner.lock().calls
    }

    /// Sum of all successful relative moves.
    pub fn net_displacement(&self) -> (i64, i64) {
        self.inner
            .lock()
            .events
            .iter()
            .fold((0, 0), |(x, y), event| match event {
                InjectedEvent::MoveRelative { dx, dy } => (x + i64::from(*dx), y + i64::from(*dy)),
                _ => (x, y),
            })
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.events.clear();
        inner.calls = 0;
    }

    fn record(&self, event: InjectedEvent) -> Result<(), InjectionError> {
        let mut inner = self.inner.lock();
        let index = inner.calls;
        inner.calls += 1;
        if let Some(pos) = inner.failures.iter().position(|(i, _)| *i == index) {
            let (_, error) = inner.failures.remove(pos);
            return Err(error);
        }
        inner.events.push(event);
        Ok(())
    }
}

impl Injector for RecordingInjector {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.record(InjectedEvent::MoveRelative { dx, dy })
    }

    fn move_absolute(&mut self, x: i32, y: i32) -> Result<(), InjectionError> {
        self.record(InjectedEvent::MoveAbsolute { x, y })
    }

    fn click(&mut self, button: MouseButton, duration: Duration) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Click {
            button,
            duration_ms: duration.as_millis() as u64,
        })
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Scroll { dx, dy })
    }
}

/// Dry-run injector: logs each call and tracks where the cursor would be.
#[derive(Debug, Clone, Default)]
pub struct TracingInjector {
    position: (i64, i64),
    events: u64,
}

impl TracingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known cursor position.
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            position: (i64::from(x), i64::from(y)),
            events: 0,
        }
    }

    pub fn position(&self) -> (i64, i64) {
        self.position
    }

    pub fn events(&self) -> u64 {
        self.events
    }
}

impl Injector for TracingInjector {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.position.0 += i64::from(dx);
        self.position.1 += i64::from(dy);
        self.events += 1;
        trace!(dx, dy, x = self.position.0, y = self.position.1, "move_relative");
        Ok(())
    }

    fn move_absolute(&mut self, x: i32, y: i32) -> Result<(), InjectionError> {
        self.position = (i64::from(x), i64::from(y));
        self.events += 1;
        debug!(x, y, "move_absolute");
        Ok(())
    }

    fn click(&mut self, button: MouseButton, duration: Duration) -> Result<(), InjectionError> {
        self.events += 1;
        debug!(?button, ?duration, x = self.position.0, y = self.position.1, "click");
        Ok(())
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.events += 1;
        debug!(dx, dy, "scroll");
        Ok(())
    }
}
