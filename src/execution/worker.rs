//! Pointer worker
//!
//! A dedicated thread that owns one engine and one injection primitive.
//! Callers on any thread send requests through a [`PointerHandle`]; the worker
//! runs them one at a time, so movements on the same device never interleave.

use super::executor::CancelToken;
use super::injector::Injector;
use super::ExecutionReport;
use crate::engine::{MotionEngine, SessionStats};
use crate::motion::{MovementRequest, WaypointSequence};
use crate::profile::PersonaStatus;
use crate::time::clock::Clock;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

type Reply<T> = Sender<crate::Result<T>>;

enum Command {
    MoveTo {
        request: MovementRequest,
        reply: Reply<ExecutionReport>,
    },
    Synthesize {
        request: MovementRequest,
        reply: Reply<WaypointSequence>,
    },
    SwitchBehavior {
        name: String,
        reply: Reply<()>,
    },
    Stats {
        reply: Sender<SessionStats>,
    },
    PersonaStatus {
        reply: Sender<Option<PersonaStatus>>,
    },
    Shutdown,
}

/// Cloneable, thread-safe front end to a [`PointerWorker`].
#[derive(Clone)]
pub struct PointerHandle {
    sender: Sender<Command>,
    cancel: CancelToken,
}

impl PointerHandle {
    /// Queue a movement and block until it finishes.
    pub fn move_to(&self, request: MovementRequest) -> crate::Result<ExecutionReport> {
        self.call(|reply| Command::MoveTo { request, reply })?
    }

    /// Generate a path on the worker without executing it.
    pub fn synthesize(&self, request: MovementRequest) -> crate::Result<WaypointSequence> {
        self.call(|reply| Command::Synthesize { request, reply })?
    }

    pub fn switch_behavior(&self, name: &str) -> crate::Result<()> {
        let name = name.to_string();
        self.call(|reply| Command::SwitchBehavior { name, reply })?
    }

    pub fn stats(&self) -> crate::Result<SessionStats> {
        self.call(|reply| Command::Stats { reply })
    }

    pub fn persona_status(&self) -> crate::Result<Option<PersonaStatus>> {
        self.call(|reply| Command::PersonaStatus { reply })
    }

    /// Cancel the movement currently executing. Requests still queued are
    /// unaffected.
    pub fn cancel_current(&self) {
        self.cancel.cancel();
    }

    fn call<T>(&self, build: impl FnOnce(Sender<T>) -> Command) -> crate::Result<T> {
        let (reply, response) = bounded(1);
        self.sender
            .send(build(reply))
            .map_err(|_| crate::Error::WorkerUnavailable("pointer worker has stopped".into()))?;
        response
            .recv()
            .map_err(|_| crate::Error::WorkerUnavailable("pointer worker dropped the request".into()))
    }
}

/// Owns the thread that drives one physical pointer.
pub struct PointerWorker {
    handle: PointerHandle,
    thread_handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl PointerWorker {
    /// Move `engine` and `injector` onto a new named thread.
    pub fn spawn<C, I, R>(engine: MotionEngine<C>, injector: I, rng: R) -> crate::Result<Self>
    where
        C: Clock + Send + 'static,
        I: Injector + Send + 'static,
        R: Rng + Send + 'static,
    {
        let (sender, receiver) = unbounded();
        let cancel = CancelToken::new();
        let running = Arc::new(AtomicBool::new(true));

        let worker_cancel = cancel.clone();
        let worker_running = Arc::clone(&running);
        let thread_handle = thread::Builder::new()
            .name("pointer-worker".into())
            .spawn(move || {
                run_worker_loop(engine, injector, rng, receiver, worker_cancel);
                worker_running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| crate::Error::WorkerUnavailable(format!("Failed to spawn pointer worker: {}", e)))?;

        info!("Pointer worker started");
        Ok(Self {
            handle: PointerHandle { sender, cancel },
            thread_handle: Some(thread_handle),
            running,
        })
    }

    pub fn handle(&self) -> PointerHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Finish the queued requests, then stop the thread.
    pub fn shutdown(&mut self) {
        let Some(thread_handle) = self.thread_handle.take() else {
            return;
        };
        let _ = self.handle.sender.send(Command::Shutdown);
        if thread_handle.join().is_err() {
            warn!("Pointer worker panicked");
        }
        self.running.store(false, Ordering::SeqCst);
        info!("Pointer worker stopped");
    }
}

impl Drop for PointerWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker_loop<C, I, R>(
    mut engine: MotionEngine<C>,
    mut injector: I,
    mut rng: R,
    receiver: Receiver<Command>,
    cancel: CancelToken,
) where
    C: Clock,
    I: Injector,
    R: Rng,
{
    // A dropped reply receiver only means the caller stopped waiting
    for command in receiver.iter() {
        match command {
            Command::MoveTo { request, reply } => {
                cancel.reset();
                let result = engine.move_to(&request, &mut injector, &mut rng, Some(&cancel));
                let _ = reply.send(result);
            }
            Command::Synthesize { request, reply } => {
                let _ = reply.send(engine.synthesize(&request, &mut rng));
            }
            Command::SwitchBehavior { name, reply } => {
                let _ = reply.send(engine.switch_behavior(&name));
            }
            Command::Stats { reply } => {
                let _ = reply.send(engine.stats());
            }
            Command::PersonaStatus { reply } => {
                let _ = reply.send(engine.persona_status());
            }
            Command::Shutdown => {
                debug!("Pointer worker received shutdown");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{ExecutionOptions, InjectedEvent, RecordingInjector};
    use crate::motion::Point;
    use crate::profile::ProfileOverrides;
    use crate::time::clock::ManualClock;
    use rand::{rngs::StdRng, SeedableRng};

    fn worker(name: &str, injector: RecordingInjector) -> PointerWorker {
        let engine = MotionEngine::from_name(name).unwrap().with_clock(ManualClock::new());
        PointerWorker::spawn(engine, injector, StdRng::seed_from_u64(11)).unwrap()
    }

    /// Split recorded events at each absolute anchor: (anchor, net relative move after it).
    fn movements_by_anchor(events: &[InjectedEvent]) -> Vec<((i32, i32), (i64, i64))> {
        let mut movements: Vec<((i32, i32), (i64, i64))> = Vec::new();
        for event in events {
            match *event {
                InjectedEvent::MoveAbsolute { x, y } => movements.push(((x, y), (0, 0))),
                InjectedEvent::MoveRelative { dx, dy } => {
                    let (_, net) = movements.last_mut().expect("relative move before any anchor");
                    net.0 += i64::from(dx);
                    net.1 += i64::from(dy);
                }
                _ => {}
            }
        }
        movements
    }

    #[test]
    fn test_requests_from_many_threads_are_serialized() {
        let injector = RecordingInjector::new();
        let engine = MotionEngine::from_name("natural")
            .unwrap()
            .with_clock(ManualClock::new())
            .with_overrides(ProfileOverrides {
                overshoot_chance: Some(1.0),
                ..ProfileOverrides::default()
            })
            .unwrap()
            .with_execution_options(ExecutionOptions {
                anchor_absolute: true,
                ..ExecutionOptions::default()
            });
        let worker = PointerWorker::spawn(engine, injector.clone(), StdRng::seed_from_u64(11)).unwrap();

        let threads: Vec<_> = (0..4)
            .map(|i| {
                let handle = worker.handle();
                thread::spawn(move || {
                    let y = 100.0 + 50.0 * i as f64;
                    let target = Point::new(200.0 + 100.0 * i as f64, y);
                    handle
                        .move_to(MovementRequest::new(Point::new(0.0, y), target, 20.0))
                        .unwrap()
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        // Every run of relative moves belongs to the movement anchored before it
        let movements = movements_by_anchor(&injector.events());
        assert_eq!(movements.len(), 4);
        for ((_, y), net) in movements {
            let i = i64::from((y - 100) / 50);
            assert_eq!(net, (200 + 100 * i, 0), "movement at y={} was interleaved", y);
        }
        assert_eq!(worker.handle().stats().unwrap().movements_executed, 4);
    }

    #[test]
    fn test_switch_and_status() {
        let worker = worker("natural", RecordingInjector::new());
        let handle = worker.handle();
        assert!(handle.persona_status().unwrap().is_none());
        handle.switch_behavior("tech").unwrap();
        let status = handle.persona_status().unwrap().unwrap();
        assert_eq!(status.key, "tech_professional");
        assert!(matches!(handle.switch_behavior("ghost"), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_handle_after_shutdown() {
        let mut worker = worker("natural", RecordingInjector::new());
        let handle = worker.handle();
        let path = handle
            .synthesize(MovementRequest::new(Point::new(0.0, 0.0), Point::new(50.0, 50.0), 10.0))
            .unwrap();
        assert!(!path.is_empty());

        worker.shutdown();
        assert!(!worker.is_running());
        assert!(matches!(handle.stats(), Err(crate::Error::WorkerUnavailable(_))));
    }
}
