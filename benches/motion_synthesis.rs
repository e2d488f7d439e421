//! Criterion benchmarks for synthesis hot paths
//!
//! Covers: easing, Fitts' timing, Bézier path generation per behaviour,
//! and paced execution on a virtual clock.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use motion_synth::execution::{ExecutionOptions, Executor, PhaseTracker};
use motion_synth::motion::easing::ease;
use motion_synth::motion::timing::{fitts_duration, MIN_DURATION_SECS};
use motion_synth::motion::{MovementParams, PathGenerator};
use motion_synth::{ManualClock, MotionEngine, MotionProfile, MovementRequest, Point, RecordingInjector};
use rand::{rngs::StdRng, SeedableRng};

fn make_request(distance: f64) -> MovementRequest {
    MovementRequest::new(Point::new(100.0, 100.0), Point::new(100.0 + distance, 100.0), 20.0)
}

// ---------------------------------------------------------------------------
// Timing and easing benchmarks
// ---------------------------------------------------------------------------

fn bench_ease(c: &mut Criterion) {
    c.bench_function("ease_1000_samples", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for i in 0..1000 {
                sum += ease(black_box(i as f64 / 999.0));
            }
            sum
        });
    });
}

fn bench_fitts_duration(c: &mut Criterion) {
    c.bench_function("fitts_duration", |b| {
        b.iter(|| fitts_duration(black_box(0.1), black_box(0.15), black_box(300.0), black_box(20.0)));
    });
}

// ---------------------------------------------------------------------------
// Path generation benchmarks
// ---------------------------------------------------------------------------

fn bench_path_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_generation");
    let params = MovementParams::from_motion(&MotionProfile::natural(), MIN_DURATION_SECS);
    let generator = PathGenerator::new(&params);

    for distance in [50.0, 300.0, 1500.0] {
        group.bench_with_input(BenchmarkId::from_parameter(distance as u64), &distance, |b, &distance| {
            let request = make_request(distance);
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| generator.generate(black_box(&request), &mut rng));
        });
    }

    group.finish();
}

fn bench_engine_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_synthesize");

    for name in ["natural", "careful", "fast", "tech_professional", "casual_user", "senior_user"] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &name, |b, &name| {
            let mut engine = MotionEngine::from_name(name)
                .expect("known behaviour")
                .with_clock(ManualClock::new());
            let request = make_request(300.0);
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| engine.synthesize(black_box(&request), &mut rng));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Execution benchmarks
// ---------------------------------------------------------------------------

fn bench_execute_virtual_clock(c: &mut Criterion) {
    let mut engine = MotionEngine::from_name("casual_user")
        .expect("known persona")
        .with_clock(ManualClock::new());
    let mut rng = StdRng::seed_from_u64(3);
    let path = engine
        .synthesize(&make_request(800.0), &mut rng)
        .expect("valid request");

    c.bench_function("execute_800px_virtual_clock", |b| {
        let mut injector = RecordingInjector::new();
        b.iter(|| {
            // Fresh clock so the recorded sleeps do not grow across iterations
            let clock = ManualClock::new();
            injector.clear();
            Executor::new(&clock, ExecutionOptions::default()).run(
                black_box(&path),
                &mut injector,
                &mut rng,
                None,
                &mut PhaseTracker::new(),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_ease,
    bench_fitts_duration,
    bench_path_generation,
    bench_engine_synthesize,
    bench_execute_virtual_clock,
);

criterion_main!(benches);
