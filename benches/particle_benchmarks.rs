//! 粒子系统性能基准测试
//!
//! 测试步进、公告板收集和整帧录制的开销

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use demo_suite::config::ParticleConfig;
use demo_suite::core::{Demo, FrameTime};
use demo_suite::demos::ParticlesDemo;
use demo_suite::physics::{ParticleStepper, ParticleStore};
use demo_suite::render::{BillboardBasis, ParticleBatcher, RecordingContext};
use glam::Mat4;
use std::hint::black_box;

fn config(max_particles: usize) -> ParticleConfig {
    ParticleConfig {
        max_particles,
        multithreaded: false,
        seed: Some(7),
        ..Default::default()
    }
}

/// 先跑满一个生命周期，得到稳定的粒子数
fn warmed_up(max_particles: usize) -> (ParticleStore, ParticleStepper) {
    let config = config(max_particles);
    let mut store = ParticleStore::with_capacity(max_particles);
    let mut stepper = ParticleStepper::new(&config);
    let mut t = 0.0;
    while t < config.life_span as f64 {
        stepper.step(&mut store, t, 0.02);
        t += 0.02;
    }
    (store, stepper)
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("particle_step");

    for count in [300usize, 3000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (mut store, mut stepper) = warmed_up(count);
            let mut t = 8.0;
            b.iter(|| {
                t += 1.0 / 60.0;
                black_box(stepper.step(&mut store, t, 1.0 / 60.0))
            });
        });
    }

    group.finish();
}

fn bench_collect(c: &mut Criterion) {
    let mut group = c.benchmark_group("billboard_collect");
    let basis = BillboardBasis::from_view(&Mat4::from_rotation_x(-1.3), 0.7);

    for count in [300usize, 3000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (store, _) = warmed_up(count);
            let mut batcher = ParticleBatcher::new(70);
            b.iter(|| black_box(batcher.collect(&store, &basis)));
        });
    }

    group.finish();
}

fn bench_recorded_frame(c: &mut Criterion) {
    c.bench_function("fountain_frame_recorded", |b| {
        let mut demo = ParticlesDemo::new(&config(3000)).unwrap();
        let mut ctx = RecordingContext::with_history(640, 480, 1);
        demo.init(&mut ctx).unwrap();
        let mut elapsed = 0.0;
        b.iter(|| {
            elapsed += 1.0 / 60.0;
            let time = FrameTime {
                elapsed_seconds: elapsed,
                delta_seconds: 1.0 / 60.0,
            };
            demo.frame(&mut ctx, time).unwrap();
        });
        demo.shutdown();
    });
}

criterion_group!(benches, bench_step, bench_collect, bench_recorded_frame);
criterion_main!(benches);
