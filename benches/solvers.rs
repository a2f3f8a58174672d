//! Benchmarks for the per-frame and on-change solver work.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use expanse::{
    ExpansionSolver, FieldConfig, FieldSolver, SolarSolver, StationConfig, StationSimulator, Vector2,
};

const R: f64 = 20_000.0;

fn bench_streamlines(c: &mut Criterion) {
    let mut group = c.benchmark_group("streamlines");
    let solver = FieldSolver::new(1.0e6, R);

    for count in [8u32, 24, 64] {
        let config = FieldConfig::new(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &config, |b, config| {
            b.iter(|| black_box(solver.generate_streamlines(config)))
        });
    }

    group.finish();
}

fn bench_field_texture(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_texture");
    let solver = FieldSolver::new(1.0e6, R);

    for resolution in [64u32, 128, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(resolution), &resolution, |b, &res| {
            b.iter(|| black_box(solver.generate_field_texture(res)))
        });
    }

    group.finish();
}

fn bench_solar_scans(c: &mut Criterion) {
    let mut group = c.benchmark_group("solar_scans");
    let solver = SolarSolver::default();
    let observer = Vector2::new(9_000.0, 3_500.0);

    group.bench_function("solar_noon", |b| {
        b.iter(|| black_box(solver.solar_noon(black_box(observer), 172.0)))
    });

    group.bench_function("day_length_hours", |b| {
        b.iter(|| black_box(solver.day_length_hours(black_box(observer), 172.0)))
    });

    group.bench_function("daily_sun_path_96", |b| {
        b.iter(|| black_box(solver.daily_sun_path(172.0, 96)))
    });

    group.finish();
}

fn bench_frame_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_update");

    group.bench_function("stations_200", |b| {
        let mut sim = StationSimulator::new(StationConfig::new(200), R, 0.01);
        b.iter(|| {
            sim.update_positions(black_box(1.0 / 60.0));
        })
    });

    group.bench_function("expanded_radius_and_day_length", |b| {
        let solver = ExpansionSolver::new(0.033);
        b.iter(|| {
            let t = black_box(42.0);
            black_box((solver.expanded_radius(R, t), solver.day_length(t)))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_streamlines,
    bench_field_texture,
    bench_solar_scans,
    bench_frame_update,
);

criterion_main!(benches);
