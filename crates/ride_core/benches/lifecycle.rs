//! Benchmarks for ride_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ride_core::passenger::{RideStatus, Shortcut};
use ride_core::session::{DriverApp, PassengerApp};
use ride_core::test_helpers::{test_config, test_passenger_app};

fn bench_passenger_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("passenger_lifecycle");
    for shortcut in [Shortcut::Home, Shortcut::Work] {
        group.bench_with_input(
            BenchmarkId::from_parameter(shortcut.label()),
            &shortcut,
            |b, &shortcut| {
                b.iter(|| {
                    let mut app = test_passenger_app();
                    app.choose_shortcut(shortcut);
                    app.request_ride();
                    while app.status() != RideStatus::Idle {
                        app.advance_by(1000);
                    }
                    black_box(app.history().completed_count())
                });
            },
        );
    }
    group.finish();
}

fn bench_driver_shift(c: &mut Criterion) {
    c.bench_function("driver_shift_20_rides", |b| {
        b.iter(|| {
            let mut app = DriverApp::from_config(test_config());
            let _ = app.toggle_online();
            for _ in 0..20 {
                app.advance_by(8000);
                if let Some(id) = app.pending_request().map(|r| r.id) {
                    let _ = app.accept(id);
                    let _ = app.complete();
                }
            }
            black_box(app.earnings())
        });
    });
}

fn bench_passenger_construction(c: &mut Criterion) {
    c.bench_function("passenger_app_new", |b| {
        b.iter(|| black_box(PassengerApp::from_config(test_config())))
    });
}

criterion_group!(
    benches,
    bench_passenger_lifecycle,
    bench_driver_shift,
    bench_passenger_construction
);
criterion_main!(benches);
