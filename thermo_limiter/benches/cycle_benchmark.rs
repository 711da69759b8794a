//! Cycle benchmark: one limiter step for N-joint robots.
//!
//! Covers sample refresh, the thermal law for every joint, alerting and
//! output publication.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use thermo_common::thermal::{JointLimit, JointTopology};
use thermo_limiter::alert::BeepAlert;
use thermo_limiter::config::{LimiterConfig, LoadedConfig};
use thermo_limiter::control::two_dof::TwoDofController;
use thermo_limiter::cycle::CycleRunner;
use thermo_limiter::io::{LogSink, SimulatedMotors};
use thermo_common::thermal::TwoDofControllerParam;

fn loaded(n: usize) -> LoadedConfig {
    LoadedConfig {
        config: LimiterConfig {
            debug_level: 0,
            ..LimiterConfig::default()
        },
        topology: JointTopology {
            joints: (0..n)
                .map(|i| JointLimit {
                    name: format!("J{i}"),
                    climit: 100.0,
                })
                .collect(),
        },
    }
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("limiter_step");
    for &n in &[6usize, 32, 256] {
        let source = SimulatedMotors::new(n, 25.0, 0.002).with_load(3.0);
        let mut runner = CycleRunner::new(&loaded(n), source, LogSink::new(0), BeepAlert::default())
            .expect("runner");
        runner.activate().expect("activate");
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| runner.step());
        });
    }
    group.finish();
}

fn bench_two_dof(c: &mut Criterion) {
    let mut ctrl = TwoDofController::new(TwoDofControllerParam {
        range: 50,
        ..TwoDofControllerParam::with_dt(0.002)
    });
    let mut x = 0.0;
    c.bench_function("two_dof_update_windowed", |b| {
        b.iter(|| {
            x += 0.001;
            ctrl.update(std::hint::black_box(x), 1.0)
        });
    });
}

criterion_group!(benches, bench_step, bench_two_dof);
criterion_main!(benches);
