//! Integration test: query service while the cycle runs on another thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use thermo_common::thermal::{JointLimit, JointTopology};
use thermo_limiter::alert::BeepAlert;
use thermo_limiter::config::load_config_with;
use thermo_limiter::cycle::CycleRunner;
use thermo_limiter::io::{LogSink, SimulatedMotors};
use thermo_limiter::service::{ThermoLimiterService, ThermoLimiterServiceImpl};
use thermo_limiter::topology::StaticTopology;

fn topology(n: usize) -> StaticTopology {
    StaticTopology(JointTopology {
        joints: (0..n)
            .map(|i| JointLimit {
                name: format!("J{i}"),
                climit: 40.0 + i as f64,
            })
            .collect(),
    })
}

#[test]
fn concurrent_queries_see_consistent_records() {
    let loaded = load_config_with("dt = 0.0005\ndebug_level = 0\n", &topology(6)).unwrap();
    let source = SimulatedMotors::new(6, 25.0, 0.0005).with_load(5.0);
    let mut runner = CycleRunner::new(&loaded, source, LogSink::new(0), BeepAlert::default()).unwrap();
    runner.activate().unwrap();

    let service: Arc<dyn ThermoLimiterService> = Arc::new(runner.service());
    let running = Arc::new(AtomicBool::new(true));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let svc = Arc::clone(&service);
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let mut reads = 0u64;
                while running.load(Ordering::Relaxed) {
                    for id in 0..6 {
                        let tau = svc.get_max_torque(id);
                        assert!(tau >= 0.0 && tau.is_finite());
                        let _ = svc.is_max_temperature_error(id);
                    }
                    assert_eq!(svc.get_max_torque(6), 0.0);
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    let flag = AtomicBool::new(true);
    runner.run(&flag, Some(200)).unwrap();
    running.store(false, Ordering::Relaxed);

    for r in readers {
        assert!(r.join().unwrap() > 0);
    }
    assert_eq!(runner.stats().cycle_count, 200);
}

#[test]
fn service_outlives_runner_safely() {
    let loaded = load_config_with("dt = 0.001\n", &topology(2)).unwrap();
    let source = SimulatedMotors::new(2, 25.0, 0.001);
    let runner = CycleRunner::new(&loaded, source, LogSink::new(0), BeepAlert::default()).unwrap();
    let service: ThermoLimiterServiceImpl = runner.service();
    assert_eq!(service.get_max_torque(1), 41.0);

    drop(runner);
    assert_eq!(service.get_max_torque(1), 0.0);
    assert!(!service.is_max_temperature_error(1));
}

#[test]
fn out_of_range_queries_do_not_mutate() {
    let loaded = load_config_with("dt = 0.001\n", &topology(2)).unwrap();
    let source = SimulatedMotors::new(2, 25.0, 0.001);
    let runner = CycleRunner::new(&loaded, source, LogSink::new(0), BeepAlert::default()).unwrap();
    let before = runner.store().snapshot();
    let service = runner.service();

    assert_eq!(service.get_max_torque(-1), 0.0);
    assert_eq!(service.get_max_torque(2), 0.0);
    assert!(!service.is_max_temperature_error(99));
    assert_eq!(runner.store().snapshot(), before);
}
