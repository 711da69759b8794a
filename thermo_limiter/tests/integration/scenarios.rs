//! Integration test: limiter behaviour across cycles.
//!
//! Single joint, max 80 °C, term 120 s, ambient 25 °C, current coefficient
//! 1, thermo coefficient 0, hard limit 100.

use std::sync::mpsc;
use std::sync::atomic::AtomicBool;

use thermo_common::thermal::{CycleSample, JointLimit, JointTopology};
use thermo_limiter::alert::BeepAlert;
use thermo_limiter::config::{LoadedConfig, load_config_with};
use thermo_limiter::cycle::CycleRunner;
use thermo_limiter::io::{ChannelSource, LogSink, SimulatedMotors};
use thermo_limiter::service::ThermoLimiterService;
use thermo_limiter::topology::StaticTopology;

const EPS: f64 = 1e-9;

const CONFIG_TOML: &str = r#"
dt = 0.001
debug_level = 0
motor_temperature_limit = [80.0]
motor_heat_params = [[1.0, 0.0]]
"#;

fn loaded() -> LoadedConfig {
    let provider = StaticTopology(JointTopology {
        joints: vec![JointLimit {
            name: "RARM_ELBOW".into(),
            climit: 100.0,
        }],
    });
    load_config_with(CONFIG_TOML, &provider).unwrap()
}

fn sample(temperature: f64, tau: f64) -> CycleSample {
    CycleSample {
        temperature: vec![temperature],
        tau: vec![tau],
        current: vec![0.0],
    }
}

#[test]
fn heating_sequence_walks_through_all_regimes() {
    let (tx, rx) = mpsc::channel();
    let mut runner =
        CycleRunner::new(&loaded(), ChannelSource::new(rx), LogSink::new(0), BeepAlert::default())
            .unwrap();
    runner.activate().unwrap();
    let service = runner.service();

    // Cool, light load.
    tx.send(sample(25.0, 0.5)).unwrap();
    assert_eq!(runner.step(), Some(false));
    assert!((service.get_max_torque(0) - (55.0f64 / 120.0).sqrt()).abs() < EPS);
    assert!(!service.is_max_temperature_error(0));
    assert!(!runner.alert().is_active());

    // Same temperature, heavy load.
    tx.send(sample(25.0, 1.0)).unwrap();
    assert_eq!(runner.step(), Some(true));
    assert!(service.is_max_temperature_error(0));
    assert!(runner.alert().is_active());

    // Over temperature: ceiling falls back to the hard limit.
    tx.send(sample(90.0, 0.0)).unwrap();
    assert_eq!(runner.step(), Some(true));
    assert_eq!(service.get_max_torque(0), 100.0);
    assert!(service.is_max_temperature_error(0));

    // Cooled down again; no new sample next cycle keeps the stale one.
    tx.send(sample(25.0, 0.0)).unwrap();
    assert_eq!(runner.step(), Some(false));
    assert_eq!(runner.step(), Some(false));
    assert!(!runner.alert().is_active());
    assert_eq!(runner.alert().activations(), 1);
    assert_eq!(runner.sink().writes(), 5);
}

#[test]
fn no_sample_yet_publishes_hard_limits() {
    let (_tx, rx) = mpsc::channel::<CycleSample>();
    let mut runner =
        CycleRunner::new(&loaded(), ChannelSource::new(rx), LogSink::new(0), BeepAlert::default())
            .unwrap();
    runner.activate().unwrap();
    assert_eq!(runner.step(), Some(false));
    assert_eq!(runner.sink().last().unwrap().data, vec![100.0]);
}

#[test]
fn invalid_sample_falls_back_and_keeps_model() {
    let (tx, rx) = mpsc::channel();
    let mut runner =
        CycleRunner::new(&loaded(), ChannelSource::new(rx), LogSink::new(0), BeepAlert::default())
            .unwrap();
    runner.activate().unwrap();

    tx.send(sample(f64::NAN, 0.0)).unwrap();
    assert_eq!(runner.step(), Some(true));
    let joint = runner.store().joint(0).unwrap();
    assert_eq!(joint.tau_max, 100.0);
    assert_eq!(joint.model.temperature, 25.0);
}

#[test]
fn loaded_simulation_eventually_alerts() {
    let config = r#"
dt = 0.01
debug_level = 0
thermo_limiter_term = 10.0
motor_temperature_limit = [30.0]
motor_heat_params = [[1.0, 0.0]]
"#;
    let provider = StaticTopology(JointTopology {
        joints: vec![JointLimit {
            name: "J0".into(),
            climit: 100.0,
        }],
    });
    let loaded = load_config_with(config, &provider).unwrap();
    let source = SimulatedMotors::new(1, 25.0, 0.01)
        .with_load(0.6)
        .with_thermal(50.0, 600.0);
    let mut runner = CycleRunner::new(&loaded, source, LogSink::new(0), BeepAlert::default()).unwrap();
    runner.activate().unwrap();

    // Capacity starts near 0.5 > 0.36 and shrinks as the motor heats.
    assert_eq!(runner.step(), Some(false));
    let running = AtomicBool::new(true);
    let mut flagged = false;
    for _ in 0..50 {
        if runner.step() == Some(true) {
            flagged = true;
            break;
        }
    }
    assert!(flagged);
    assert!(runner.alert().is_active());
    runner.deactivate().unwrap();
    assert!(runner.run(&running, Some(1)).is_err());
}
