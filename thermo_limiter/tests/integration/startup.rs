//! Integration test: startup sequence.
//!
//! Config file + model file on disk → validated `LoadedConfig` → runner in
//! `Ready` with the store seeded from the model's hard limits.

use std::fs;

use tempfile::TempDir;
use thermo_limiter::alert::BeepAlert;
use thermo_limiter::config::{load_config, load_config_with};
use thermo_limiter::cycle::CycleRunner;
use thermo_limiter::error::InitError;
use thermo_limiter::io::{LogSink, SimulatedMotors};
use thermo_limiter::state::lifecycle::LifecycleState;
use thermo_limiter::topology::{StaticTopology, TopologyError};
use thermo_common::thermal::{JointLimit, JointTopology};

const CONFIG_TOML: &str = r#"
dt = 0.002
debug_level = 0
model = "robot.toml"
ambient_temperature = 30.0
motor_temperature_limit = [90.0, 70.0]
motor_heat_params = [[0.5, 0.0], [0.25, 0.0]]
torque_controller_params = [[300.0, 0.05], [500.0, 0.02]]

[shared]
service_name = "thermo_limiter"
log_level = "debug"
"#;

const MODEL_TOML: &str = r#"
[[joints]]
name = "RLEG_HIP_Y"
climit = 120.0

[[joints]]
name = "RLEG_KNEE"
climit = 80.0
"#;

fn write_pair(dir: &TempDir) -> std::path::PathBuf {
    let cfg = dir.path().join("thermo_limiter.toml");
    fs::write(&cfg, CONFIG_TOML).unwrap();
    fs::write(dir.path().join("robot.toml"), MODEL_TOML).unwrap();
    cfg
}

#[test]
fn loads_config_and_relative_model() {
    let dir = TempDir::new().unwrap();
    let loaded = load_config(&write_pair(&dir)).unwrap();

    assert_eq!(loaded.num_joints(), 2);
    assert_eq!(loaded.topology.joints[0].name, "RLEG_HIP_Y");
    assert_eq!(loaded.config.ambient_temperature, 30.0);
    assert_eq!(loaded.config.debug_level, 0);
}

#[test]
fn runner_seeds_store_from_config() {
    let dir = TempDir::new().unwrap();
    let loaded = load_config(&write_pair(&dir)).unwrap();
    let source = SimulatedMotors::new(2, 30.0, 0.002);
    let runner = CycleRunner::new(&loaded, source, LogSink::new(0), BeepAlert::default()).unwrap();

    assert_eq!(runner.state(), LifecycleState::Ready);
    let joints = runner.store().snapshot();
    assert_eq!(joints[0].max_temperature, 90.0);
    assert_eq!(joints[1].max_temperature, 70.0);
    assert_eq!(joints[0].tau_max, 120.0);
    assert_eq!(joints[1].tau_max, 80.0);
    assert_eq!(joints[1].model.current_coeff, 0.25);
    assert!(joints.iter().all(|j| j.model.temperature == 30.0));
    assert!(joints.iter().all(|j| !j.temperature_error_flag));

    let k: Vec<f64> = runner.controllers().iter().map(|c| c.param().k).collect();
    assert_eq!(k, vec![300.0, 500.0]);
    assert!(runner.controllers().iter().all(|c| c.param().dt == 0.002));
}

#[test]
fn missing_model_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let cfg = dir.path().join("thermo_limiter.toml");
    fs::write(&cfg, CONFIG_TOML).unwrap();

    let err = load_config(&cfg).unwrap_err();
    assert!(matches!(err, InitError::Topology(TopologyError::Load { .. })));
}

#[test]
fn missing_config_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, InitError::Config(_)));
}

#[test]
fn zero_current_coeff_rejected_at_runner_construction() {
    let toml = r#"
dt = 0.002
motor_heat_params = [[0.0, 0.01]]
"#;
    let provider = StaticTopology(JointTopology {
        joints: vec![JointLimit {
            name: "J0".into(),
            climit: 50.0,
        }],
    });
    let loaded = load_config_with(toml, &provider).unwrap();
    let source = SimulatedMotors::new(1, 25.0, 0.002);
    let result = CycleRunner::new(&loaded, source, LogSink::new(0), BeepAlert::default());
    assert!(matches!(result, Err(InitError::Config(_))));
}
