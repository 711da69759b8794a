//! TOML configuration loader with validation.
//!
//! Loads [`LimiterConfig`], acquires the joint topology, and resolves the
//! per-joint parameter sets. A per-joint list whose length differs from the
//! joint count is replaced by built-in defaults for every joint, with a
//! warning. Invalid numeric parameters are fatal.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thermo_common::config::{ConfigError, ConfigLoader, SharedConfig};
use thermo_common::consts::{
    DEFAULT_AMBIENT_TEMPERATURE, DEFAULT_DEBUG_LEVEL, DEFAULT_DT, DEFAULT_THERMO_LIMITER_TERM,
};
use thermo_common::thermal::{
    JointThermalParam, JointTopology, MotorHeatParam, TwoDofControllerParam,
};
use tracing::{info, warn};

use crate::error::InitError;
use crate::topology::{JointTopologyProvider, TomlModelTopology};

// ─── Limiter Config ─────────────────────────────────────────────────

/// Thermo limiter configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Logging and service identity.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Control period [s].
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Diagnostic verbosity (0 = silent, 1 = every 200 cycles, 2+ = every cycle).
    #[serde(default = "default_debug_level")]
    pub debug_level: u32,

    /// Joint model file; relative paths resolve against the config file directory.
    #[serde(default)]
    pub model: Option<PathBuf>,

    /// Ambient temperature [°C].
    #[serde(default = "default_ambient_temperature")]
    pub ambient_temperature: f64,

    /// Thermal horizon [s].
    #[serde(default = "default_term")]
    pub thermo_limiter_term: f64,

    /// Per-joint maximum temperature [°C].
    #[serde(default)]
    pub motor_temperature_limit: Vec<f64>,

    /// Per-joint `[current_coeff, thermo_coeff]`.
    #[serde(default)]
    pub motor_heat_params: Vec<[f64; 2]>,

    /// Per-joint two-DOF controller `[K, T]`.
    #[serde(default)]
    pub torque_controller_params: Vec<[f64; 2]>,

    /// Two-DOF integrator window [cycles] (0 = unbounded).
    #[serde(default)]
    pub torque_controller_range: usize,
}

fn default_dt() -> f64 {
    DEFAULT_DT
}
fn default_debug_level() -> u32 {
    DEFAULT_DEBUG_LEVEL
}
fn default_ambient_temperature() -> f64 {
    DEFAULT_AMBIENT_TEMPERATURE
}
fn default_term() -> f64 {
    DEFAULT_THERMO_LIMITER_TERM
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            dt: DEFAULT_DT,
            debug_level: DEFAULT_DEBUG_LEVEL,
            model: None,
            ambient_temperature: DEFAULT_AMBIENT_TEMPERATURE,
            thermo_limiter_term: DEFAULT_THERMO_LIMITER_TERM,
            motor_temperature_limit: Vec::new(),
            motor_heat_params: Vec::new(),
            torque_controller_params: Vec::new(),
            torque_controller_range: 0,
        }
    }
}

impl LimiterConfig {
    /// Validate scalar parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "dt {} must be finite and > 0",
                self.dt
            )));
        }
        if !self.thermo_limiter_term.is_finite() || self.thermo_limiter_term <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "thermo_limiter_term {} must be finite and > 0",
                self.thermo_limiter_term
            )));
        }
        if !self.ambient_temperature.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "ambient_temperature {} must be finite",
                self.ambient_temperature
            )));
        }
        Ok(())
    }

    /// Model path, resolved against `base_dir` when relative.
    pub fn model_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.model.as_ref().map(|m| {
            if m.is_relative() {
                base_dir.join(m)
            } else {
                m.clone()
            }
        })
    }
}

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Validated configuration plus the joint topology it applies to.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: LimiterConfig,
    pub topology: JointTopology,
}

impl LoadedConfig {
    /// Number of joints.
    #[inline]
    pub fn num_joints(&self) -> usize {
        self.topology.num_joints()
    }
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load the limiter configuration file and the model it references.
pub fn load_config(config_path: &Path) -> Result<LoadedConfig, InitError> {
    let config = LimiterConfig::load(config_path)?;
    config.validate()?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let model_path = config.model_path(base_dir).ok_or(InitError::MissingModel)?;
    let provider = TomlModelTopology::new(model_path);

    finish_load(config, &provider)
}

/// Load configuration from a TOML string with an explicit topology provider.
pub fn load_config_with(
    config_toml: &str,
    provider: &dyn JointTopologyProvider,
) -> Result<LoadedConfig, InitError> {
    let config = LimiterConfig::from_toml(config_toml)?;
    config.validate()?;
    finish_load(config, provider)
}

fn finish_load(
    config: LimiterConfig,
    provider: &dyn JointTopologyProvider,
) -> Result<LoadedConfig, InitError> {
    let topology = provider.load()?;
    info!(
        "Config OK: dt={}s, joints={}, term={}s, ambient={}°C",
        config.dt,
        topology.num_joints(),
        config.thermo_limiter_term,
        config.ambient_temperature
    );
    Ok(LoadedConfig { config, topology })
}

// ─── Per-Joint Parameter Resolution ─────────────────────────────────

fn warn_size_mismatch(field: &str, actual: usize, expected: usize) {
    warn!("size of {field} is {actual}, not equal to {expected}; using defaults");
}

/// Build one thermal record per joint.
///
/// `hard_limits` is in joint order and seeds every `tau_max`.
///
/// # Errors
/// `ValidationError` if a maximum temperature or heat coefficient is
/// non-finite, or a current coefficient is zero.
pub fn resolve_thermal_params(
    config: &LimiterConfig,
    hard_limits: &[f64],
) -> Result<Vec<JointThermalParam>, ConfigError> {
    let n = hard_limits.len();
    let mut params: Vec<JointThermalParam> =
        hard_limits.iter().map(|&limit| JointThermalParam::new(limit)).collect();

    if config.motor_temperature_limit.len() == n {
        for (p, &max) in params.iter_mut().zip(&config.motor_temperature_limit) {
            p.max_temperature = max;
        }
    } else {
        warn_size_mismatch("motor_temperature_limit", config.motor_temperature_limit.len(), n);
    }

    if config.motor_heat_params.len() == n {
        for (p, &[current_coeff, thermo_coeff]) in params.iter_mut().zip(&config.motor_heat_params) {
            p.model = MotorHeatParam {
                temperature: config.ambient_temperature,
                current_coeff,
                thermo_coeff,
            };
        }
    } else {
        warn_size_mismatch("motor_heat_params", config.motor_heat_params.len(), n);
        for p in params.iter_mut() {
            p.model = MotorHeatParam {
                temperature: config.ambient_temperature,
                ..MotorHeatParam::default()
            };
        }
    }

    for (i, p) in params.iter().enumerate() {
        if !p.max_temperature.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "motor_temperature_limit[{i}] = {} must be finite",
                p.max_temperature
            )));
        }
        if !p.model.current_coeff.is_normal() {
            return Err(ConfigError::ValidationError(format!(
                "motor_heat_params[{i}] current coefficient {} must be a normal nonzero number",
                p.model.current_coeff
            )));
        }
        if !p.model.thermo_coeff.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "motor_heat_params[{i}] thermo coefficient {} must be finite",
                p.model.thermo_coeff
            )));
        }
    }

    Ok(params)
}

/// Build one two-DOF controller parameter set per joint.
pub fn resolve_controller_params(config: &LimiterConfig, n: usize) -> Vec<TwoDofControllerParam> {
    if config.torque_controller_params.len() == n {
        config
            .torque_controller_params
            .iter()
            .map(|&[k, t]| TwoDofControllerParam {
                k,
                t,
                dt: config.dt,
                range: config.torque_controller_range,
            })
            .collect()
    } else {
        warn_size_mismatch("torque_controller_params", config.torque_controller_params.len(), n);
        (0..n)
            .map(|_| TwoDofControllerParam {
                range: config.torque_controller_range,
                ..TwoDofControllerParam::with_dt(config.dt)
            })
            .collect()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
