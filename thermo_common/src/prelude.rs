//! Prelude module for common re-exports.
//!
//! ```rust
//! use thermo_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── Defaults ───────────────────────────────────────────────────────
pub use crate::consts::{
    DEFAULT_AMBIENT_TEMPERATURE, DEFAULT_DT, DEFAULT_MAX_TEMPERATURE,
    DEFAULT_THERMO_LIMITER_TERM,
};

// ─── Thermal Types ──────────────────────────────────────────────────
pub use crate::thermal::{
    CycleSample, JointId, JointLimit, JointThermalParam, JointTopology, MotorHeatParam,
    TauMaxOutput, ThermalFault, TwoDofControllerParam,
};
