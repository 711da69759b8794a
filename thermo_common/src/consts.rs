//! System-wide constants for the thermo limiter workspace.
//!
//! Single source of truth for built-in defaults and numeric limits.
//! Imported by all crates.

/// Default maximum motor temperature [°C].
pub const DEFAULT_MAX_TEMPERATURE: f64 = 80.0;

/// Default ambient temperature [°C], used to seed the heat model.
pub const DEFAULT_AMBIENT_TEMPERATURE: f64 = 25.0;

/// Default thermal look-ahead horizon [s].
pub const DEFAULT_THERMO_LIMITER_TERM: f64 = 120.0;

/// Default coefficient on squared torque in the heat model.
pub const DEFAULT_CURRENT_COEFF: f64 = 0.03;

/// Default coefficient on the temperature differential in the heat model.
pub const DEFAULT_THERMO_COEFF: f64 = 0.01;

/// Default two-DOF torque controller gain.
pub const DEFAULT_TWO_DOF_K: f64 = 400.0;

/// Default two-DOF torque controller time constant [s].
pub const DEFAULT_TWO_DOF_T: f64 = 0.04;

/// Default control period [s] (500 Hz).
pub const DEFAULT_DT: f64 = 0.002;

/// Default diagnostic verbosity.
pub const DEFAULT_DEBUG_LEVEL: u32 = 1;

/// Trace interval [cycles] at debug level 1.
pub const DEBUG_TRACE_INTERVAL: u64 = 200;

/// Frequency of the over-temperature alert tone [Hz].
pub const ALERT_BEEP_FREQUENCY_HZ: u32 = 3136;

/// Upper bound on the number of joints accepted from a topology.
pub const MAX_JOINTS: usize = 256;

/// Default service name for logging.
pub const THERMO_LIMITER_SERVICE_NAME: &str = "thermo_limiter";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/thermo_limiter/thermo_limiter.toml";
