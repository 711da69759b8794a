//! Shared thermal-limiting data types.
//!
//! Per-joint parameter records, the per-cycle sample and output buffers,
//! and the joint topology description handed over by the model loader.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::consts::{
    DEFAULT_AMBIENT_TEMPERATURE, DEFAULT_CURRENT_COEFF, DEFAULT_MAX_TEMPERATURE,
    DEFAULT_THERMO_COEFF, DEFAULT_TWO_DOF_K, DEFAULT_TWO_DOF_T,
};

/// Joint index in topology order (0-based).
pub type JointId = usize;

bitflags! {
    /// Reason a joint's temperature error flag is raised.
    ///
    /// Empty iff the flag is clear.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ThermalFault: u8 {
        /// Heat model yields negative squared torque capacity.
        const INFEASIBLE     = 0x01;
        /// Commanded torque exceeds the thermally safe ceiling.
        const OVER_TORQUE    = 0x02;
        /// Non-finite temperature or torque sample.
        const INVALID_SAMPLE = 0x04;
    }
}

impl Default for ThermalFault {
    fn default() -> Self {
        Self::empty()
    }
}

/// First-order motor heat model state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorHeatParam {
    /// Last observed winding temperature [°C].
    pub temperature: f64,
    /// Coefficient on squared torque. Must be nonzero.
    pub current_coeff: f64,
    /// Coefficient on the temperature differential.
    pub thermo_coeff: f64,
}

impl Default for MotorHeatParam {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_AMBIENT_TEMPERATURE,
            current_coeff: DEFAULT_CURRENT_COEFF,
            thermo_coeff: DEFAULT_THERMO_COEFF,
        }
    }
}

/// Per-joint thermal limiter record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointThermalParam {
    /// Maximum allowed motor temperature [°C].
    pub max_temperature: f64,
    /// Current torque ceiling.
    pub tau_max: f64,
    /// Set when the last evaluated cycle found this joint unsafe.
    pub temperature_error_flag: bool,
    /// Cause of the error flag.
    pub fault: ThermalFault,
    /// Heat model coefficients and last observed temperature.
    pub model: MotorHeatParam,
}

impl JointThermalParam {
    /// Default record for a joint with the given hard limit.
    pub fn new(hard_limit: f64) -> Self {
        Self {
            max_temperature: DEFAULT_MAX_TEMPERATURE,
            tau_max: hard_limit,
            temperature_error_flag: false,
            fault: ThermalFault::empty(),
            model: MotorHeatParam::default(),
        }
    }

    /// Record a fault and raise the error flag.
    #[inline]
    pub fn raise(&mut self, fault: ThermalFault) {
        self.fault = fault;
        self.temperature_error_flag = true;
    }

    /// Clear the error flag and its cause.
    #[inline]
    pub fn clear(&mut self) {
        self.fault = ThermalFault::empty();
        self.temperature_error_flag = false;
    }
}

/// Two-DOF torque controller parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoDofControllerParam {
    /// Gain.
    pub k: f64,
    /// Time constant [s].
    pub t: f64,
    /// Control period [s].
    pub dt: f64,
    /// Integrator window [cycles] (0 = unbounded).
    pub range: usize,
}

impl TwoDofControllerParam {
    /// Built-in defaults for the given control period.
    pub const fn with_dt(dt: f64) -> Self {
        Self {
            k: DEFAULT_TWO_DOF_K,
            t: DEFAULT_TWO_DOF_T,
            dt,
            range: 0,
        }
    }
}

/// One joint as described by the robot model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    /// Joint name.
    pub name: String,
    /// Absolute current/torque limit.
    pub climit: f64,
}

/// Joint topology in model order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointTopology {
    /// Joints in control order.
    pub joints: Vec<JointLimit>,
}

impl JointTopology {
    /// Number of joints.
    #[inline]
    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// Hard limits in joint order.
    pub fn hard_limits(&self) -> Vec<f64> {
        self.joints.iter().map(|j| j.climit).collect()
    }
}

/// Input samples for one cycle.
///
/// Vectors are indexed in joint order. Lengths are not enforced here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSample {
    /// Motor temperature [°C].
    pub temperature: Vec<f64>,
    /// Commanded or measured torque.
    pub tau: Vec<f64>,
    /// Measured current. Delivered but not used by the limiter.
    pub current: Vec<f64>,
}

impl CycleSample {
    /// Sample sized for `n` joints, all temperatures at `ambient`, zero load.
    pub fn at_rest(n: usize, ambient: f64) -> Self {
        Self {
            temperature: vec![ambient; n],
            tau: vec![0.0; n],
            current: vec![0.0; n],
        }
    }
}

/// Torque ceilings published every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct TauMaxOutput {
    /// Per-joint ceiling.
    pub data: Vec<f64>,
    /// Publication time.
    pub tm: SystemTime,
}

impl TauMaxOutput {
    /// Zeroed output for `n` joints.
    pub fn with_joints(n: usize) -> Self {
        Self {
            data: vec![0.0; n],
            tm: SystemTime::UNIX_EPOCH,
        }
    }
}
