//! Read-only query service over the thermal store.
//!
//! The adapter holds a non-owning reference to the store and never mutates
//! it. Out-of-range joint ids return a safe default and log a warning.

use std::sync::{Arc, Weak};

use thermo_common::thermal::JointThermalParam;
use tracing::warn;

use crate::store::ThermalStore;

/// Point queries answered from the thermal store.
pub trait ThermoLimiterService: Send + Sync {
    /// Whether joint `joint_id` is currently in thermal error.
    ///
    /// `false` for an unknown joint.
    fn is_max_temperature_error(&self, joint_id: i32) -> bool;

    /// Current torque ceiling of joint `joint_id`.
    ///
    /// `0.0` for an unknown joint.
    fn get_max_torque(&self, joint_id: i32) -> f64;
}

/// [`ThermoLimiterService`] backed by a weak store reference.
#[derive(Debug, Clone)]
pub struct ThermoLimiterServiceImpl {
    store: Weak<ThermalStore>,
}

impl ThermoLimiterServiceImpl {
    /// Adapter over `store`. Does not keep the store alive.
    pub fn new(store: &Arc<ThermalStore>) -> Self {
        Self {
            store: Arc::downgrade(store),
        }
    }

    fn lookup(&self, joint_id: i32) -> Option<JointThermalParam> {
        let Some(store) = self.store.upgrade() else {
            warn!("thermal store no longer available");
            return None;
        };
        let num_joints = store.len();
        let record = usize::try_from(joint_id).ok().and_then(|id| store.joint(id));
        if record.is_none() {
            warn!("Target jointId {joint_id} is over numJoints {num_joints}");
        }
        record
    }
}

impl ThermoLimiterService for ThermoLimiterServiceImpl {
    fn is_max_temperature_error(&self, joint_id: i32) -> bool {
        self.lookup(joint_id)
            .map(|j| j.temperature_error_flag)
            .unwrap_or(false)
    }

    fn get_max_torque(&self, joint_id: i32) -> f64 {
        self.lookup(joint_id).map(|j| j.tau_max).unwrap_or(0.0)
    }
}
