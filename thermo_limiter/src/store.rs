//! Thermal parameter store shared between the cycle and query contexts.
//!
//! The periodic cycle takes the write lock once per cycle and updates every
//! joint under it. Query readers take a short read lock and copy the record,
//! so a reader never sees `tau_max` and the error flag from different cycles.

use parking_lot::{RwLock, RwLockWriteGuard};
use thermo_common::thermal::{JointId, JointThermalParam};

/// Per-joint thermal records behind a reader-writer lock.
#[derive(Debug)]
pub struct ThermalStore {
    joints: RwLock<Vec<JointThermalParam>>,
}

impl ThermalStore {
    /// Create a store from fully initialized joint records.
    pub fn new(joints: Vec<JointThermalParam>) -> Self {
        Self {
            joints: RwLock::new(joints),
        }
    }

    /// Number of joints. Fixed for the lifetime of the store.
    pub fn len(&self) -> usize {
        self.joints.read().len()
    }

    /// True if the store holds no joints.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of one joint record, `None` if the id is out of range.
    pub fn joint(&self, id: JointId) -> Option<JointThermalParam> {
        self.joints.read().get(id).copied()
    }

    /// Copy of every joint record, taken under one read lock.
    pub fn snapshot(&self) -> Vec<JointThermalParam> {
        self.joints.read().clone()
    }

    /// Copy all torque ceilings into `out` without allocating.
    ///
    /// Copies `min(out.len(), len())` entries.
    pub fn copy_tau_max(&self, out: &mut [f64]) {
        let joints = self.joints.read();
        for (dst, joint) in out.iter_mut().zip(joints.iter()) {
            *dst = joint.tau_max;
        }
    }

    /// Exclusive access for the limiter cycle.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Vec<JointThermalParam>> {
        self.joints.write()
    }
}
