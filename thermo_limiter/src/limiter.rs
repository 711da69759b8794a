//! Thermal limiting engine.
//!
//! Each cycle estimates, per joint, the squared torque the motor can sustain
//! over the thermal horizon `term` without exceeding its maximum temperature:
//!
//! ```text
//! tau_max² = ((T_max − T) / term + c_thermo · (T − T_prev)) / c_current
//! ```
//!
//! A negative estimate means no torque is thermally safe; the ceiling then
//! falls back to the joint's hard limit and the joint is flagged. Otherwise
//! the ceiling is `sqrt(tau_max²)` and the joint is flagged when the commanded
//! torque exceeds it.

use std::sync::Arc;

use thermo_common::consts::DEBUG_TRACE_INTERVAL;
use thermo_common::thermal::{CycleSample, JointThermalParam, ThermalFault};
use tracing::{debug, warn};

use crate::store::ThermalStore;

/// Squared torque capacity of one joint for a new temperature reading.
///
/// Uses the stored (previous) model temperature for the differential term.
#[inline]
pub fn square_tau_max(param: &JointThermalParam, temp: f64, term: f64) -> f64 {
    ((param.max_temperature - temp) / term
        + param.model.thermo_coeff * (temp - param.model.temperature))
        / param.model.current_coeff
}

/// Whether diagnostic tracing is due on call number `loop_count`.
///
/// Level 0 never traces, level 1 every [`DEBUG_TRACE_INTERVAL`] calls,
/// higher levels on every call.
#[inline]
pub const fn trace_due(debug_level: u32, loop_count: u64) -> bool {
    (debug_level == 1 && loop_count % DEBUG_TRACE_INTERVAL == 0) || debug_level > 1
}

/// Per-cycle thermal limiter over a shared [`ThermalStore`].
#[derive(Debug)]
pub struct ThermalLimiter {
    store: Arc<ThermalStore>,
    /// Absolute per-joint limits from the robot model.
    hard_limits: Vec<f64>,
    /// Thermal horizon [s].
    term: f64,
    debug_level: u32,
    loop_count: u64,
}

impl ThermalLimiter {
    /// Create a limiter over `store`.
    ///
    /// `hard_limits` must be in joint order and match the store length.
    pub fn new(store: Arc<ThermalStore>, hard_limits: Vec<f64>, term: f64, debug_level: u32) -> Self {
        debug_assert_eq!(store.len(), hard_limits.len());
        Self {
            store,
            hard_limits,
            term,
            debug_level,
            loop_count: 0,
        }
    }

    /// Number of joints handled.
    #[inline]
    pub fn num_joints(&self) -> usize {
        self.hard_limits.len()
    }

    /// Shared store handle.
    #[inline]
    pub fn store(&self) -> &Arc<ThermalStore> {
        &self.store
    }

    /// Thermal horizon [s].
    #[inline]
    pub fn term(&self) -> f64 {
        self.term
    }

    /// Hard limit of every joint.
    #[inline]
    pub fn hard_limits(&self) -> &[f64] {
        &self.hard_limits
    }

    /// Run one limiter cycle.
    ///
    /// Returns `true` if any joint was flagged in this cycle. A temperature
    /// vector whose length differs from the joint count leaves the store
    /// untouched and returns `false`.
    pub fn limit_temperature(&mut self, sample: &CycleSample) -> bool {
        self.loop_count += 1;
        let trace = trace_due(self.debug_level, self.loop_count);
        let n = self.num_joints();

        if sample.temperature.len() != n {
            if trace {
                debug!(
                    "temperature sample has {} entries, expected {}; skipping",
                    sample.temperature.len(),
                    n
                );
            }
            return false;
        }

        if trace {
            debug!(temperature = ?sample.temperature, tau = ?sample.tau, "thermo limiter input");
        }

        let mut is_temp_error = false;
        let mut joints = self.store.write();

        for (i, joint) in joints.iter_mut().enumerate() {
            let temp = sample.temperature[i];
            let tau = sample.tau.get(i).copied().unwrap_or(0.0);
            let prev_fault = joint.fault;

            if !temp.is_finite() {
                if !prev_fault.contains(ThermalFault::INVALID_SAMPLE) {
                    warn!("implausible temperature in joint {i}: {temp}");
                }
                joint.tau_max = self.hard_limits[i];
                joint.raise(ThermalFault::INVALID_SAMPLE);
                is_temp_error = true;
                continue;
            }

            let square = square_tau_max(joint, temp, self.term);

            if square.is_nan() || square < 0.0 {
                if !prev_fault.contains(ThermalFault::INFEASIBLE) {
                    warn!("tauMax ** 2 = {square} < 0 in joint {i}");
                }
                joint.tau_max = self.hard_limits[i];
                joint.raise(ThermalFault::INFEASIBLE);
                is_temp_error = true;
            } else {
                joint.tau_max = square.sqrt();
                if !tau.is_finite() {
                    if !prev_fault.contains(ThermalFault::INVALID_SAMPLE) {
                        warn!("implausible torque in joint {i}: {tau}");
                    }
                    joint.raise(ThermalFault::INVALID_SAMPLE);
                    is_temp_error = true;
                } else if tau * tau > square {
                    if !prev_fault.contains(ThermalFault::OVER_TORQUE) {
                        warn!(
                            "tauMax over in joint {i}: ||{tau}|| > {}",
                            joint.tau_max
                        );
                    }
                    joint.raise(ThermalFault::OVER_TORQUE);
                    is_temp_error = true;
                } else {
                    joint.clear();
                }
            }

            joint.model.temperature = temp;
        }

        if trace {
            let tau_max: Vec<f64> = joints.iter().map(|j| j.tau_max).collect();
            debug!(?tau_max, "thermo limiter output");
        }

        is_temp_error
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
