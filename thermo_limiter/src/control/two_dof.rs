//! Two-degree-of-freedom torque controller.
//!
//! Converts a torque tracking error into a correction term:
//!
//! ```text
//! e   = xd − x
//! I  += e · dt            (last `range` samples only when range > 0)
//! out = (e + I / T) / K
//! ```
//!
//! Zero or non-positive `K`, `T` or `dt` disables the controller (output 0).

use std::collections::VecDeque;

use thermo_common::thermal::TwoDofControllerParam;

/// Per-joint two-DOF controller state.
#[derive(Debug, Clone)]
pub struct TwoDofController {
    param: TwoDofControllerParam,
    /// Integral accumulator.
    integral: f64,
    /// Integrated increments, kept only when `range > 0`.
    window: VecDeque<f64>,
}

impl TwoDofController {
    /// Create a controller with the given parameters.
    pub fn new(param: TwoDofControllerParam) -> Self {
        Self {
            param,
            integral: 0.0,
            window: VecDeque::with_capacity(param.range),
        }
    }

    /// Replace gain, time constant and period; clears the integrator.
    pub fn setup(&mut self, k: f64, t: f64, dt: f64) {
        self.param.k = k;
        self.param.t = t;
        self.param.dt = dt;
        self.reset();
    }

    /// Current parameters.
    #[inline]
    pub fn param(&self) -> &TwoDofControllerParam {
        &self.param
    }

    /// Integral accumulator.
    #[inline]
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Zero the integrator.
    #[inline]
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.window.clear();
    }

    /// Compute one cycle for measured value `x` and reference `xd`.
    pub fn update(&mut self, x: f64, xd: f64) -> f64 {
        let TwoDofControllerParam { k, t, dt, range } = self.param;
        if k == 0.0 || t <= 0.0 || dt <= 0.0 {
            return 0.0;
        }

        let error = xd - x;
        let increment = error * dt;
        self.integral += increment;

        if range > 0 {
            if self.window.len() == range {
                if let Some(oldest) = self.window.pop_front() {
                    self.integral -= oldest;
                }
            }
            self.window.push_back(increment);
        }

        (error + self.integral / t) / k
    }
}

/// Build one controller per parameter set.
pub fn controller_bank(params: &[TwoDofControllerParam]) -> Vec<TwoDofController> {
    params.iter().copied().map(TwoDofController::new).collect()
}

// ─── Tests ──────────────────────────────────────────────────────────
