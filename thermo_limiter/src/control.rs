//! Control engine root.
//!
//! Torque-tracking controllers co-configured with the thermal limiter.

pub mod two_dof;
