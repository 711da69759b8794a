//! # Thermo Limiter Library
//!
//! Per-joint torque ceilings derived from motor temperature.
//!
//! Each cycle the [`limiter::ThermalLimiter`] estimates how much torque every
//! motor can sustain over a fixed horizon without crossing its temperature
//! limit, flags joints that are infeasible or over-driven, and publishes the
//! ceilings. Results live in a shared [`store::ThermalStore`] that the
//! [`service::ThermoLimiterService`] answers point queries from.
//!
//! ## Layout
//!
//! - [`config`] / [`topology`]: startup configuration and joint model
//! - [`limiter`] / [`store`]: the thermal law and its state
//! - [`cycle`]: lifecycle-gated periodic driver with RT setup
//! - [`io`] / [`alert`]: sample, output and alert ports
//! - [`control`]: two-DOF torque controller bank

pub mod alert;
pub mod config;
pub mod control;
pub mod cycle;
pub mod error;
pub mod io;
pub mod limiter;
pub mod service;
pub mod state;
pub mod store;
pub mod topology;
