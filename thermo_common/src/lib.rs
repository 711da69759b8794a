//! Thermo Limiter Common Library
//!
//! Shared constants, configuration loading utilities and thermal data types
//! for the thermo limiter workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Built-in defaults and numeric limits
//! - [`config`] - Configuration loading traits and types
//! - [`thermal`] - Per-joint thermal records, samples and topology
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use thermo_common::prelude::*;
//!
//! let param = JointThermalParam::new(100.0);
//! assert_eq!(param.max_temperature, DEFAULT_MAX_TEMPERATURE);
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod thermal;
