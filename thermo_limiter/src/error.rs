//! Initialization errors.
//!
//! Only startup can fail. Once the cycle is running every error is local
//! to a joint (flag + fallback value) and never propagates.

use thermo_common::config::ConfigError;
use thiserror::Error;

use crate::state::lifecycle::LifecycleState;
use crate::topology::TopologyError;

/// Error preventing the limiter from entering the running state.
#[derive(Debug, Error)]
pub enum InitError {
    /// Configuration unreadable, unparseable or invalid.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// Joint topology could not be obtained.
    #[error("topology: {0}")]
    Topology(#[from] TopologyError),
    /// No model file configured.
    #[error("no joint model configured (set `model`)")]
    MissingModel,
    /// Lifecycle transition rejected.
    #[error("lifecycle transition rejected in state {state}: {reason}")]
    Lifecycle {
        /// State at the time of the request.
        state: LifecycleState,
        /// Rejection reason.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_cause() {
        let e = InitError::from(ConfigError::ValidationError("dt must be > 0".into()));
        assert!(e.to_string().contains("dt must be > 0"));
        let e = InitError::Lifecycle {
            state: LifecycleState::Running,
            reason: "already initialized",
        };
        assert!(e.to_string().contains("Running"));
        assert!(InitError::MissingModel.to_string().contains("model"));
    }
}
