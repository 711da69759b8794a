//! Joint topology acquisition.
//!
//! The topology (joint count and per-joint hard current limit) is obtained
//! once at startup. Failure is fatal: no per-joint state is built without a
//! valid joint list.

use std::path::{Path, PathBuf};

use thermo_common::consts::MAX_JOINTS;
use thermo_common::thermal::JointTopology;
use thiserror::Error;
use tracing::info;

/// Topology acquisition error.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Model source could not be read.
    #[error("failed to load model [{path}]: {reason}")]
    Load {
        /// Model location.
        path: String,
        /// Underlying cause.
        reason: String,
    },
    /// Model parsed but describes no joints.
    #[error("model [{0}] has no joints")]
    Empty(String),
    /// Model has more joints than supported.
    #[error("model [{path}] has {count} joints, limit is {max}")]
    TooManyJoints {
        /// Model location.
        path: String,
        /// Joints found.
        count: usize,
        /// Supported maximum.
        max: usize,
    },
    /// A joint limit is negative or non-finite.
    #[error("joint {index} ({name}) has invalid climit {climit}")]
    InvalidLimit {
        /// Joint index.
        index: usize,
        /// Joint name.
        name: String,
        /// Offending value.
        climit: f64,
    },
}

/// Source of the robot's joint topology.
pub trait JointTopologyProvider {
    /// Load the topology. Called once before the cycle loop starts.
    fn load(&self) -> Result<JointTopology, TopologyError>;
}

/// Topology read from a TOML model file.
///
/// ```toml
/// [[joints]]
/// name = "RLEG_HIP_Y"
/// climit = 100.0
/// ```
#[derive(Debug, Clone)]
pub struct TomlModelTopology {
    path: PathBuf,
}

impl TomlModelTopology {
    /// Topology provider for the model file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Model file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JointTopologyProvider for TomlModelTopology {
    fn load(&self) -> Result<JointTopology, TopologyError> {
        let name = self.path.display().to_string();
        let content = std::fs::read_to_string(&self.path).map_err(|e| TopologyError::Load {
            path: name.clone(),
            reason: e.to_string(),
        })?;
        let topology = parse_topology(&name, &content)?;
        info!("Loaded model [{}] with {} joints", name, topology.num_joints());
        Ok(topology)
    }
}

/// Fixed in-memory topology.
#[derive(Debug, Clone)]
pub struct StaticTopology(pub JointTopology);

impl JointTopologyProvider for StaticTopology {
    fn load(&self) -> Result<JointTopology, TopologyError> {
        validate_topology("<static>", &self.0)?;
        Ok(self.0.clone())
    }
}

/// Parse and validate a TOML topology document.
pub fn parse_topology(name: &str, content: &str) -> Result<JointTopology, TopologyError> {
    let topology: JointTopology = toml::from_str(content).map_err(|e| TopologyError::Load {
        path: name.to_string(),
        reason: e.to_string(),
    })?;
    validate_topology(name, &topology)?;
    Ok(topology)
}

fn validate_topology(name: &str, topology: &JointTopology) -> Result<(), TopologyError> {
    let count = topology.num_joints();
    if count == 0 {
        return Err(TopologyError::Empty(name.to_string()));
    }
    if count > MAX_JOINTS {
        return Err(TopologyError::TooManyJoints {
            path: name.to_string(),
            count,
            max: MAX_JOINTS,
        });
    }
    for (index, joint) in topology.joints.iter().enumerate() {
        if !joint.climit.is_finite() || joint.climit < 0.0 {
            return Err(TopologyError::InvalidLimit {
                index,
                name: joint.name.clone(),
                climit: joint.climit,
            });
        }
    }
    Ok(())
}
