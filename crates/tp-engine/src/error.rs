// error.rs — Error types for the resolution engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the engine's operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Loading or validating a topology snapshot failed.
    #[error("topology error: {0}")]
    Topology(#[from] tp_topology::TopologyError),

    /// The policy library or the requested compartment is invalid.
    #[error("policy error: {0}")]
    Policy(#[from] tp_policy::PolicyError),

    /// Deployment ordering failed (dangling dependency or cycle).
    #[error("deployment error: {0}")]
    Deploy(#[from] tp_stack::DeployError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
}
