// error.rs — Error types for topology loading and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a topology snapshot.
///
/// All of these are load-time failures. Once a snapshot has been validated
/// into a [`crate::Topology`], resolution never produces them.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Two compartments share the same id.
    #[error("duplicate compartment id '{id}'")]
    DuplicateCompartment { id: String },

    /// A compartment names a parent that is not in the snapshot.
    #[error("compartment '{id}' references unknown parent '{parent_id}'")]
    UnknownParent { id: String, parent_id: String },

    /// The parent pointers do not form a tree.
    #[error("compartment parent chain is cyclic: {}", ids.join(", "))]
    ParentCycle { ids: Vec<String> },

    /// Two stack instances share the same id.
    #[error("duplicate stack id '{id}'")]
    DuplicateStack { id: String },

    /// Two blueprints share the same id.
    #[error("duplicate blueprint id '{id}'")]
    DuplicateBlueprint { id: String },

    /// No snapshot file exists for the requested topology.
    #[error("topology '{topology_id}' not found in {}", dir.display())]
    NotFound { topology_id: String, dir: PathBuf },

    /// A topology id that cannot name a file inside the store directory.
    #[error("invalid topology id '{topology_id}'")]
    InvalidTopologyId { topology_id: String },

    /// The snapshot file declares a different id than the one it is stored under.
    #[error("snapshot at {} declares topology '{found}', expected '{requested}'", path.display())]
    TopologyIdMismatch {
        requested: String,
        found: String,
        path: PathBuf,
    },

    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse YAML at {path}: {source}")]
    YamlError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to parse JSON at {path}: {source}")]
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    SerializeError(#[from] serde_yaml::Error),
}
