// error.rs — Error types for the policy subsystem.

use thiserror::Error;

/// Errors that can occur during policy operations.
///
/// A library reference to an unknown policy id is deliberately *not* here:
/// it resolves to a visible policy with no statements.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Two library policies share the same id.
    #[error("duplicate library policy id '{id}'")]
    DuplicatePolicy { id: String },

    /// The requested compartment is not part of the topology.
    #[error("no compartment '{compartment_id}' in topology")]
    UnknownCompartment { compartment_id: String },
}
