// error.rs — Error types for deployment ordering.

use thiserror::Error;

/// Fatal conditions for ordering and preview assembly. Neither yields a
/// partial result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeployError {
    /// A stack depends on an id that is not in the stack set.
    #[error("stack '{stack_id}' depends on unknown stack '{dependency_id}'")]
    DanglingDependency {
        stack_id: String,
        dependency_id: String,
    },

    /// The dependency graph is not a DAG. `stack_ids` are the stacks that
    /// could not be scheduled, in input order.
    #[error("dependency cycle among stacks: {}", stack_ids.join(", "))]
    Cycle { stack_ids: Vec<String> },
}
