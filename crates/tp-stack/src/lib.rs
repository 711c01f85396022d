//! # tp-stack
//!
//! Deployment planning for Topology Policy stacks.
//!
//! - [`order`] groups stacks into deployment waves with Kahn's algorithm.
//! - [`resolve_parameters`] applies the five-tier parameter precedence.
//! - [`assemble`] combines both into a [`ResolutionPreview`].
//!
//! ## Key invariants
//!
//! - **Topological validity**: every dependency of a stack sits in an
//!   earlier wave.
//! - **No partial plans**: dangling dependencies and cycles are errors,
//!   never a truncated order.
//! - **Deterministic**: identical inputs give identical previews.

pub mod error;
pub mod order;
pub mod params;
pub mod preview;

pub use error::DeployError;
pub use order::{order, DeploymentOrder};
pub use params::{
    resolve_parameter, resolve_parameters, ParameterSource, ResolvedParameter, StackResolution,
};
pub use preview::{assemble, assemble_topology, ResolutionPreview};
