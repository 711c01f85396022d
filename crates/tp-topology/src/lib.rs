//! # tp-topology
//!
//! Data model for Topology Policy: compartments, policy attachments, the
//! policy library document, stack instances, and blueprints.
//!
//! Snapshots are loaded as plain documents ([`TopologySnapshot`]) and
//! validated into a [`Topology`] before any resolution runs.
//!
//! ## Key invariants
//!
//! - **Tree shape**: compartment parent pointers form a forest. Duplicate
//!   ids, unknown parents, and cycles are rejected at load time.
//! - **Unique ids**: stack and blueprint ids are unique within a snapshot.
//! - **Read-only**: nothing downstream mutates a validated topology.

pub mod compartment;
pub mod error;
pub mod policy;
pub mod snapshot;
pub mod stack;
pub mod store;
pub mod tree;

pub use compartment::{Compartment, InlineAttachment, LibraryAttachment, PolicyAttachment};
pub use error::TopologyError;
pub use policy::{
    Effect, PolicyDefinition, PolicyLibrary, PolicyVariable, Severity, Statement, VariableType,
};
pub use snapshot::{Topology, TopologySnapshot};
pub use stack::{Blueprint, BlueprintParameter, StackInstance};
pub use store::{load_library, SnapshotStore};
pub use tree::CompartmentTree;
