//! # tp-engine
//!
//! Entry point for Topology Policy resolution. Exposes the two read-only
//! operations callers build on:
//!
//! - [`Engine::resolve_compartment_policies`]: effective policies for one
//!   compartment of a topology.
//! - [`Engine::preview_resolution`]: deployment waves plus per-stack
//!   parameter completeness for a topology.
//!
//! Both load a snapshot through [`tp_topology::SnapshotStore`], validate it,
//! and run pure resolution over it. Neither persists anything.

pub mod config;
pub mod engine;
pub mod error;

pub use config::{EngineConfig, EngineSettings, OutputFormat};
pub use engine::{preview, trace_policies, Engine};
pub use error::EngineError;

pub use tp_policy::{PolicySource, ResolutionTrace, ResolvedPolicy, TraceOutcome};
pub use tp_stack::{DeployError, ParameterSource, ResolutionPreview, StackResolution};
