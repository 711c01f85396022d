// engine.rs — The two resolution operations, keyed by topology id.
//
// Each call loads a fresh snapshot (topology + policy library), validates
// it, and then runs a pure, synchronous resolution over it. Nothing is
// cached between calls and nothing is written back, so repeated calls on an
// unchanged snapshot return identical results.

use tp_policy::{ChainResolver, PolicyError, PolicyIndex, ResolutionTrace, ResolvedPolicy};
use tp_stack::{assemble_topology, ResolutionPreview};
use tp_topology::{load_library, SnapshotStore, Topology};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Resolution engine over a snapshot store.
pub struct Engine {
    config: EngineConfig,
    store: SnapshotStore,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let store = SnapshotStore::new(config.topologies_dir.clone());
        Self { config, store }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Topology ids available in the store.
    pub fn list_topologies(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.store.list()?)
    }

    /// Load and validate one topology.
    pub fn load_topology(&self, topology_id: &str) -> Result<Topology, EngineError> {
        Ok(self.store.load(topology_id)?)
    }

    /// Build a fresh index from the configured policy library.
    pub fn load_index(&self) -> Result<PolicyIndex, EngineError> {
        let library = load_library(&self.config.library_path)?;
        Ok(PolicyIndex::build(&library)?)
    }

    /// `ResolveCompartmentPolicies(topologyId, compartmentId)`.
    pub fn resolve_compartment_policies(
        &self,
        topology_id: &str,
        compartment_id: &str,
    ) -> Result<Vec<ResolvedPolicy>, EngineError> {
        Ok(self
            .trace_compartment_policies(topology_id, compartment_id)?
            .policies)
    }

    /// Policy resolution with the per-attachment decision trail.
    pub fn trace_compartment_policies(
        &self,
        topology_id: &str,
        compartment_id: &str,
    ) -> Result<ResolutionTrace, EngineError> {
        let topology = self.load_topology(topology_id)?;
        let index = self.load_index()?;
        trace_policies(&topology, &index, compartment_id)
    }

    /// `PreviewResolution(topologyId)`.
    pub fn preview_resolution(&self, topology_id: &str) -> Result<ResolutionPreview, EngineError> {
        let topology = self.load_topology(topology_id)?;
        preview(&topology)
    }
}

/// Resolve a compartment's policies within an already-loaded topology.
pub fn trace_policies(
    topology: &Topology,
    index: &PolicyIndex,
    compartment_id: &str,
) -> Result<ResolutionTrace, EngineError> {
    let target = topology
        .compartment(compartment_id)
        .ok_or_else(|| PolicyError::UnknownCompartment {
            compartment_id: compartment_id.to_string(),
        })?;
    let trace = ChainResolver::new(index).resolve_with_trace(target, &topology.tree);
    tracing::info!(
        topology = %topology.topology_id,
        compartment = %compartment_id,
        policies = trace.policies.len(),
        "resolved compartment policies"
    );
    Ok(trace)
}

/// Build the resolution preview for an already-loaded topology.
pub fn preview(topology: &Topology) -> Result<ResolutionPreview, EngineError> {
    let preview = assemble_topology(topology)?;
    tracing::info!(
        topology = %topology.topology_id,
        waves = preview.deployment_order.len(),
        all_complete = preview.all_complete,
        total_unresolved = preview.total_unresolved,
        "built resolution preview"
    );
    Ok(preview)
}
