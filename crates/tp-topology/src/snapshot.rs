// snapshot.rs — Topology snapshots and their validated form.
//
// A TopologySnapshot is the raw document a caller supplies (or the store
// loads from disk). `validate()` turns it into a Topology: the compartment
// list becomes an arena tree and ids are checked for uniqueness. Resolution
// only ever operates on a validated Topology.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::compartment::Compartment;
use crate::error::TopologyError;
use crate::stack::{Blueprint, StackInstance};
use crate::tree::CompartmentTree;

/// A complete topology as stored on disk.
///
/// ```yaml
/// topology_id: acme
/// name: ACME production estate
/// compartments:
///   - id: root
///   - id: prod
///     parent_id: root
/// blueprints:
///   - id: vpc
///     parameters: [{ name: cidr, is_required: true }]
/// stacks:
///   - id: network
///     blueprint_id: vpc
///     compartment_id: prod
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TopologySnapshot {
    /// Filled in from the file name when empty.
    #[serde(default)]
    pub topology_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub compartments: Vec<Compartment>,
    #[serde(default)]
    pub blueprints: Vec<Blueprint>,
    #[serde(default)]
    pub stacks: Vec<StackInstance>,
}

impl TopologySnapshot {
    /// Validate the snapshot into a resolvable [`Topology`].
    ///
    /// Dangling `depends_on` references are left for the deployment orderer
    /// to report.
    pub fn validate(self) -> Result<Topology, TopologyError> {
        let mut seen = HashSet::with_capacity(self.stacks.len());
        for stack in &self.stacks {
            if !seen.insert(stack.id.as_str()) {
                return Err(TopologyError::DuplicateStack {
                    id: stack.id.clone(),
                });
            }
        }

        let mut blueprints = BTreeMap::new();
        for blueprint in self.blueprints {
            if blueprints.contains_key(&blueprint.id) {
                return Err(TopologyError::DuplicateBlueprint { id: blueprint.id });
            }
            blueprints.insert(blueprint.id.clone(), blueprint);
        }

        let tree = CompartmentTree::build(self.compartments)?;

        Ok(Topology {
            topology_id: self.topology_id,
            name: self.name,
            tree,
            blueprints,
            stacks: self.stacks,
        })
    }
}

/// A validated topology: a well-formed compartment tree plus stacks and
/// blueprints with unique ids.
#[derive(Debug, Clone)]
pub struct Topology {
    pub topology_id: String,
    pub name: String,
    pub tree: CompartmentTree,
    pub blueprints: BTreeMap<String, Blueprint>,
    /// Stacks in input order (the orderer's tie-break).
    pub stacks: Vec<StackInstance>,
}

impl Topology {
    pub fn compartment(&self, id: &str) -> Option<&Compartment> {
        self.tree.get(id)
    }

    pub fn blueprint(&self, id: &str) -> Option<&Blueprint> {
        self.blueprints.get(id)
    }

    pub fn stack(&self, id: &str) -> Option<&StackInstance> {
        self.stacks.iter().find(|s| s.id == id)
    }
}
