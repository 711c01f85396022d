// preview.rs — Resolution preview assembly.
//
// Combines the deployment order with per-stack parameter resolution into
// one report. A cycle or dangling dependency aborts the whole preview.

use serde::{Deserialize, Serialize};
use tp_topology::{BlueprintParameter, Compartment, StackInstance, Topology};

use crate::error::DeployError;
use crate::order::{order, DeploymentOrder};
use crate::params::{resolve_parameters, StackResolution};

/// Deployment order plus parameter completeness for every stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionPreview {
    pub deployment_order: DeploymentOrder,
    /// One entry per stack, in input order.
    pub stacks: Vec<StackResolution>,
    pub all_complete: bool,
    pub total_unresolved: usize,
}

impl ResolutionPreview {
    /// Human-readable reasons a deploy should be held back. Empty when
    /// every stack is complete.
    pub fn blocking_reasons(&self) -> Vec<String> {
        self.stacks
            .iter()
            .filter(|s| !s.is_complete)
            .map(|s| {
                format!(
                    "stack '{}' is missing required parameter(s): {}",
                    s.stack_id,
                    s.missing().collect::<Vec<_>>().join(", ")
                )
            })
            .collect()
    }
}

/// Assemble a preview from explicit lookups.
///
/// `blueprint_params` returns the parameter schema for a blueprint id;
/// `compartment_of` returns a compartment by id.
pub fn assemble<'a, B, C>(
    stacks: &[StackInstance],
    blueprint_params: B,
    compartment_of: C,
) -> Result<ResolutionPreview, DeployError>
where
    B: Fn(&str) -> Option<&'a [BlueprintParameter]>,
    C: Fn(&str) -> Option<&'a Compartment>,
{
    let deployment_order = order(stacks)?;

    let resolutions: Vec<StackResolution> = stacks
        .iter()
        .map(|stack| {
            let params = blueprint_params(&stack.blueprint_id).unwrap_or_else(|| {
                tracing::warn!(
                    stack = %stack.id,
                    blueprint = %stack.blueprint_id,
                    "blueprint not found; resolving with no parameters"
                );
                &[]
            });
            let compartment = stack.compartment_id.as_deref().and_then(|id| {
                let found = compartment_of(id);
                if found.is_none() {
                    tracing::warn!(
                        stack = %stack.id,
                        compartment = %id,
                        "containing compartment not found; resolving without it"
                    );
                }
                found
            });
            resolve_parameters(stack, params, compartment)
        })
        .collect();

    let all_complete = resolutions.iter().all(|r| r.is_complete);
    let total_unresolved = resolutions.iter().map(|r| r.unresolved_count).sum();

    tracing::debug!(
        stacks = resolutions.len(),
        waves = deployment_order.len(),
        total_unresolved,
        "assembled resolution preview"
    );

    Ok(ResolutionPreview {
        deployment_order,
        stacks: resolutions,
        all_complete,
        total_unresolved,
    })
}

/// Assemble a preview for every stack in a validated topology.
pub fn assemble_topology(topology: &Topology) -> Result<ResolutionPreview, DeployError> {
    assemble(
        &topology.stacks,
        |id| topology.blueprint(id).map(|b| b.parameters.as_slice()),
        |id| topology.compartment(id),
    )
}
