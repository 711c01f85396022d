// order.rs — Deployment wave ordering (Kahn's algorithm).
//
// An edge A -> B means "A depends on B": B must be deployed first.
//
// 1. Validate every dependency id exists → DanglingDependency otherwise.
// 2. In-degree of a stack = number of distinct dependencies.
// 3. Each round, every stack with in-degree 0 forms the next wave (in input
//    order), is removed, and its dependents' in-degrees drop.
// 4. If stacks remain but none has in-degree 0 → Cycle, naming them all.
//
// The loop runs at most once per stack, so it always terminates.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tp_topology::StackInstance;

use crate::error::DeployError;

/// Stacks grouped into waves. Stacks inside a wave may deploy in parallel;
/// a wave must finish before the next starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DeploymentOrder {
    pub waves: Vec<Vec<String>>,
}

impl DeploymentOrder {
    /// Number of waves.
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Index of the wave containing `stack_id`.
    pub fn wave_of(&self, stack_id: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|id| id == stack_id))
    }

    /// All stack ids, wave by wave.
    pub fn stack_ids(&self) -> impl Iterator<Item = &str> {
        self.waves.iter().flatten().map(String::as_str)
    }
}

/// Order `stacks` into deployment waves.
pub fn order(stacks: &[StackInstance]) -> Result<DeploymentOrder, DeployError> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(stacks.len());
    for (pos, stack) in stacks.iter().enumerate() {
        position.entry(stack.id.as_str()).or_insert(pos);
    }

    // dependents[b] = stacks that depend on b
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); stacks.len()];
    let mut in_degree: Vec<usize> = vec![0; stacks.len()];
    for (pos, stack) in stacks.iter().enumerate() {
        let mut deps = BTreeSet::new();
        for dep in &stack.depends_on {
            let dep_pos =
                position
                    .get(dep.as_str())
                    .copied()
                    .ok_or_else(|| DeployError::DanglingDependency {
                        stack_id: stack.id.clone(),
                        dependency_id: dep.clone(),
                    })?;
            deps.insert(dep_pos);
        }
        in_degree[pos] = deps.len();
        for dep_pos in deps {
            dependents[dep_pos].push(pos);
        }
    }

    let mut scheduled = vec![false; stacks.len()];
    let mut remaining = stacks.len();
    let mut waves = Vec::new();

    while remaining > 0 {
        let wave: Vec<usize> = (0..stacks.len())
            .filter(|&pos| !scheduled[pos] && in_degree[pos] == 0)
            .collect();

        if wave.is_empty() {
            let stack_ids: Vec<String> = (0..stacks.len())
                .filter(|&pos| !scheduled[pos])
                .map(|pos| stacks[pos].id.clone())
                .collect();
            tracing::warn!(stacks = ?stack_ids, "dependency cycle detected");
            return Err(DeployError::Cycle { stack_ids });
        }

        for &pos in &wave {
            scheduled[pos] = true;
            for &dependent in &dependents[pos] {
                in_degree[dependent] -= 1;
            }
        }
        remaining -= wave.len();
        waves.push(wave.into_iter().map(|pos| stacks[pos].id.clone()).collect());
    }

    tracing::debug!(
        stacks = stacks.len(),
        waves = waves.len(),
        "computed deployment order"
    );
    Ok(DeploymentOrder { waves })
}
