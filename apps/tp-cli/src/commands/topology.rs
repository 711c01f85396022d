// topology.rs — Topology subcommands: list, validate, tree.

use clap::Subcommand;
use serde::Serialize;
use tp_engine::Engine;
use tp_topology::{Compartment, CompartmentTree, Topology};

use super::print_json_if_requested;

#[derive(Subcommand)]
pub enum TopologyCommands {
    /// List stored topology snapshots.
    List,
    /// Load a snapshot and check it for structural errors.
    Validate {
        /// Topology id.
        id: String,
    },
    /// Print the compartment hierarchy of a topology.
    Tree {
        /// Topology id.
        id: String,
    },
}

#[derive(Serialize)]
struct ValidationSummary<'a> {
    topology_id: &'a str,
    name: &'a str,
    compartments: usize,
    blueprints: usize,
    stacks: usize,
    policy_library_size: usize,
}

/// One compartment with its subtree, for `--json` tree output.
#[derive(Serialize)]
struct TreeNode<'a> {
    id: &'a str,
    label: &'a str,
    policies: usize,
    suppressed: usize,
    children: Vec<TreeNode<'a>>,
}

fn tree_node<'a>(tree: &'a CompartmentTree, node: &'a Compartment) -> TreeNode<'a> {
    TreeNode {
        id: &node.id,
        label: &node.label,
        policies: node.policies.len(),
        suppressed: node.suppressed.len(),
        children: tree
            .children(&node.id)
            .into_iter()
            .map(|child| tree_node(tree, child))
            .collect(),
    }
}

pub fn execute(cmd: &TopologyCommands, engine: &Engine) -> anyhow::Result<()> {
    match cmd {
        TopologyCommands::List => {
            let ids = engine.list_topologies()?;
            if print_json_if_requested(engine, &ids)? {
                return Ok(());
            }
            if ids.is_empty() {
                println!(
                    "No topologies found in {}",
                    engine.store().dir().display()
                );
                return Ok(());
            }
            for id in ids {
                println!("{}", id);
            }
        }

        TopologyCommands::Validate { id } => {
            let topology = engine.load_topology(id)?;
            let index = engine.load_index()?;
            let summary = ValidationSummary {
                topology_id: &topology.topology_id,
                name: &topology.name,
                compartments: topology.tree.len(),
                blueprints: topology.blueprints.len(),
                stacks: topology.stacks.len(),
                policy_library_size: index.len(),
            };
            if print_json_if_requested(engine, &summary)? {
                return Ok(());
            }
            println!(
                "Topology '{}' is valid: {} compartment(s), {} blueprint(s), {} stack(s).",
                summary.topology_id, summary.compartments, summary.blueprints, summary.stacks
            );
            println!("Policy library: {} policies.", summary.policy_library_size);
        }

        TopologyCommands::Tree { id } => {
            let topology = engine.load_topology(id)?;
            let nodes: Vec<TreeNode> = topology
                .tree
                .roots()
                .map(|root| tree_node(&topology.tree, root))
                .collect();
            if print_json_if_requested(engine, &nodes)? {
                return Ok(());
            }
            print_tree(&topology);
        }
    }

    Ok(())
}

fn print_tree(topology: &Topology) {
    if topology.tree.is_empty() {
        println!("Topology '{}' has no compartments.", topology.topology_id);
        return;
    }
    for root in topology.tree.roots() {
        print_node(&topology.tree, &root.id, 0);
    }
}

fn print_node(tree: &CompartmentTree, id: &str, depth: usize) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let mut notes = Vec::new();
    if !node.policies.is_empty() {
        notes.push(format!("{} policies", node.policies.len()));
    }
    if !node.suppressed.is_empty() {
        notes.push(format!("{} suppressed", node.suppressed.len()));
    }
    let suffix = if notes.is_empty() {
        String::new()
    } else {
        format!("  ({})", notes.join(", "))
    };
    let label = if node.label.is_empty() {
        &node.id
    } else {
        &node.label
    };
    println!("{}{} [{}]{}", "  ".repeat(depth), label, node.id, suffix);
    for child in tree.children(id) {
        print_node(tree, &child.id, depth + 1);
    }
}
