// tree.rs — Arena-backed compartment hierarchy.
//
// Compartments arrive as a flat list with parent pointers. The tree keeps
// them in an id-keyed arena plus a children index computed once at build
// time. Acyclicity is checked here, so resolution walks never need a
// visited set.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::compartment::Compartment;
use crate::error::TopologyError;

/// A validated compartment hierarchy.
#[derive(Debug, Clone, Default)]
pub struct CompartmentTree {
    /// Compartments in input order.
    nodes: Vec<Compartment>,
    /// id → position in `nodes`.
    index: HashMap<String, usize>,
    /// Parent position → child positions, in input order.
    children: BTreeMap<usize, Vec<usize>>,
    roots: Vec<usize>,
}

impl CompartmentTree {
    /// Build the tree, rejecting duplicate ids, unknown parents, and cycles.
    pub fn build(compartments: Vec<Compartment>) -> Result<Self, TopologyError> {
        let mut index = HashMap::with_capacity(compartments.len());
        for (pos, c) in compartments.iter().enumerate() {
            if index.insert(c.id.clone(), pos).is_some() {
                return Err(TopologyError::DuplicateCompartment { id: c.id.clone() });
            }
        }

        let mut children: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut roots = Vec::new();
        for (pos, c) in compartments.iter().enumerate() {
            match &c.parent_id {
                None => roots.push(pos),
                Some(parent_id) => {
                    let parent = index.get(parent_id).copied().ok_or_else(|| {
                        TopologyError::UnknownParent {
                            id: c.id.clone(),
                            parent_id: parent_id.clone(),
                        }
                    })?;
                    children.entry(parent).or_default().push(pos);
                }
            }
        }

        // Everything reachable from a root is part of the tree; anything
        // left over sits on (or hangs off) a parent cycle.
        let mut reachable = HashSet::with_capacity(compartments.len());
        let mut stack: Vec<usize> = roots.clone();
        while let Some(pos) = stack.pop() {
            if reachable.insert(pos) {
                if let Some(kids) = children.get(&pos) {
                    stack.extend(kids.iter().copied());
                }
            }
        }
        if reachable.len() != compartments.len() {
            let ids = compartments
                .iter()
                .enumerate()
                .filter(|(pos, _)| !reachable.contains(pos))
                .map(|(_, c)| c.id.clone())
                .collect();
            return Err(TopologyError::ParentCycle { ids });
        }

        tracing::debug!(
            compartments = compartments.len(),
            roots = roots.len(),
            "compartment tree built"
        );

        Ok(Self {
            nodes: compartments,
            index,
            children,
            roots,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Compartment> {
        self.index.get(id).map(|&pos| &self.nodes[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All compartments in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Compartment> {
        self.nodes.iter()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Compartment> {
        self.roots.iter().map(move |&pos| &self.nodes[pos])
    }

    pub fn parent(&self, id: &str) -> Option<&Compartment> {
        self.get(id)
            .and_then(|c| c.parent_id.as_deref())
            .and_then(|parent_id| self.get(parent_id))
    }

    /// Direct children of `id`, in input order.
    pub fn children(&self, id: &str) -> Vec<&Compartment> {
        self.index
            .get(id)
            .and_then(|pos| self.children.get(pos))
            .map(|kids| kids.iter().map(|&k| &self.nodes[k]).collect())
            .unwrap_or_default()
    }

    /// The chain `[id, parent, ..., root]` paired with each member's distance
    /// from `id`. Empty if `id` is unknown.
    pub fn ancestor_chain(&self, id: &str) -> Vec<(usize, &Compartment)> {
        let mut chain = Vec::new();
        let mut current = self.get(id);
        while let Some(c) = current {
            chain.push((chain.len(), c));
            current = c.parent_id.as_deref().and_then(|p| self.get(p));
        }
        chain
    }

    /// Number of ancestors above `id` (0 for a root).
    pub fn depth(&self, id: &str) -> Option<usize> {
        let chain = self.ancestor_chain(id);
        chain.len().checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: &str, parent: Option<&str>) -> Compartment {
        Compartment::new(id, parent)
    }

    #[test]
    fn builds_tree_and_walks_ancestors() {
        let tree = CompartmentTree::build(vec![
            c("root", None),
            c("prod", Some("root")),
            c("prod-eu", Some("prod")),
            c("dev", Some("root")),
        ])
        .unwrap();

        let chain: Vec<(usize, &str)> = tree
            .ancestor_chain("prod-eu")
            .into_iter()
            .map(|(d, c)| (d, c.id.as_str()))
            .collect();
        assert_eq!(chain, vec![(0, "prod-eu"), (1, "prod"), (2, "root")]);
        assert_eq!(tree.depth("prod-eu"), Some(2));
        assert_eq!(tree.depth("root"), Some(0));
        assert_eq!(tree.depth("missing"), None);
        assert_eq!(tree.parent("prod").map(|p| p.id.as_str()), Some("root"));
    }

    #[test]
    fn children_preserve_input_order() {
        let tree = CompartmentTree::build(vec![
            c("root", None),
            c("b", Some("root")),
            c("a", Some("root")),
        ])
        .unwrap();
        let kids: Vec<&str> = tree.children("root").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(kids, vec!["b", "a"]);
        assert!(tree.children("a").is_empty());
        assert_eq!(tree.roots().count(), 1);
    }

    #[test]
    fn parent_may_appear_after_child() {
        let tree = CompartmentTree::build(vec![c("child", Some("root")), c("root", None)]).unwrap();
        assert_eq!(tree.ancestor_chain("child").len(), 2);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = CompartmentTree::build(vec![c("root", None), c("root", None)]).unwrap_err();
        assert!(matches!(err, TopologyError::DuplicateCompartment { id } if id == "root"));
    }

    #[test]
    fn rejects_unknown_parent() {
        let err = CompartmentTree::build(vec![c("prod", Some("nowhere"))]).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::UnknownParent { ref id, ref parent_id } if id == "prod" && parent_id == "nowhere"
        ));
    }

    #[test]
    fn rejects_parent_cycle() {
        let err = CompartmentTree::build(vec![
            c("root", None),
            c("a", Some("b")),
            c("b", Some("a")),
            c("hanger", Some("a")),
        ])
        .unwrap_err();
        match err {
            TopologyError::ParentCycle { ids } => assert_eq!(ids, vec!["a", "b", "hanger"]),
            other => panic!("expected ParentCycle, got {:?}", other),
        }
    }

    #[test]
    fn rejects_self_parent() {
        let err = CompartmentTree::build(vec![c("loop", Some("loop"))]).unwrap_err();
        assert!(matches!(err, TopologyError::ParentCycle { .. }));
    }

    #[test]
    fn empty_tree_is_valid() {
        let tree = CompartmentTree::build(vec![]).unwrap();
        assert!(tree.is_empty());
        assert!(tree.ancestor_chain("anything").is_empty());
    }
}
