use std::collections::{HashMap, HashSet};

use crate::errors::{resolution_failure, Result};
use crate::graph_model::NodeId;

/// Upper bound on the ancestor walk performed when a collapse has to reroute
/// edges whose endpoints live outside of the collapsed subtree.
pub const MAX_ANCESTOR_HOPS: usize = 10;

/// Anything that can answer "is this node currently rendered?".
pub trait VisibleSet {
    fn contains_node(&self, id: &NodeId) -> bool;
}

impl VisibleSet for HashSet<NodeId> {
    fn contains_node(&self, id: &NodeId) -> bool {
        self.contains(id)
    }
}

/// Parent/child relations of one scenario.  The hierarchy is expected to be a
/// forest but this is not validated; all walks are bounded so that a cyclic
/// input can't hang us.
#[derive(Debug, Default)]
pub struct HierarchyIndex {
    parent_to_descendants: HashMap<NodeId, Vec<NodeId>>,
    child_to_parent: HashMap<NodeId, NodeId>,
    parent_to_children: HashMap<NodeId, Vec<NodeId>>,
    root_to_descendants: HashMap<NodeId, Vec<NodeId>>,
    descendant_to_root: HashMap<NodeId, NodeId>,
}

impl HierarchyIndex {
    pub fn build(
        parent_to_descendants: HashMap<NodeId, Vec<NodeId>>,
        child_to_parent: HashMap<NodeId, NodeId>,
    ) -> Self {
        let mut parent_to_children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (child, parent) in &child_to_parent {
            parent_to_children
                .entry(parent.clone())
                .or_default()
                .push(child.clone());
        }
        for children in parent_to_children.values_mut() {
            children.sort();
        }

        let all_descendants: HashSet<&NodeId> = parent_to_descendants.values().flatten().collect();
        let mut roots: Vec<&NodeId> = parent_to_descendants
            .keys()
            .filter(|p| !all_descendants.contains(p))
            .collect();
        roots.sort();

        let mut root_to_descendants = HashMap::new();
        let mut descendant_to_root = HashMap::new();
        for root in roots {
            let descendants = parent_to_descendants[root].clone();
            for descendant in &descendants {
                descendant_to_root.insert(descendant.clone(), root.clone());
            }
            root_to_descendants.insert(root.clone(), descendants);
        }

        HierarchyIndex {
            parent_to_descendants,
            child_to_parent,
            parent_to_children,
            root_to_descendants,
            descendant_to_root,
        }
    }

    pub fn direct_children(&self, id: &NodeId) -> &[NodeId] {
        self.parent_to_children
            .get(id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_descendants(&self, id: &NodeId) -> &[NodeId] {
        self.parent_to_descendants
            .get(id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn direct_parent(&self, id: &NodeId) -> Option<&NodeId> {
        self.child_to_parent.get(id)
    }

    /// The top-most ancestor of a descendant; `None` for roots and for nodes
    /// outside of any hierarchy.
    pub fn root_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.descendant_to_root.get(id)
    }

    pub fn roots(&self) -> impl Iterator<Item = (&NodeId, &Vec<NodeId>)> {
        self.root_to_descendants.iter()
    }

    pub fn is_child(&self, id: &NodeId) -> bool {
        self.child_to_parent.contains_key(id)
    }

    pub fn is_aggregate(&self, id: &NodeId) -> bool {
        self.parent_to_descendants.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.parent_to_descendants.is_empty() && self.child_to_parent.is_empty()
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut ancestors = vec![];
        let mut current = id;
        while let Some(parent) = self.child_to_parent.get(current) {
            if ancestors.len() > self.child_to_parent.len() {
                break;
            }
            ancestors.push(parent.clone());
            current = parent;
        }
        ancestors
    }

    /// Walk from `id` (inclusive) up the parent chain until a visible node is
    /// found.
    pub fn nearest_visible_ancestor(&self, id: &NodeId, visible: &impl VisibleSet) -> Option<NodeId> {
        self.nearest_visible_ancestor_bounded(id, visible, self.child_to_parent.len() + 1)
            .ok()
    }

    /// Like `nearest_visible_ancestor` but gives up after `max_hops` parent
    /// links and reports where it stopped.
    pub fn nearest_visible_ancestor_bounded(
        &self,
        id: &NodeId,
        visible: &impl VisibleSet,
        max_hops: usize,
    ) -> Result<NodeId> {
        let mut current = id;
        for _ in 0..=max_hops {
            if visible.contains_node(current) {
                return Ok(current.clone());
            }
            match self.child_to_parent.get(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Err(resolution_failure(format!(
            "no visible ancestor for node {} within {} hops (stopped at {})",
            id, max_hops, current
        )))
    }
}
