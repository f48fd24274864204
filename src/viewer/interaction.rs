//! Expanding an aggregate replaces it by its direct children; collapsing any
//! child puts the aggregate back in place of its whole subtree.  In both
//! directions the affected edges are rerouted to whatever is drawn.

use std::collections::HashSet;

use tracing::{error, info, warn};

use super::scenario_view::ScenarioView;
use super::session::SessionContext;
use crate::errors::{missing_lookup, resolution_failure, Result, ViewerError};
use crate::graph_model::{EdgeId, NodeId};
use crate::layout::{Edge, MAX_ANCESTOR_HOPS};

/// What a transition did.  Failures that didn't stop the transition (an edge
/// that couldn't be rerouted, a child without a cluster) are collected here.
#[derive(Debug, Default)]
pub struct InteractionOutcome {
    pub changed: bool,
    pub nodes_added: Vec<NodeId>,
    pub nodes_removed: Vec<NodeId>,
    pub edges_added: Vec<EdgeId>,
    pub failures: Vec<ViewerError>,
}

impl InteractionOutcome {
    fn unchanged() -> Self {
        InteractionOutcome::default()
    }

    fn fail(&mut self, err: ViewerError) {
        error!("{}", err);
        self.failures.push(err);
    }
}

impl ScenarioView {
    /// Replace the aggregate `id` by its direct children.  Anything that isn't
    /// an aggregate is left alone.
    pub fn expand(&mut self, id: &NodeId, ctx: &mut SessionContext) -> Result<InteractionOutcome> {
        if !self.hierarchy.is_aggregate(id) {
            return Ok(InteractionOutcome::unchanged());
        }
        if !self.state.has_node(id) {
            return Err(missing_lookup(format!("cannot expand node {}, it is not drawn", id)));
        }

        let mut outcome = InteractionOutcome {
            changed: true,
            ..InteractionOutcome::default()
        };
        self.state.remove_node(id);
        self.state.remove_edge_by_node(id);
        outcome.nodes_removed.push(id.clone());

        let children: Vec<NodeId> = self.hierarchy.direct_children(id).to_vec();
        let mut added: HashSet<NodeId> = HashSet::new();
        for child in children {
            let data = match self.dataset.node(&child) {
                Some(data) => data,
                None => continue,
            };
            let group = self.group_of(data);
            let node = self.render_node(data, ctx);
            match self.state.add_node(group.as_deref(), node) {
                Ok(()) => {
                    added.insert(child.clone());
                    outcome.nodes_added.push(child);
                }
                Err(err) => outcome.fail(err),
            }
        }

        let mut subtree: HashSet<&NodeId> = self.hierarchy.all_descendants(id).iter().collect();
        subtree.insert(id);

        let mut new_edges = vec![];
        for edge in self.dataset.relation_edges() {
            if !subtree.contains(&edge.source) && !subtree.contains(&edge.target) {
                continue;
            }
            let source = self.hierarchy.nearest_visible_ancestor(&edge.source, &self.state);
            let target = self.hierarchy.nearest_visible_ancestor(&edge.target, &self.state);
            let (source, target) = match (source, target) {
                (Some(source), Some(target)) => (source, target),
                _ => {
                    outcome.fail(resolution_failure(format!(
                        "edge {} ({} -> {}) has no visible endpoint after expanding {}",
                        edge.id, edge.source, edge.target, id
                    )));
                    continue;
                }
            };
            if !added.contains(&source) && !added.contains(&target) {
                continue;
            }
            if self.state.has_edge(&edge.id, &source, &target) {
                continue;
            }
            new_edges.push(Edge::from_data(edge, source, target));
        }
        for edge in new_edges {
            outcome.edges_added.push(edge.id.clone());
            self.state.add_edge(edge);
        }

        info!(
            node = %id,
            added = outcome.nodes_added.len(),
            edges = outcome.edges_added.len(),
            failures = outcome.failures.len(),
            "expanded"
        );
        self.state.render()?;
        Ok(outcome)
    }

    /// Collapse the subtree that `id` belongs to back into its parent.
    pub fn collapse(&mut self, id: &NodeId, ctx: &mut SessionContext) -> Result<InteractionOutcome> {
        let parent = match self.hierarchy.direct_parent(id) {
            Some(parent) => parent.clone(),
            None => return Ok(InteractionOutcome::unchanged()),
        };
        if !self.state.has_node(id) {
            return Err(missing_lookup(format!("cannot collapse node {}, it is not drawn", id)));
        }
        let parent_data = match self.dataset.node(&parent) {
            Some(data) => data,
            None => {
                return Err(missing_lookup(format!(
                    "cannot collapse into node {}, it is not part of scenario {}",
                    parent, self.name
                )))
            }
        };
        let parent_group = self.group_of(parent_data);
        let parent_node = self.render_node(parent_data, ctx);

        let mut outcome = InteractionOutcome {
            changed: true,
            ..InteractionOutcome::default()
        };

        let descendants: Vec<NodeId> = self.hierarchy.all_descendants(&parent).to_vec();
        let mut removed_edges: Vec<EdgeId> = vec![];
        for descendant in &descendants {
            removed_edges.extend(self.state.remove_edge_by_node(descendant));
            if self.state.remove_node(descendant) {
                outcome.nodes_removed.push(descendant.clone());
            }
        }

        match self.state.add_node(parent_group.as_deref(), parent_node) {
            Ok(()) => outcome.nodes_added.push(parent.clone()),
            Err(err) => outcome.fail(err),
        }

        let subtree: HashSet<&NodeId> = descendants.iter().collect();
        let mut new_edges = vec![];
        for edge_id in &removed_edges {
            let edge = match self.dataset.edge(edge_id) {
                Some(edge) => edge,
                None => {
                    warn!(edge = %edge_id, "removed edge is not part of the dataset");
                    continue;
                }
            };
            let mut endpoints = vec![];
            for raw in [&edge.source, &edge.target] {
                let endpoint = if subtree.contains(raw) {
                    Ok(parent.clone())
                } else {
                    self.hierarchy
                        .nearest_visible_ancestor_bounded(raw, &self.state, MAX_ANCESTOR_HOPS)
                };
                match endpoint {
                    Ok(endpoint) => endpoints.push(endpoint),
                    Err(err) => {
                        outcome.fail(err);
                        break;
                    }
                }
            }
            if let [source, target] = &endpoints[..] {
                if self.state.has_edge(&edge.id, source, target)
                    || new_edges
                        .iter()
                        .any(|e: &Edge| &e.id == edge_id && &e.source == source && &e.target == target)
                {
                    continue;
                }
                new_edges.push(Edge::from_data(edge, source.clone(), target.clone()));
            }
        }
        for edge in new_edges {
            outcome.edges_added.push(edge.id.clone());
            self.state.add_edge(edge);
        }

        info!(
            node = %id,
            parent = %parent,
            removed = outcome.nodes_removed.len(),
            edges = outcome.edges_added.len(),
            failures = outcome.failures.len(),
            "collapsed"
        );
        self.state.render()?;
        Ok(outcome)
    }
}
