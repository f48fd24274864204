use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use tracing::trace;

use super::cluster::{Cluster, Node};
use super::dot_writer::{attr_pairs, format_attr_pairs, unique_cluster_name, DotWriter};
use super::hierarchy::VisibleSet;
use super::renderer::{GraphRenderer, TransitionConfig, RESET_ZOOM_DURATION_MS};
use crate::errors::{missing_cluster, missing_lookup, Result};
use crate::graph_model::{merge_attrs, Attrs, DataEdge, EdgeId, NodeId, CONDITIONAL_RELATION};

/// Size images are registered with; matches the symbol box used for fixed
/// size default shapes.
const IMAGE_WIDTH: &str = "250px";
const IMAGE_HEIGHT: &str = "200px";

/// A rendered edge.  `source` and `target` are the visible endpoints, which
/// may differ from the endpoints of the underlying relationship.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Option<String>,
    pub attrs: Attrs,
}

impl Edge {
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Edge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            relation: None,
            attrs: Attrs::new(),
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    /// Render `edge` between the given (already resolved) endpoints.
    pub fn from_data(edge: &DataEdge, source: NodeId, target: NodeId) -> Self {
        Edge {
            id: edge.id.clone(),
            source,
            target,
            relation: Some(edge.relation.clone()),
            attrs: Attrs::new(),
        }
    }

    pub fn is_conditional(&self) -> bool {
        self.relation.as_deref() == Some(CONDITIONAL_RELATION)
    }
}

/// Edges sharing the same ordered (source, target) pair.  They are drawn as a
/// single edge whose id lists every member.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeGroup {
    pub source: NodeId,
    pub target: NodeId,
    pub ids: Vec<EdgeId>,
    lead: usize,
}

impl EdgeGroup {
    /// The id attribute of the drawn edge, e.g. "7,12".
    pub fn rendered_id(&self) -> String {
        self.ids
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<&str>>()
            .join(",")
    }
}

/// Everything that is currently drawn, plus the renderer it is drawn with.
pub struct GraphState {
    clusters: Vec<Cluster>,
    edges: Vec<Edge>,
    graph_attrs: Attrs,
    node_attrs: Attrs,
    edge_attrs: Attrs,
    node_ids: HashSet<NodeId>,
    parent_ids: HashSet<NodeId>,
    saved_images: HashSet<String>,
    show_default_tooltip: bool,
    transition: TransitionConfig,
    renderer: Box<dyn GraphRenderer>,
}

impl GraphState {
    pub fn new(renderer: Box<dyn GraphRenderer>) -> Self {
        GraphState {
            clusters: vec![],
            edges: vec![],
            graph_attrs: Attrs::new(),
            node_attrs: Attrs::new(),
            edge_attrs: Attrs::new(),
            node_ids: HashSet::new(),
            parent_ids: HashSet::new(),
            saved_images: HashSet::new(),
            show_default_tooltip: true,
            transition: TransitionConfig::default(),
            renderer,
        }
    }

    /// When off, every node and edge gets a blank tooltip so the renderer
    /// doesn't show its built-in one.
    pub fn set_show_default_tooltip(&mut self, show: bool) {
        self.show_default_tooltip = show;
    }

    pub fn set_transition(&mut self, transition: TransitionConfig) {
        self.transition = transition;
    }

    pub fn set_graph_attrs(&mut self, attrs: &Attrs) {
        merge_attrs(&mut self.graph_attrs, attrs);
    }

    pub fn set_node_attrs(&mut self, attrs: &Attrs) {
        merge_attrs(&mut self.node_attrs, attrs);
    }

    pub fn set_edge_attrs(&mut self, attrs: &Attrs) {
        merge_attrs(&mut self.edge_attrs, attrs);
    }

    fn register_image(&mut self, image: Option<String>) {
        if let Some(image) = image {
            if !self.saved_images.contains(&image) {
                self.renderer.add_image(&image, IMAGE_WIDTH, IMAGE_HEIGHT);
                self.saved_images.insert(image);
            }
        }
    }

    fn index_node(&mut self, id: NodeId, is_parent: bool) {
        if is_parent {
            self.parent_ids.insert(id.clone());
        }
        self.node_ids.insert(id);
    }

    pub fn set_cluster(&mut self, cluster: Cluster) {
        let members: Vec<(NodeId, bool, Option<String>)> = cluster
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), n.is_parent, n.image().map(|s| s.to_string())))
            .collect();
        for (id, is_parent, image) in members {
            self.register_image(image);
            self.index_node(id, is_parent);
        }
        self.clusters.push(cluster);
    }

    /// Add `node` to the cluster called `cluster_name` (`None` addresses the
    /// unnamed cluster).  A node that is already visible is moved.
    pub fn add_node(&mut self, cluster_name: Option<&str>, node: Node) -> Result<()> {
        let ix = match self.clusters.iter().position(|c| c.name() == cluster_name) {
            Some(ix) => ix,
            None => {
                return Err(missing_cluster(format!(
                    "no cluster {:?} to add node {} to",
                    cluster_name, node.id
                )))
            }
        };
        if self.node_ids.contains(&node.id) {
            self.remove_node(&node.id);
        }

        let added = self.clusters[ix].add_node(node);
        let (id, is_parent, image) = (
            added.id.clone(),
            added.is_parent,
            added.image().map(|s| s.to_string()),
        );
        self.register_image(image);
        self.index_node(id, is_parent);
        Ok(())
    }

    /// Remove the node from every cluster and both indices.  Returns whether
    /// it was present at all.  Incident edges are left alone; see
    /// `remove_edge_by_node`.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let mut removed = false;
        for cluster in self.clusters.iter_mut() {
            removed |= cluster.remove_node(id);
        }
        removed |= self.node_ids.remove(id);
        self.parent_ids.remove(id);
        removed
    }

    /// Remove every edge that starts or ends at `id`, returning their ids in
    /// the order they were drawn.
    pub fn remove_edge_by_node(&mut self, id: &NodeId) -> Vec<EdgeId> {
        let mut removed = vec![];
        self.edges.retain(|e| {
            if &e.source == id || &e.target == id {
                removed.push(e.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges = edges;
    }

    pub fn reset_edges(&mut self) {
        self.edges.clear();
    }

    pub fn reset_clusters(&mut self) {
        self.clusters.clear();
        self.node_ids.clear();
        self.parent_ids.clear();
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.node_ids.contains(id)
    }

    pub fn has_edge(&self, id: &EdgeId, source: &NodeId, target: &NodeId) -> bool {
        self.edges
            .iter()
            .any(|e| &e.id == id && &e.source == source && &e.target == target)
    }

    pub fn node_ids(&self) -> &HashSet<NodeId> {
        &self.node_ids
    }

    pub fn parent_ids(&self) -> &HashSet<NodeId> {
        &self.parent_ids
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, name: Option<&str>) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.name() == name)
    }

    pub fn cluster_of(&self, id: &NodeId) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.has_node(id))
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.clusters.iter().find_map(|c| c.node(id))
    }

    /// Visible nodes in drawing order.
    pub fn visible_nodes(&self) -> impl Iterator<Item = &Node> {
        self.clusters.iter().flat_map(|c| c.nodes().iter())
    }

    /// Edges with an endpoint that is not drawn.  Empty whenever the state is
    /// consistent.
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| !self.has_node(&e.source) || !self.has_node(&e.target))
            .collect()
    }

    /// Group edges by ordered (source, target), in order of first appearance.
    pub fn edge_groups(&self) -> Vec<EdgeGroup> {
        let mut groups: Vec<EdgeGroup> = vec![];
        let mut by_endpoints: HashMap<(&NodeId, &NodeId), usize> = HashMap::new();
        for (ix, edge) in self.edges.iter().enumerate() {
            match by_endpoints.get(&(&edge.source, &edge.target)) {
                Some(group_ix) => groups[*group_ix].ids.push(edge.id.clone()),
                None => {
                    by_endpoints.insert((&edge.source, &edge.target), groups.len());
                    groups.push(EdgeGroup {
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        ids: vec![edge.id.clone()],
                        lead: ix,
                    });
                }
            }
        }
        groups
    }

    /// Swap the color and symbol of a visible node and re-render.
    pub fn change_appearance(
        &mut self,
        id: &NodeId,
        color: Option<String>,
        symbol: Option<String>,
    ) -> Result<Option<String>> {
        let cluster = match self.clusters.iter_mut().find(|c| c.has_node(id)) {
            Some(cluster) => cluster,
            None => {
                return Err(missing_lookup(format!(
                    "cannot change appearance of node {}, it is not drawn",
                    id
                )))
            }
        };
        let image = cluster.change_appearance(id, color, symbol);
        self.register_image(image.clone());
        self.render()?;
        Ok(image)
    }

    fn tooltip_pair<'a>(&self) -> Option<(&'a str, Cow<'a, str>)> {
        if self.show_default_tooltip {
            None
        } else {
            Some(("tooltip", Cow::Borrowed(" ")))
        }
    }

    fn write_node(&self, writer: &mut DotWriter, node: &Node) {
        let class = if self.parent_ids.contains(&node.id) {
            Some(("class", Cow::Borrowed("parent")))
        } else {
            None
        };
        let pairs = class
            .into_iter()
            .chain(attr_pairs(&node.attrs))
            .chain(self.tooltip_pair());
        writer.node_stmt(node.id.as_str(), format_attr_pairs(pairs));
    }

    /// Produce the DOT description of the current state.  The same state
    /// always produces the same text.
    pub fn serialize(&self) -> String {
        let mut writer = DotWriter::new();
        writer.attr_block("graph", &self.graph_attrs);
        writer.attr_block("node", &self.node_attrs);
        writer.attr_block("edge", &self.edge_attrs);

        let mut used_names = HashSet::new();
        let mut origins = vec![];
        for cluster in &self.clusters {
            match cluster.name() {
                Some(name) => {
                    writer.begin_cluster(&unique_cluster_name(name, &mut used_names));
                    for (key, value) in cluster.cluster_attrs() {
                        writer.attr_stmt(key, value);
                    }
                    writer.attr_block("node", cluster.node_attrs());
                    for node in cluster.nodes() {
                        self.write_node(&mut writer, node);
                    }
                    writer.end_block();
                }
                None => {
                    for node in cluster.nodes() {
                        self.write_node(&mut writer, node);
                    }
                }
            }
            origins.extend(cluster.nodes().iter().filter(|n| n.is_origin).map(|n| &n.id));
        }

        for group in self.edge_groups() {
            let lead = &self.edges[group.lead];
            let rendered_id = group.rendered_id();
            let dashed = if lead.is_conditional() {
                Some(("style", Cow::Borrowed("dashed")))
            } else {
                None
            };
            let pairs = std::iter::once(("id", Cow::Borrowed(rendered_id.as_str())))
                .chain(dashed)
                .chain(attr_pairs(&lead.attrs))
                .chain(self.tooltip_pair());
            writer.edge_stmt(group.source.as_str(), group.target.as_str(), format_attr_pairs(pairs));
        }

        for origin in origins {
            writer.rank_source(origin.as_str());
        }

        let dot = writer.finish();
        trace!(
            bytes = dot.len(),
            nodes = self.node_ids.len(),
            edges = self.edges.len(),
            "serialized graph state"
        );
        dot
    }

    pub fn render(&mut self) -> Result<()> {
        let dot = self.serialize();
        self.renderer.render_dot(&dot, &self.transition)
    }

    pub fn reset_zoom(&mut self) {
        self.renderer.reset_zoom(RESET_ZOOM_DURATION_MS);
    }

    /// Drop everything that is drawn, tear the renderer down and hand it back
    /// so it can be reused by the next view.
    pub fn destruct(mut self) -> Box<dyn GraphRenderer> {
        self.reset_edges();
        self.reset_clusters();
        self.graph_attrs.clear();
        self.node_attrs.clear();
        self.edge_attrs.clear();
        self.saved_images.clear();
        self.renderer.destroy();
        self.renderer
    }
}

impl VisibleSet for GraphState {
    fn contains_node(&self, id: &NodeId) -> bool {
        self.has_node(id)
    }
}
