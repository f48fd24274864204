use serde_json::json;
use tracing::{info, warn};

use super::session::SessionContext;
use crate::config::Settings;
use crate::errors::Result;
use crate::graph_model::{attrs_from_json, DataEdge, DataNode, Dataset, NodeId};
use crate::layout::{
    AppearanceDefaults, Cluster, Edge, GraphRenderer, GraphState, HierarchyIndex, Node,
};

const CLUSTER_STYLE: &str = "rounded, dashed, bold";

/// One loaded scenario: the full dataset, its hierarchy and what is drawn of
/// it right now.
pub struct ScenarioView {
    pub name: String,
    pub dataset: Dataset,
    pub hierarchy: HierarchyIndex,
    pub state: GraphState,
    pub(crate) grouping_key: String,
    pub(crate) coloring_key: String,
}

impl ScenarioView {
    pub fn build(
        name: &str,
        dataset: Dataset,
        hierarchy: HierarchyIndex,
        renderer: Box<dyn GraphRenderer>,
        settings: &Settings,
        ctx: &mut SessionContext,
    ) -> Self {
        let mut state = GraphState::new(renderer);
        state.set_graph_attrs(&settings.scenario_dot.graph);
        state.set_node_attrs(&settings.scenario_dot.node);
        state.set_edge_attrs(&settings.scenario_dot.edge);
        state.set_show_default_tooltip(settings.ui.show_default_tooltip);

        let mut view = ScenarioView {
            name: name.to_string(),
            dataset,
            hierarchy,
            state,
            grouping_key: settings.graph.grouping_variable.clone(),
            coloring_key: settings.graph.node_coloring_attribute.clone(),
        };
        view.populate(settings, ctx);
        view
    }

    /// The cluster a dataset node belongs in.
    pub fn group_of(&self, node: &DataNode) -> Option<String> {
        node.group(&self.grouping_key)
    }

    /// Build the render node for a dataset node.
    pub(crate) fn render_node(&self, data: &DataNode, ctx: &mut SessionContext) -> Node {
        let mut node = Node::new(data.id.clone(), &data.display_name())
            .with_parent(data.is_parent())
            .with_origin(data.is_origin())
            .with_color(ctx.colors.color_for_node(data, &self.coloring_key));
        if let Some(kind) = data.kind() {
            node = node.with_kind(kind);
            if let Some(svg) = ctx.symbols.get(kind) {
                node = node.with_symbol(svg);
            }
        }
        node
    }

    /// Throw away what is drawn and rebuild it according to
    /// `ctx.show_all_nodes`: either every leaf is drawn, or every node that
    /// nobody includes.
    pub fn populate(&mut self, settings: &Settings, ctx: &mut SessionContext) {
        self.state.reset_clusters();
        self.state.reset_edges();

        let show_all = ctx.show_all_nodes;
        for group in self.dataset.unique_groups(&self.grouping_key) {
            let mut cluster = Cluster::new(group.clone(), AppearanceDefaults::from_settings(&settings.graph));
            cluster.set_node_attrs(&attrs_from_json(json!({ "imagescale": true })));
            let color = ctx
                .colors
                .color_for_key(group.as_deref().unwrap_or(super::colors::DEFAULT_COLOR_KEY));
            cluster.set_cluster_attrs(&attrs_from_json(json!({
                "color": color,
                "style": CLUSTER_STYLE,
            })));

            let members: Vec<Node> = self
                .dataset
                .nodes()
                .iter()
                .filter(|n| self.group_of(n) == group)
                .filter(|n| {
                    if show_all {
                        !n.is_parent()
                    } else {
                        !self.hierarchy.is_child(&n.id)
                    }
                })
                .map(|n| self.render_node(n, ctx))
                .collect();
            cluster.set_nodes(members);
            self.state.set_cluster(cluster);
        }

        let mut edges = vec![];
        for edge in self.dataset.relation_edges() {
            let (source, target) = if show_all {
                (edge.source.clone(), edge.target.clone())
            } else {
                (self.root_or_self(&edge.source), self.root_or_self(&edge.target))
            };
            match self.resolve_endpoints(edge, source, target) {
                Some((source, target)) => edges.push(Edge::from_data(edge, source, target)),
                None => warn!(
                    edge = %edge.id,
                    source = %edge.source,
                    target = %edge.target,
                    "skipping edge without a visible endpoint"
                ),
            }
        }
        self.state.set_edges(edges);

        info!(
            scenario = %self.name,
            show_all,
            nodes = self.state.node_ids().len(),
            edges = self.state.edges().len(),
            "populated scenario view"
        );
    }

    fn root_or_self(&self, id: &NodeId) -> NodeId {
        self.hierarchy.root_of(id).unwrap_or(id).clone()
    }

    /// Keep endpoints that are drawn; fall back to the nearest drawn ancestor
    /// for the rest.
    fn resolve_endpoints(&self, edge: &DataEdge, source: NodeId, target: NodeId) -> Option<(NodeId, NodeId)> {
        let source = if self.state.has_node(&source) {
            source
        } else {
            self.hierarchy.nearest_visible_ancestor(&edge.source, &self.state)?
        };
        let target = if self.state.has_node(&target) {
            target
        } else {
            self.hierarchy.nearest_visible_ancestor(&edge.target, &self.state)?
        };
        Some((source, target))
    }

    pub fn render(&mut self) -> Result<()> {
        self.state.render()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use serde_json::{json, Value};

    use super::ScenarioView;
    use crate::config::Settings;
    use crate::graph_model::{Dataset, NodeId, RawRelationship};
    use crate::layout::{HierarchyIndex, RecordingRenderer, RenderLog};
    use crate::viewer::SessionContext;

    fn node(id: u64, labels: &[&str], props: Value) -> Value {
        json!({ "identity": id, "labels": labels, "props": props })
    }

    fn rel(id: u64, relation: &str, props: Value, source: &Value, target: &Value) -> Value {
        json!({
            "identity": id,
            "labels": relation,
            "props": props,
            "source": source,
            "target": target,
        })
    }

    pub fn ids(ids: &[&str]) -> Vec<NodeId> {
        ids.iter().map(|id| NodeId::from(*id)).collect()
    }

    /// Two clinics: "KA" holds the hospital stay (1) made of admission (2) and
    /// surgery (3); "SV" holds the GP (4, origin) and rehab (5).
    pub fn clinic() -> (Dataset, HierarchyIndex) {
        let stay = node(1, &["process", "parent"], json!({ "name": "Hospital stay", "institution": "KA", "details": "inpatient care" }));
        let admission = node(2, &["ward"], json!({ "name": "Admission", "nameShort": "Adm", "institution": "KA", "details": "triage desk" }));
        let surgery = node(3, &["ward"], json!({ "name": "Surgery", "institution": "KA" }));
        let gp = node(4, &["doctor", "origin"], json!({ "name": "GP", "institution": "SV" }));
        let rehab = node(5, &["doctor"], json!({ "name": "Rehab", "institution": "SV" }));

        let records = json!([
            rel(100, "includes", json!({}), &stay, &admission),
            rel(101, "includes", json!({}), &stay, &surgery),
            rel(7, "transfers", json!({ "name": "referral", "content": ["lab results"] }), &gp, &admission),
            rel(12, "conditional", json!({ "name": "noname", "content": ["x-ray"] }), &gp, &surgery),
            rel(20, "transfers", json!({ "name": "discharge letter" }), &surgery, &rehab),
        ]);
        let records: Vec<RawRelationship> = serde_json::from_value(records).unwrap();
        let dataset = Dataset::from_relationships(records, "institution");

        let by_parents: HashMap<NodeId, Vec<NodeId>> = [(NodeId::from("1"), ids(&["2", "3"]))].into_iter().collect();
        let by_children: HashMap<NodeId, NodeId> = [("2", "1"), ("3", "1")]
            .iter()
            .map(|(c, p)| (NodeId::from(*c), NodeId::from(*p)))
            .collect();
        (dataset, HierarchyIndex::build(by_parents, by_children))
    }

    pub fn build_view(
        dataset: Dataset,
        hierarchy: HierarchyIndex,
        show_all: bool,
    ) -> (ScenarioView, SessionContext, Rc<RefCell<RenderLog>>) {
        let settings = Settings::default();
        let mut ctx = SessionContext::from_settings(&settings);
        ctx.show_all_nodes = show_all;
        let renderer = RecordingRenderer::new();
        let log = renderer.log();
        let view = ScenarioView::build("clinic", dataset, hierarchy, Box::new(renderer), &settings, &mut ctx);
        (view, ctx, log)
    }

    pub fn clinic_view(show_all: bool) -> (ScenarioView, SessionContext, Rc<RefCell<RenderLog>>) {
        let (dataset, hierarchy) = clinic();
        build_view(dataset, hierarchy, show_all)
    }

    /// Drawn node ids, sorted.
    pub fn visible(view: &ScenarioView) -> Vec<String> {
        let mut ids: Vec<String> = view.state.node_ids().iter().map(|id| id.to_string()).collect();
        ids.sort();
        ids
    }

    /// Drawn edges as "id:source->target", sorted.
    pub fn edges(view: &ScenarioView) -> Vec<String> {
        let mut edges: Vec<String> = view
            .state
            .edges()
            .iter()
            .map(|e| format!("{}:{}->{}", e.id, e.source, e.target))
            .collect();
        edges.sort();
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;

    #[test]
    fn collapsed_load_draws_roots_only() {
        let (view, _ctx, log) = clinic_view(false);
        assert_eq!(visible(&view), vec!["1", "4", "5"]);
        assert_eq!(edges(&view), vec!["12:4->1", "20:1->5", "7:4->1"]);
        assert!(view.state.dangling_edges().is_empty());
        // Building doesn't render by itself.
        assert!(log.borrow().renders.is_empty());
    }

    #[test]
    fn expanded_load_draws_leaves_only() {
        let (view, _ctx, _log) = clinic_view(true);
        assert_eq!(visible(&view), vec!["2", "3", "4", "5"]);
        assert_eq!(edges(&view), vec!["12:4->3", "20:3->5", "7:4->2"]);
        assert!(view.state.dangling_edges().is_empty());
    }

    #[test]
    fn clusters_follow_the_grouping_property() {
        let (view, _ctx, _log) = clinic_view(false);
        let names: Vec<Option<&str>> = view.state.clusters().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec![Some("KA"), Some("SV")]);
        assert_eq!(
            view.state.cluster_of(&"4".into()).and_then(|c| c.name()),
            Some("SV")
        );
    }

    #[test]
    fn collapsed_dot_merges_rerouted_edges() {
        let (view, _ctx, _log) = clinic_view(false);
        let dot = view.state.serialize();
        assert!(dot.contains("4 -> 1 [id=\"7,12\""), "{}", dot);
        assert!(dot.contains("1 -> 5 [id=\"20\""), "{}", dot);
        assert!(dot.contains("{rank=source; 4}"), "{}", dot);
        assert!(dot.contains("1 [class=\"parent\""), "{}", dot);
        assert_eq!(dot, view.state.serialize());
    }
}
