use serde_json::json;
use tracing::{debug, info};

use super::colors::ColorAssigner;
use super::inspect::{EdgeDetails, Highlight, Legend, NodeDetails};
use super::interaction::InteractionOutcome;
use super::scenario_view::ScenarioView;
use super::symbols::SymbolCache;
use crate::config::Settings;
use crate::data_source::DataSource;
use crate::errors::{missing_lookup, ErrorDetails, ErrorLayer, Result, ViewerError};
use crate::graph_model::{attrs_from_json, Dataset, NodeId, ORIGIN_LABEL};
use crate::layout::{AppearanceDefaults, Cluster, Edge, GraphRenderer, GraphState, HierarchyIndex, Node};

/// Id of the node in the middle of the overview.
pub const OVERVIEW_CENTER_ID: &str = "0";
const OVERVIEW_CENTER_KIND: &str = "person";
const OVERVIEW_CENTER_COLOR: &str = "#AAAAAA";
const OVERVIEW_CLUSTER_COLOR: &str = "#262626";

/// State that outlives a single view: color assignments, fetched symbols and
/// the "show all nodes" toggle.
#[derive(Debug)]
pub struct SessionContext {
    pub colors: ColorAssigner,
    pub symbols: SymbolCache,
    pub show_all_nodes: bool,
}

impl SessionContext {
    pub fn from_settings(settings: &Settings) -> Self {
        SessionContext {
            colors: ColorAssigner::from_settings(settings),
            symbols: SymbolCache::new(),
            show_all_nodes: settings.graph.show_nodes,
        }
    }
}

/// The scenario list, drawn as a star around a center node.
pub struct OverviewView {
    pub scenarios: Vec<String>,
    pub state: GraphState,
}

pub enum ActiveView {
    Overview(OverviewView),
    Scenario(ScenarioView),
}

impl ActiveView {
    fn state(&self) -> &GraphState {
        match self {
            ActiveView::Overview(overview) => &overview.state,
            ActiveView::Scenario(scenario) => &scenario.state,
        }
    }

    fn state_mut(&mut self) -> &mut GraphState {
        match self {
            ActiveView::Overview(overview) => &mut overview.state,
            ActiveView::Scenario(scenario) => &mut scenario.state,
        }
    }

    fn destruct(self) -> Box<dyn GraphRenderer> {
        match self {
            ActiveView::Overview(overview) => overview.state.destruct(),
            ActiveView::Scenario(scenario) => scenario.state.destruct(),
        }
    }
}

/// One viewer: a data source, a renderer and whichever view is showing.  At
/// most one view exists at a time; switching views resets the session first.
pub struct ViewerSession {
    settings: Settings,
    source: Box<dyn DataSource + Send + Sync>,
    context: SessionContext,
    view: Option<ActiveView>,
    /// Parked here while no view owns it.
    renderer: Option<Box<dyn GraphRenderer>>,
}

impl ViewerSession {
    pub fn new(
        settings: Settings,
        source: Box<dyn DataSource + Send + Sync>,
        renderer: Box<dyn GraphRenderer>,
    ) -> Self {
        let context = SessionContext::from_settings(&settings);
        ViewerSession {
            settings,
            source,
            context,
            view: None,
            renderer: Some(renderer),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn source(&self) -> &(dyn DataSource + Send + Sync) {
        self.source.as_ref()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Tear down the current view and hand the renderer back to the session.
    /// Color assignments survive only with `graph.color_consistency`.
    pub fn reset(&mut self) {
        if let Some(view) = self.view.take() {
            self.renderer = Some(view.destruct());
        }
        let mut context = SessionContext::from_settings(&self.settings);
        if self.settings.graph.color_consistency {
            context.colors = self.context.colors.clone();
        }
        self.context = context;
        debug!("session reset");
    }

    fn take_renderer(&mut self) -> Result<Box<dyn GraphRenderer>> {
        self.renderer.take().ok_or_else(|| {
            ViewerError::StickyProblem(ErrorDetails {
                layer: ErrorLayer::StateLayer,
                message: "renderer is still owned by a view".to_string(),
            })
        })
    }

    pub async fn open_overview(&mut self) -> Result<()> {
        let scenarios = self.source.scenario_names().await?;
        self.reset();
        self.context
            .symbols
            .ensure(&[OVERVIEW_CENTER_KIND.to_string()], self.source.as_ref())
            .await;

        let mut state = GraphState::new(self.take_renderer()?);
        state.set_graph_attrs(&self.settings.overview_dot.graph);
        state.set_node_attrs(&self.settings.overview_dot.node);
        state.set_edge_attrs(&self.settings.overview_dot.edge);
        state.set_show_default_tooltip(self.settings.ui.show_default_tooltip);

        let mut center = Node::new(OVERVIEW_CENTER_ID, "")
            .with_kind(OVERVIEW_CENTER_KIND)
            .with_color(OVERVIEW_CENTER_COLOR)
            .with_attr("shape", json!("circle"))
            .with_attr("id", json!("center"));
        if let Some(svg) = self.context.symbols.get(OVERVIEW_CENTER_KIND) {
            center = center.with_symbol(svg);
        }
        let origin_color = self.context.colors.color_for_key(ORIGIN_LABEL);
        let mut nodes = vec![center];
        let mut edges = vec![];
        for (index, scenario) in scenarios.iter().enumerate() {
            nodes.push(
                Node::new(scenario.as_str(), scenario)
                    .with_kind(ORIGIN_LABEL)
                    .with_color(origin_color.as_str())
                    .with_attr("shape", json!("circle")),
            );
            // Names may contain commas, which would read as a merged id list.
            edges.push(Edge::new(index.to_string(), OVERVIEW_CENTER_ID, scenario.as_str()));
        }

        let mut cluster = Cluster::new(None, AppearanceDefaults::from_settings(&self.settings.graph));
        cluster.set_cluster_attrs(&attrs_from_json(json!({ "color": OVERVIEW_CLUSTER_COLOR })));
        cluster.set_nodes(nodes);
        state.set_edges(edges);
        state.set_cluster(cluster);

        info!(scenarios = scenarios.len(), "opened overview");
        let view = self.view.insert(ActiveView::Overview(OverviewView { scenarios, state }));
        view.state_mut().render()
    }

    /// The scenario behind a click on an overview node.
    pub fn scenario_for_overview_node(&self, id: &NodeId) -> Option<&str> {
        match &self.view {
            Some(ActiveView::Overview(overview)) => overview
                .scenarios
                .iter()
                .find(|s| s.as_str() == id.as_str())
                .map(|s| s.as_str()),
            _ => None,
        }
    }

    /// Load and draw a scenario.  Everything is fetched before the current
    /// view is torn down, so a failed fetch leaves the session as it was.
    pub async fn open_scenario(&mut self, name: &str) -> Result<()> {
        let relationships = self.source.scenario_relationships(name).await?;
        let by_parents = self.source.hierarchy_by_parents(name).await?;
        let by_children = self.source.hierarchy_by_children(name).await?;

        self.reset();
        let dataset = Dataset::from_relationships(relationships, &self.settings.graph.grouping_variable);
        let hierarchy = HierarchyIndex::build(by_parents, by_children);
        self.context
            .symbols
            .ensure(&dataset.kinds(), self.source.as_ref())
            .await;

        let renderer = self.take_renderer()?;
        let mut view = ScenarioView::build(
            name,
            dataset,
            hierarchy,
            renderer,
            &self.settings,
            &mut self.context,
        );
        info!(
            scenario = name,
            nodes = view.dataset.nodes().len(),
            edges = view.dataset.edges().len(),
            "opened scenario"
        );
        let rendered = view.render();
        self.view = Some(ActiveView::Scenario(view));
        rendered
    }

    pub fn overview(&self) -> Option<&OverviewView> {
        match &self.view {
            Some(ActiveView::Overview(overview)) => Some(overview),
            _ => None,
        }
    }

    pub fn scenario_view(&self) -> Option<&ScenarioView> {
        match &self.view {
            Some(ActiveView::Scenario(scenario)) => Some(scenario),
            _ => None,
        }
    }

    fn require_scenario(&self) -> Result<&ScenarioView> {
        self.scenario_view()
            .ok_or_else(|| missing_lookup("no scenario is open".to_string()))
    }

    fn require_scenario_mut(&mut self) -> Result<(&mut ScenarioView, &mut SessionContext)> {
        match &mut self.view {
            Some(ActiveView::Scenario(scenario)) => Ok((scenario, &mut self.context)),
            _ => Err(missing_lookup("no scenario is open".to_string())),
        }
    }

    pub fn expand(&mut self, id: &NodeId) -> Result<InteractionOutcome> {
        let (view, ctx) = self.require_scenario_mut()?;
        view.expand(id, ctx)
    }

    pub fn collapse(&mut self, id: &NodeId) -> Result<InteractionOutcome> {
        let (view, ctx) = self.require_scenario_mut()?;
        view.collapse(id, ctx)
    }

    /// Flip between the fully collapsed and the fully expanded drawing.
    pub fn toggle_show_all(&mut self) -> Result<bool> {
        let settings = &self.settings;
        let (view, ctx) = match &mut self.view {
            Some(ActiveView::Scenario(scenario)) => (scenario, &mut self.context),
            _ => return Err(missing_lookup("no scenario is open".to_string())),
        };
        ctx.show_all_nodes = !ctx.show_all_nodes;
        view.populate(settings, ctx);
        view.render()?;
        Ok(ctx.show_all_nodes)
    }

    /// Recolor a drawn node and/or give it the symbol of another kind.
    pub async fn change_appearance(
        &mut self,
        id: &NodeId,
        color: Option<String>,
        kind: Option<String>,
    ) -> Result<Option<String>> {
        let symbol = match kind {
            Some(kind) => {
                self.context
                    .symbols
                    .ensure(&[kind.clone()], self.source.as_ref())
                    .await;
                self.context.symbols.get(&kind).map(|s| s.to_string())
            }
            None => None,
        };
        match &mut self.view {
            Some(view) => view.state_mut().change_appearance(id, color, symbol),
            None => Err(missing_lookup("nothing is drawn".to_string())),
        }
    }

    pub fn reset_zoom(&mut self) {
        if let Some(view) = &mut self.view {
            view.state_mut().reset_zoom();
        }
    }

    /// The DOT text of whatever is drawn.
    pub fn current_dot(&self) -> Option<String> {
        self.view.as_ref().map(|view| view.state().serialize())
    }

    pub fn legend(&self) -> Result<Legend> {
        let view = self.require_scenario()?;
        Ok(view.legend(&self.context.colors, self.source.as_ref()))
    }

    pub fn filter_edges_by_content(&self, needle: &str) -> Result<Option<Highlight>> {
        Ok(self.require_scenario()?.filter_edges_by_content(needle))
    }

    pub fn filter_nodes_by_details(&self, needle: &str) -> Result<Option<Vec<NodeId>>> {
        Ok(self.require_scenario()?.filter_nodes_by_details(needle))
    }

    pub fn node_details(&self, id: &NodeId) -> Result<Option<NodeDetails>> {
        Ok(self.require_scenario()?.node_details(id, &self.settings))
    }

    pub fn edge_details(&self, rendered_id: &str) -> Result<Vec<EdgeDetails>> {
        Ok(self.require_scenario()?.edge_details(rendered_id, &self.settings))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::graph_model::RawRelationship;
    use crate::layout::RecordingRenderer;

    /// Serves scenario names only.
    struct NamesOnly(Vec<&'static str>);

    #[async_trait]
    impl DataSource for NamesOnly {
        async fn scenario_names(&self) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }

        async fn scenario_relationships(&self, _scenario: &str) -> Result<Vec<RawRelationship>> {
            Ok(vec![])
        }

        async fn hierarchy_by_parents(&self, _scenario: &str) -> Result<HashMap<NodeId, Vec<NodeId>>> {
            Ok(HashMap::new())
        }

        async fn hierarchy_by_children(&self, _scenario: &str) -> Result<HashMap<NodeId, NodeId>> {
            Ok(HashMap::new())
        }

        async fn symbol(&self, kind: &str) -> Result<String> {
            Err(missing_lookup(format!("no symbol {}", kind)))
        }

        fn base_url(&self) -> &str {
            "memory:"
        }
    }

    #[tokio::test]
    async fn overview_edges_are_numbered() {
        let source = NamesOnly(vec!["Checkup", "Hip fracture, left"]);
        let mut session = ViewerSession::new(
            Settings::default(),
            Box::new(source),
            Box::new(RecordingRenderer::new()),
        );
        session.open_overview().await.unwrap();

        let overview = session.overview().unwrap();
        let ids: Vec<String> = overview
            .state
            .edge_groups()
            .iter()
            .map(|group| group.rendered_id())
            .collect();
        assert_eq!(ids, vec!["0", "1"]);

        let dot = session.current_dot().unwrap();
        assert!(dot.contains(r#"0 -> "Hip fracture, left" [id="1"]"#), "{}", dot);
        assert_eq!(
            session.scenario_for_overview_node(&NodeId::from("Hip fracture, left")),
            Some("Hip fracture, left")
        );
    }
}
