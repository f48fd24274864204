use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use scenario_graph::config::Settings;
use scenario_graph::data_source::make_local_source;
use scenario_graph::errors::ViewerError;
use scenario_graph::graph_model::NodeId;
use scenario_graph::layout::{RecordingRenderer, RenderLog};
use scenario_graph::logging::init_logging;
use scenario_graph::viewer::ViewerSession;

const SCENARIO: &str = "Hip fracture";

fn fixture_dir() -> String {
    format!("{}/tests/fixtures/clinic", env!("CARGO_MANIFEST_DIR"))
}

fn session_with(settings: Settings) -> (ViewerSession, Rc<RefCell<RenderLog>>) {
    init_logging();
    let source = make_local_source(&fixture_dir()).unwrap();
    let renderer = RecordingRenderer::new();
    let log = renderer.log();
    (ViewerSession::new(settings, source, Box::new(renderer)), log)
}

fn collapsed_session() -> (ViewerSession, Rc<RefCell<RenderLog>>) {
    let mut settings = Settings::default();
    settings.graph.show_nodes = false;
    session_with(settings)
}

fn visible(session: &ViewerSession) -> Vec<String> {
    let view = session.scenario_view().unwrap();
    let mut ids: Vec<String> = view.state.node_ids().iter().map(|id| id.to_string()).collect();
    ids.sort();
    ids
}

fn assert_valid_dot(dot: &str) {
    if let Err(err) = graphviz_rust::parse(dot) {
        panic!("invalid DOT ({}):\n{}", err, dot);
    }
}

#[tokio::test]
async fn overview_is_a_star_of_scenarios() {
    let (mut session, log) = session_with(Settings::default());
    session.open_overview().await.unwrap();

    let dot = session.current_dot().unwrap();
    assert_valid_dot(&dot);
    assert!(dot.contains(r#"layout="neato""#), "{}", dot);
    assert!(dot.contains(r#"0 -> "Hip fracture" [id="0"]"#), "{}", dot);
    assert!(dot.contains(r#"0 -> Checkup [id="1"]"#), "{}", dot);
    assert!(!dot.contains("subgraph"), "{}", dot);

    let overview = session.overview().unwrap();
    assert_eq!(overview.scenarios, vec!["Hip fracture", "Checkup"]);
    assert_eq!(
        session.scenario_for_overview_node(&NodeId::from("Checkup")),
        Some("Checkup")
    );
    assert_eq!(session.scenario_for_overview_node(&NodeId::from("0")), None);

    let log = log.borrow();
    assert_eq!(log.renders.len(), 1);
    // Only the center node has a symbol.
    assert_eq!(log.images.len(), 1);
}

#[tokio::test]
async fn collapsed_scenario_draws_aggregates() {
    let (mut session, log) = collapsed_session();
    session.open_scenario(SCENARIO).await.unwrap();

    assert_eq!(visible(&session), vec!["1", "4", "5"]);
    let dot = session.current_dot().unwrap();
    assert_valid_dot(&dot);
    assert!(dot.contains("subgraph cluster_KA {"), "{}", dot);
    assert!(dot.contains("subgraph cluster_SV {"), "{}", dot);
    assert!(dot.contains(r#"4 -> 1 [id="7,12"]"#), "{}", dot);
    assert!(dot.contains(r#"1 -> 5 [id="20"]"#), "{}", dot);
    assert!(dot.contains("{rank=source; 4}"), "{}", dot);
    // There is no symbol for "process", so the aggregate falls back to the
    // default shape.
    assert!(dot.contains(r#"shape="ribosite""#), "{}", dot);

    let log = log.borrow();
    assert_eq!(log.renders.len(), 1);
    assert_eq!(log.last_render(), Some(dot.as_str()));
    assert_eq!(log.images.len(), 2);
    assert!(log
        .images
        .iter()
        .all(|(uri, w, h)| uri.starts_with("data:image/svg+xml;base64,") && w == "250px" && h == "200px"));
}

#[tokio::test]
async fn expand_collapse_round_trip_restores_the_drawing() {
    let (mut session, log) = collapsed_session();
    session.open_scenario(SCENARIO).await.unwrap();
    let before = session.current_dot().unwrap();

    let expanded = session.expand(&"1".into()).unwrap();
    assert_eq!(expanded.nodes_added, vec![NodeId::from("2"), NodeId::from("3")]);
    assert_eq!(visible(&session), vec!["2", "3", "4", "5"]);
    let dot = session.current_dot().unwrap();
    assert_valid_dot(&dot);
    assert!(dot.contains(r#"4 -> 2 [id="7"]"#), "{}", dot);
    assert!(dot.contains(r#"4 -> 3 [id="12", style="dashed"]"#), "{}", dot);
    assert!(dot.contains(r#"3 -> 5 [id="20"]"#), "{}", dot);

    let collapsed = session.collapse(&"2".into()).unwrap();
    assert!(collapsed.failures.is_empty());
    assert_eq!(session.current_dot().unwrap(), before);
    assert!(session.scenario_view().unwrap().state.dangling_edges().is_empty());
    assert_eq!(log.borrow().renders.len(), 3);
}

#[tokio::test]
async fn toggle_show_all_redraws_everything() {
    let (mut session, log) = collapsed_session();
    session.open_scenario(SCENARIO).await.unwrap();

    assert!(session.toggle_show_all().unwrap());
    assert_eq!(visible(&session), vec!["2", "3", "4", "5"]);
    assert!(!session.toggle_show_all().unwrap());
    assert_eq!(visible(&session), vec!["1", "4", "5"]);
    assert_eq!(log.borrow().renders.len(), 3);
}

#[tokio::test]
async fn failed_load_keeps_the_current_view() {
    let (mut session, log) = collapsed_session();
    session.open_scenario(SCENARIO).await.unwrap();

    let err = session.open_scenario("No such scenario").await.unwrap_err();
    assert!(matches!(err, ViewerError::StickyProblem(_)), "{}", err);
    assert_eq!(session.scenario_view().unwrap().name, SCENARIO);
    assert_eq!(log.borrow().destroyed, 0);
}

#[tokio::test]
async fn interactions_need_a_scenario() {
    let (mut session, _log) = session_with(Settings::default());
    let err = session.expand(&"1".into()).unwrap_err();
    assert!(matches!(err, ViewerError::MissingLookup(_)), "{}", err);

    session.open_overview().await.unwrap();
    assert!(session.legend().is_err());
    assert!(session.toggle_show_all().is_err());
}

#[tokio::test]
async fn colors_only_survive_reset_when_consistent() {
    let sv_color = |session: &ViewerSession| {
        session
            .scenario_view()
            .unwrap()
            .state
            .cluster(Some("SV"))
            .and_then(|c| c.cluster_attrs().get("color").cloned())
    };

    // Without configured group colors everything comes from the palette.
    let mut settings = Settings::default();
    settings.group_colors.clear();

    let (mut session, log) = session_with(settings.clone());
    session.open_scenario(SCENARIO).await.unwrap();
    assert_eq!(sv_color(&session), Some(json!("#ffffb3")));
    session.open_scenario("Checkup").await.unwrap();
    assert_eq!(sv_color(&session), Some(json!("#8dd3c7")));
    assert_eq!(log.borrow().destroyed, 1);

    settings.graph.color_consistency = true;
    let (mut session, _log) = session_with(settings);
    session.open_scenario(SCENARIO).await.unwrap();
    session.open_scenario("Checkup").await.unwrap();
    assert_eq!(sv_color(&session), Some(json!("#ffffb3")));
}

#[tokio::test]
async fn legend_lists_drawn_kinds_and_groups() {
    let (mut session, _log) = collapsed_session();
    session.open_scenario(SCENARIO).await.unwrap();

    let legend = session.legend().unwrap();
    let kinds: Vec<&str> = legend.symbols.iter().map(|s| s.kind.as_str()).collect();
    assert_eq!(kinds, vec!["process", "doctor"]);
    assert!(legend.symbols[1].url.starts_with("file://"));
    assert!(legend.symbols[1].url.ends_with("/symbol/doctor.svg"));

    insta::assert_json_snapshot!(legend.colors, @r###"
    [
      {
        "label": "KA",
        "color": "#fdb462"
      },
      {
        "label": "SV",
        "color": "#b3de69"
      },
      {
        "label": "origin",
        "color": "#bc80bd"
      }
    ]
    "###);
}

#[tokio::test]
async fn filters_and_details_through_the_session() {
    let (mut session, _log) = collapsed_session();
    session.open_scenario(SCENARIO).await.unwrap();

    let highlight = session.filter_edges_by_content("x-ray").unwrap().unwrap();
    assert_eq!(highlight.edges, vec!["7,12"]);
    assert_eq!(session.filter_edges_by_content("").unwrap(), None);
    assert_eq!(
        session.filter_nodes_by_details("triage").unwrap(),
        Some(vec![NodeId::from("1")])
    );

    let details = session.node_details(&"1".into()).unwrap().unwrap();
    assert_eq!(details.entries.len(), 2);
    let edges = session.edge_details("7,12").unwrap();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[1].relation, "conditional");
}
