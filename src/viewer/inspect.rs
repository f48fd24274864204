//! Read-only views over a scenario for a host UI: the legend, the two search
//! filters and the detail records behind node and edge info boxes.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::colors::{ColorAssigner, DEFAULT_COLOR_KEY, FALLBACK_COLOR};
use super::scenario_view::ScenarioView;
use crate::config::Settings;
use crate::data_source::DataSource;
use crate::graph_model::{DataNode, EdgeId, NodeId, WellKnownField, ORIGIN_LABEL};

/// Relationship name that means "no name".
const NO_NAME: &str = "noname";

#[derive(Debug, PartialEq, Serialize)]
pub struct LegendSymbol {
    pub kind: String,
    pub url: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct LegendColor {
    pub label: String,
    pub color: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Legend {
    pub symbols: Vec<LegendSymbol>,
    pub colors: Vec<LegendColor>,
}

/// What a content search lights up: drawn edges by their rendered id and the
/// nodes around them.
#[derive(Debug, PartialEq, Serialize)]
pub struct Highlight {
    pub edges: Vec<String>,
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetailEntry {
    /// An aggregate inside the expanded subtree; only its name is shown.
    Heading { name: String },
    Entry {
        name: String,
        properties: Vec<(String, String)>,
    },
}

#[derive(Debug, PartialEq, Serialize)]
pub struct NodeDetails {
    pub id: NodeId,
    pub open: bool,
    pub entries: Vec<DetailEntry>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct EdgeDetails {
    pub id: EdgeId,
    pub name: String,
    pub relation: String,
    pub relation_color: Option<String>,
    pub source_name: String,
    pub target_name: String,
    pub properties: Vec<(String, String)>,
    pub open: bool,
}

fn node_name(node: &DataNode) -> String {
    node.properties
        .field_text(WellKnownField::Name)
        .unwrap_or_else(|| node.display_name())
}

fn push_unique(nodes: &mut Vec<NodeId>, seen: &mut HashSet<NodeId>, id: &NodeId) {
    if seen.insert(id.clone()) {
        nodes.push(id.clone());
    }
}

impl ScenarioView {
    /// Symbols of the drawn node kinds and colors of the drawn groups, in
    /// drawing order.  `origin` is always listed last.
    pub fn legend(&self, colors: &ColorAssigner, source: &(dyn DataSource + Send + Sync)) -> Legend {
        let mut kinds: Vec<String> = vec![];
        let mut labels: Vec<String> = vec![];
        for node in self.state.visible_nodes() {
            if let Some(kind) = &node.kind {
                if !kinds.contains(kind) {
                    kinds.push(kind.clone());
                }
            }
            let label = self
                .dataset
                .node(&node.id)
                .and_then(|data| self.group_of(data))
                .unwrap_or_else(|| DEFAULT_COLOR_KEY.to_string());
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        if !labels.iter().any(|l| l == ORIGIN_LABEL) {
            labels.push(ORIGIN_LABEL.to_string());
        }

        Legend {
            symbols: kinds
                .into_iter()
                .map(|kind| LegendSymbol {
                    url: source.symbol_url(&kind),
                    kind,
                })
                .collect(),
            colors: labels
                .into_iter()
                .map(|label| LegendColor {
                    color: colors.assigned(&label).unwrap_or(FALLBACK_COLOR).to_string(),
                    label,
                })
                .collect(),
        }
    }

    /// Drawn edges with a member whose `content` mentions `needle`, together
    /// with their endpoints and every drawn ancestor of the underlying
    /// endpoints.  An empty needle highlights nothing.
    pub fn filter_edges_by_content(&self, needle: &str) -> Option<Highlight> {
        if needle.is_empty() {
            return None;
        }
        let mut edges = vec![];
        let mut nodes = vec![];
        let mut seen = HashSet::new();
        for group in self.state.edge_groups() {
            let mut matched = false;
            for data in group.ids.iter().filter_map(|id| self.dataset.edge(id)) {
                if !data.properties.content().iter().any(|c| c.contains(needle)) {
                    continue;
                }
                matched = true;
                for raw in [&data.source, &data.target] {
                    if self.state.has_node(raw) {
                        push_unique(&mut nodes, &mut seen, raw);
                    }
                    for ancestor in self.hierarchy.ancestors(raw) {
                        if self.state.has_node(&ancestor) {
                            push_unique(&mut nodes, &mut seen, &ancestor);
                        }
                    }
                }
            }
            if matched {
                push_unique(&mut nodes, &mut seen, &group.source);
                push_unique(&mut nodes, &mut seen, &group.target);
                edges.push(group.rendered_id());
            }
        }
        debug!(needle, edges = edges.len(), "filtered edges by content");
        Some(Highlight { edges, nodes })
    }

    /// Drawn nodes whose `details` mention `needle`.  An aggregate also
    /// matches through any of its descendants.
    pub fn filter_nodes_by_details(&self, needle: &str) -> Option<Vec<NodeId>> {
        if needle.is_empty() {
            return None;
        }
        let matches = |id: &NodeId| {
            self.dataset
                .node(id)
                .and_then(|n| n.properties.details())
                .map_or(false, |details| details.contains(needle))
        };
        Some(
            self.state
                .visible_nodes()
                .filter(|node| {
                    matches(&node.id)
                        || self
                            .hierarchy
                            .all_descendants(&node.id)
                            .iter()
                            .any(|d| matches(d))
                })
                .map(|node| node.id.clone())
                .collect(),
        )
    }

    /// The info box content for a node.  An aggregate lists its whole
    /// subtree, with nested aggregates as headings.
    pub fn node_details(&self, id: &NodeId, settings: &Settings) -> Option<NodeDetails> {
        let node = self.dataset.node(id)?;
        let entry = |data: &DataNode| DetailEntry::Entry {
            name: node_name(data),
            properties: data.properties.rows(),
        };
        let entries = if self.hierarchy.is_aggregate(id) {
            self.hierarchy
                .all_descendants(id)
                .iter()
                .filter_map(|d| self.dataset.node(d))
                .map(|data| {
                    if data.is_parent() {
                        DetailEntry::Heading {
                            name: node_name(data),
                        }
                    } else {
                        entry(data)
                    }
                })
                .collect()
        } else {
            vec![entry(node)]
        };
        Some(NodeDetails {
            id: id.clone(),
            open: settings.ui.show_details_open,
            entries,
        })
    }

    /// One record per member of a drawn edge.  `rendered_id` is the id
    /// attribute as drawn, e.g. "7,12".
    pub fn edge_details(&self, rendered_id: &str, settings: &Settings) -> Vec<EdgeDetails> {
        let name_of = |id: &NodeId| self.dataset.node(id).map(node_name).unwrap_or_default();
        rendered_id
            .split(',')
            .map(|id| EdgeId::from(id.trim()))
            .filter_map(|id| self.dataset.edge(&id))
            .map(|edge| {
                let name = match edge.properties.field_text(WellKnownField::Name) {
                    Some(name) if name != NO_NAME => name,
                    _ => settings.graph.placeholder_for_missing_edge_name.clone(),
                };
                EdgeDetails {
                    id: edge.id.clone(),
                    name,
                    relation: edge.relation.clone(),
                    relation_color: settings.ui.infobox_edge_colors.get(&edge.relation).cloned(),
                    source_name: name_of(&edge.source),
                    target_name: name_of(&edge.target),
                    properties: edge.properties.rows(),
                    open: settings.ui.show_details_open,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::scenario_view::test_support::*;

    #[test]
    fn content_filter_lights_up_merged_edge_and_ancestors() {
        let (view, _ctx, _log) = clinic_view(false);
        insta::assert_json_snapshot!(view.filter_edges_by_content("lab").unwrap(), @r###"
        {
          "edges": [
            "7,12"
          ],
          "nodes": [
            "4",
            "1"
          ]
        }
        "###);
        assert_eq!(
            view.filter_edges_by_content("no such thing"),
            Some(Highlight {
                edges: vec![],
                nodes: vec![],
            })
        );
        assert_eq!(view.filter_edges_by_content(""), None);
    }

    #[test]
    fn details_filter_searches_subtrees_of_aggregates() {
        let (collapsed, _ctx, _log) = clinic_view(false);
        assert_eq!(collapsed.filter_nodes_by_details("triage"), Some(ids(&["1"])));
        assert_eq!(collapsed.filter_nodes_by_details("inpatient"), Some(ids(&["1"])));
        assert_eq!(collapsed.filter_nodes_by_details(""), None);

        let (expanded, _ctx, _log) = clinic_view(true);
        assert_eq!(expanded.filter_nodes_by_details("triage"), Some(ids(&["2"])));
    }

    #[test]
    fn aggregate_details_list_the_subtree() {
        let (view, _ctx, _log) = clinic_view(false);
        let settings = Settings::default();

        let details = view.node_details(&"1".into(), &settings).unwrap();
        assert!(!details.open);
        let names: Vec<&str> = details
            .entries
            .iter()
            .map(|e| match e {
                DetailEntry::Heading { name } => name.as_str(),
                DetailEntry::Entry { name, .. } => name.as_str(),
            })
            .collect();
        assert_eq!(names, vec!["Admission", "Surgery"]);

        let leaf = view.node_details(&"4".into(), &settings).unwrap();
        assert_eq!(
            leaf.entries,
            vec![DetailEntry::Entry {
                name: "GP".to_string(),
                properties: vec![
                    ("name".to_string(), "GP".to_string()),
                    ("institution".to_string(), "SV".to_string()),
                ],
            }]
        );
        assert!(view.node_details(&"404".into(), &settings).is_none());
    }

    #[test]
    fn edge_details_split_merged_ids() {
        let (view, _ctx, _log) = clinic_view(false);
        let mut settings = Settings::default();
        settings.graph.placeholder_for_missing_edge_name = "(unnamed)".to_string();

        let details = view.edge_details("7,12", &settings);
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].name, "referral");
        assert_eq!(details[0].relation, "transfers");
        assert_eq!(details[0].relation_color.as_deref(), Some("#ffd73d"));
        assert_eq!(details[0].source_name, "GP");
        assert_eq!(details[0].target_name, "Admission");
        assert_eq!(details[1].name, "(unnamed)");
        assert_eq!(details[1].relation_color.as_deref(), Some("#4D81BF"));
        assert_eq!(details[1].target_name, "Surgery");

        assert!(view.edge_details("999", &settings).is_empty());
    }
}
