use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::ids::{EdgeId, NodeId};
use super::properties::PropertyBag;

/// Label marking an aggregation node that stands in for a collapsed subtree.
pub const PARENT_LABEL: &str = "parent";
/// Label marking a dataset root that is pinned to the source rank.
pub const ORIGIN_LABEL: &str = "origin";
/// Relationship type that encodes the hierarchy rather than a relation.
pub const HIERARCHY_RELATION: &str = "includes";
/// Relationship type that renders dashed.
pub const CONDITIONAL_RELATION: &str = "conditional";

/// A node as nested inside a relationship record by the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawNode {
    pub identity: NodeId,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub props: PropertyBag,
}

/// A relationship record as returned for a scenario query, carrying both of
/// its endpoint nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawRelationship {
    pub identity: EdgeId,
    /// The relationship type.  The backend calls this "labels" even though it
    /// is a single string.
    #[serde(default)]
    pub labels: String,
    #[serde(default)]
    pub props: PropertyBag,
    pub source: RawNode,
    pub target: RawNode,
}

#[derive(Clone, Debug)]
pub struct DataNode {
    pub id: NodeId,
    pub labels: Vec<String>,
    pub properties: PropertyBag,
}

impl DataNode {
    /// The type label, which doubles as the symbol name.
    pub fn kind(&self) -> Option<&str> {
        self.labels.first().map(|s| s.as_str())
    }

    pub fn is_parent(&self) -> bool {
        self.labels.iter().any(|l| l == PARENT_LABEL)
    }

    pub fn is_origin(&self) -> bool {
        self.labels.iter().any(|l| l == ORIGIN_LABEL)
    }

    /// The value of the grouping property, which names the node's cluster.
    pub fn group(&self, grouping_key: &str) -> Option<String> {
        self.properties.text(grouping_key)
    }

    pub fn display_name(&self) -> String {
        self.properties.display_name().unwrap_or_default()
    }
}

impl From<RawNode> for DataNode {
    fn from(raw: RawNode) -> Self {
        DataNode {
            id: raw.identity,
            labels: raw.labels,
            properties: raw.props,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DataEdge {
    pub id: EdgeId,
    pub relation: String,
    pub properties: PropertyBag,
    pub source: NodeId,
    pub target: NodeId,
}

impl DataEdge {
    pub fn is_hierarchy(&self) -> bool {
        self.relation == HIERARCHY_RELATION
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}

/// The full node and edge data of one scenario, independent of what is
/// currently visible.
#[derive(Debug, Default)]
pub struct Dataset {
    nodes: Vec<DataNode>,
    node_index: HashMap<NodeId, usize>,
    edges: Vec<DataEdge>,
    edge_index: HashMap<EdgeId, usize>,
}

impl Dataset {
    /// Flatten relationship records into nodes and edges.  Nodes are
    /// deduplicated by identity (first occurrence wins) and then stably sorted
    /// by their grouping value so that members of a cluster stay in the order
    /// the backend produced them.
    pub fn from_relationships(relationships: Vec<RawRelationship>, grouping_key: &str) -> Self {
        let mut nodes: Vec<DataNode> = vec![];
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut edges = vec![];

        for rel in relationships {
            edges.push(DataEdge {
                id: rel.identity,
                relation: rel.labels,
                properties: rel.props,
                source: rel.source.identity.clone(),
                target: rel.target.identity.clone(),
            });

            for raw in [rel.source, rel.target] {
                if seen.insert(raw.identity.clone()) {
                    nodes.push(raw.into());
                }
            }
        }

        nodes.sort_by_key(|node| node.group(grouping_key));
        Dataset::new(nodes, edges)
    }

    pub fn new(nodes: Vec<DataNode>, edges: Vec<DataEdge>) -> Self {
        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let edge_index = edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        Dataset {
            nodes,
            node_index,
            edges,
            edge_index,
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&DataNode> {
        self.node_index.get(id).map(|ix| &self.nodes[*ix])
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&DataEdge> {
        self.edge_index.get(id).map(|ix| &self.edges[*ix])
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn nodes(&self) -> &[DataNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[DataEdge] {
        &self.edges
    }

    /// Edges that describe relations, i.e. everything but hierarchy links.
    pub fn relation_edges(&self) -> impl Iterator<Item = &DataEdge> {
        self.edges.iter().filter(|e| !e.is_hierarchy())
    }

    /// Distinct grouping values in node order.  `None` collects the nodes
    /// without a grouping value.
    pub fn unique_groups(&self, grouping_key: &str) -> Vec<Option<String>> {
        let mut groups: Vec<Option<String>> = vec![];
        for node in &self.nodes {
            let group = node.group(grouping_key);
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    /// Distinct node kinds, which is the set of symbols the scenario needs.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = vec![];
        for kind in self.nodes.iter().filter_map(|n| n.kind()) {
            if !kinds.iter().any(|k| k == kind) {
                kinds.push(kind.to_string());
            }
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn relationships() -> Vec<RawRelationship> {
        serde_json::from_value(json!([
            {
                "identity": 7,
                "labels": "transfers",
                "props": { "content": ["referral"] },
                "source": { "identity": "4", "labels": ["institution"], "props": { "name": "GP", "institution": "SV" } },
                "target": { "identity": "2", "labels": ["process"], "props": { "name": "Admission", "institution": "KA" } }
            },
            {
                "identity": 100,
                "labels": "includes",
                "props": {},
                "source": { "identity": "1", "labels": ["process", "parent"], "props": { "name": "Hospital stay", "institution": "KA" } },
                "target": { "identity": "2", "labels": ["process"], "props": { "name": "Admission", "institution": "KA" } }
            }
        ]))
        .unwrap()
    }

    #[test]
    fn nodes_are_deduplicated_and_grouped() {
        let dataset = Dataset::from_relationships(relationships(), "institution");
        let ids: Vec<&str> = dataset.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "4"]);
        assert_eq!(
            dataset.unique_groups("institution"),
            vec![Some("KA".to_string()), Some("SV".to_string())]
        );
        assert_eq!(dataset.kinds(), vec!["process", "institution"]);
    }

    #[test]
    fn hierarchy_edges_are_not_relations() {
        let dataset = Dataset::from_relationships(relationships(), "institution");
        assert_eq!(dataset.edges().len(), 2);
        let relations: Vec<&str> = dataset.relation_edges().map(|e| e.id.as_str()).collect();
        assert_eq!(relations, vec!["7"]);
        assert!(dataset.node(&NodeId::from("1")).unwrap().is_parent());
        assert!(dataset.edge(&EdgeId::from("7")).unwrap().touches(&NodeId::from("2")));
    }
}
