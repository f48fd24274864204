use serde_json::{json, Value};

use super::appearance::{resolve_appearance, AppearanceDefaults};
use crate::graph_model::{merge_attrs, Attrs, NodeId};

/// A node as it is rendered.  `attrs` is what ends up in the DOT node
/// statement; the other fields are what the appearance is derived from.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    /// The type label; also the name of the symbol to draw.
    pub kind: Option<String>,
    pub is_parent: bool,
    pub is_origin: bool,
    pub color: Option<String>,
    /// Raw SVG markup, untinted.
    pub symbol: Option<String>,
    pub attrs: Attrs,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, label: &str) -> Self {
        let id = id.into();
        let mut attrs = Attrs::new();
        attrs.insert("id".to_string(), json!(id.as_str()));
        attrs.insert("label".to_string(), json!(label));
        Node {
            id,
            kind: None,
            is_parent: false,
            is_origin: false,
            color: None,
            symbol: None,
            attrs,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_parent(mut self, is_parent: bool) -> Self {
        self.is_parent = is_parent;
        self
    }

    pub fn with_origin(mut self, is_origin: bool) -> Self {
        self.is_origin = is_origin;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_symbol(mut self, svg: impl Into<String>) -> Self {
        self.symbol = Some(svg.into());
        self
    }

    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    /// The resolved image reference, if the node is drawn with a symbol.
    pub fn image(&self) -> Option<&str> {
        self.attrs.get("image").and_then(|v| v.as_str())
    }
}

/// A named group of nodes drawn inside a common frame.  A cluster without a
/// name only exists to hold nodes; it is not framed.
#[derive(Debug)]
pub struct Cluster {
    name: Option<String>,
    cluster_attrs: Attrs,
    node_attrs: Attrs,
    nodes: Vec<Node>,
    appearance: AppearanceDefaults,
}

impl Cluster {
    pub fn new(name: Option<String>, appearance: AppearanceDefaults) -> Self {
        Cluster {
            name,
            cluster_attrs: Attrs::new(),
            node_attrs: Attrs::new(),
            nodes: vec![],
            appearance,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn cluster_attrs(&self) -> &Attrs {
        &self.cluster_attrs
    }

    pub fn node_attrs(&self) -> &Attrs {
        &self.node_attrs
    }

    pub fn set_cluster_attrs(&mut self, attrs: &Attrs) {
        merge_attrs(&mut self.cluster_attrs, attrs);
    }

    pub fn set_node_attrs(&mut self, attrs: &Attrs) {
        merge_attrs(&mut self.node_attrs, attrs);
    }

    pub fn add_node(&mut self, mut node: Node) -> &Node {
        resolve_appearance(&mut node, &self.appearance);
        self.nodes.push(node);
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        for node in nodes {
            self.add_node(node);
        }
    }

    /// Remove the first member with identity `id`.  Returns whether anything
    /// was removed.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        match self.nodes.iter().position(|n| &n.id == id) {
            Some(ix) => {
                self.nodes.remove(ix);
                true
            }
            None => false,
        }
    }

    /// Swap color and symbol of a member and re-resolve its appearance.
    /// Returns the new image reference, or `None` if the node isn't a member or
    /// is now drawn without a symbol.
    pub fn change_appearance(
        &mut self,
        id: &NodeId,
        color: Option<String>,
        symbol: Option<String>,
    ) -> Option<String> {
        let node = self.nodes.iter_mut().find(|n| &n.id == id)?;
        node.color = color;
        node.symbol = symbol;
        resolve_appearance(node, &self.appearance);
        node.image().map(|s| s.to_string())
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_model::attrs_from_json;

    fn cluster() -> Cluster {
        Cluster::new(Some("KA".to_string()), AppearanceDefaults::default())
    }

    #[test]
    fn members_keep_insertion_order() {
        let mut cluster = cluster();
        cluster.set_nodes(vec![Node::new("2", "Admission"), Node::new("3", "Surgery")]);
        cluster.add_node(Node::new("1", "Hospital stay"));
        let ids: Vec<&str> = cluster.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
        assert!(cluster.has_node(&NodeId::from("3")));
    }

    #[test]
    fn removing_absent_node_is_a_noop() {
        let mut cluster = cluster();
        cluster.add_node(Node::new("2", "Admission"));
        assert!(!cluster.remove_node(&NodeId::from("99")));
        assert_eq!(cluster.nodes().len(), 1);
        assert!(cluster.remove_node(&NodeId::from("2")));
        assert!(cluster.nodes().is_empty());
    }

    #[test]
    fn change_appearance_returns_new_image() {
        let mut cluster = cluster();
        cluster.add_node(Node::new("2", "Admission"));
        let image = cluster.change_appearance(
            &NodeId::from("2"),
            Some("#b3de69".to_string()),
            Some("<svg/>".to_string()),
        );
        assert!(image.unwrap().starts_with("data:image/svg+xml;base64,"));
        assert_eq!(
            cluster.change_appearance(&NodeId::from("7"), None, None),
            None
        );
    }

    #[test]
    fn attribute_blocks_merge() {
        let mut cluster = cluster();
        cluster.set_cluster_attrs(&attrs_from_json(json!({ "color": "#fdb462" })));
        cluster.set_cluster_attrs(&attrs_from_json(json!({ "style": "rounded, dashed, bold" })));
        assert_eq!(cluster.cluster_attrs().len(), 2);
        assert_eq!(cluster.name(), Some("KA"));
    }
}
