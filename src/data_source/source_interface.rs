use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::Result;
use crate::graph_model::{NodeId, RawRelationship};

/// Where scenario data comes from: the graph database backend over HTTP, or a
/// directory of JSON files with the same payloads.
#[async_trait]
pub trait DataSource {
    /// Distinct scenario names.
    async fn scenario_names(&self) -> Result<Vec<String>>;

    /// Every relationship record tagged with `scenario`, with both endpoint
    /// nodes inlined.
    async fn scenario_relationships(&self, scenario: &str) -> Result<Vec<RawRelationship>>;

    /// Parent id to all (direct and indirect) descendant ids.
    async fn hierarchy_by_parents(&self, scenario: &str) -> Result<HashMap<NodeId, Vec<NodeId>>>;

    /// Child id to direct parent id.
    async fn hierarchy_by_children(&self, scenario: &str) -> Result<HashMap<NodeId, NodeId>>;

    /// Raw SVG markup of the symbol for a node kind.
    async fn symbol(&self, kind: &str) -> Result<String>;

    /// Base URL under which symbols can be referenced by a host UI.
    fn base_url(&self) -> &str;

    /// URL of the symbol for `kind`, for display purposes.
    fn symbol_url(&self, kind: &str) -> String {
        format!("{}/symbol/{}.svg", self.base_url().trim_end_matches('/'), kind)
    }
}
