use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::source_interface::DataSource;
use crate::errors::{ErrorDetails, ErrorLayer, Result, ViewerError};
use crate::graph_model::{NodeId, RawRelationship};

#[derive(Debug)]
struct RemoteSource {
    base_url: String,
    /// `base_url` with a guaranteed trailing slash so `join` appends.
    root: Url,
}

fn status_error(status: reqwest::StatusCode) -> ViewerError {
    if status.is_server_error() {
        ViewerError::TransientProblem(ErrorDetails {
            layer: ErrorLayer::ServerLayer,
            message: format!("Server status of {}", status),
        })
    } else {
        ViewerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message: format!("Server status of {}", status),
        })
    }
}

async fn get(url: Url) -> Result<reqwest::Response> {
    debug!(%url, "fetching");
    let res = reqwest::get(url).await?;
    if !res.status().is_success() {
        return Err(status_error(res.status()));
    }
    Ok(res)
}

async fn get_json<T: DeserializeOwned>(url: Url) -> Result<T> {
    debug!(%url, "fetching JSON");
    let client = reqwest::Client::new();
    let res = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await?;
    if !res.status().is_success() {
        return Err(status_error(res.status()));
    }

    let raw_str = res.text().await?;
    match serde_json::from_str(&raw_str) {
        Ok(json) => Ok(json),
        Err(err) => Err(ViewerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::ServerLayer,
            message: err.to_string(),
        })),
    }
}

impl RemoteSource {
    fn with_query(&self, path: &str, key: &str, value: &str) -> Result<Url> {
        let mut url = self.root.join(path)?;
        url.query_pairs_mut().append_pair(key, value);
        Ok(url)
    }

    fn scenario_names_url(&self) -> Result<Url> {
        Ok(self.root.join("scenario/all")?)
    }

    fn scenario_url(&self, scenario: &str) -> Result<Url> {
        self.with_query("scenario/", "name", scenario)
    }

    fn by_parent_url(&self, scenario: &str) -> Result<Url> {
        self.with_query("node/hierarchies/byParent/", "scenario", scenario)
    }

    fn by_children_url(&self, scenario: &str) -> Result<Url> {
        self.with_query("node/hierarchies/byChildren/", "scenario", scenario)
    }

    fn symbol_file_url(&self, kind: &str) -> Result<Url> {
        Ok(self
            .root
            .join(&format!("symbol/{}.svg", urlencoding::encode(kind)))?)
    }
}

#[async_trait]
impl DataSource for RemoteSource {
    async fn scenario_names(&self) -> Result<Vec<String>> {
        get_json(self.scenario_names_url()?).await
    }

    async fn scenario_relationships(&self, scenario: &str) -> Result<Vec<RawRelationship>> {
        get_json(self.scenario_url(scenario)?).await
    }

    async fn hierarchy_by_parents(&self, scenario: &str) -> Result<HashMap<NodeId, Vec<NodeId>>> {
        get_json(self.by_parent_url(scenario)?).await
    }

    async fn hierarchy_by_children(&self, scenario: &str) -> Result<HashMap<NodeId, NodeId>> {
        get_json(self.by_children_url(scenario)?).await
    }

    async fn symbol(&self, kind: &str) -> Result<String> {
        let svg = get(self.symbol_file_url(kind)?).await?.text().await?;
        Ok(svg)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn parse_root(base_url: &str) -> Result<Url> {
    let mut root = Url::parse(base_url)?;
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    Ok(root)
}

pub fn make_remote_source(base_url: &str) -> Result<Box<dyn DataSource + Send + Sync>> {
    let root = parse_root(base_url)?;
    Ok(Box::new(RemoteSource {
        base_url: base_url.trim_end_matches('/').to_string(),
        root,
    }))
}
