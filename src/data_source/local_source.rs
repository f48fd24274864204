use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::fs::read_to_string;
use tracing::debug;

use super::source_interface::DataSource;
use crate::errors::{ErrorDetails, ErrorLayer, Result, ViewerError};
use crate::file_utils::encode_file_name;
use crate::graph_model::{NodeId, RawRelationship};

/// A directory holding the same payloads the backend would serve:
///
/// - `scenarios.json`
/// - `scenario/<name>.json`
/// - `hierarchy/by_parent/<name>.json`
/// - `hierarchy/by_child/<name>.json`
/// - `symbol/<kind>.svg`
///
/// Names are URL-encoded to form file names.
#[derive(Debug)]
struct LocalSource {
    root: PathBuf,
    base_url: String,
}

impl LocalSource {
    fn path_for(&self, dir: &str, name: &str, ext: &str) -> PathBuf {
        self.root
            .join(dir)
            .join(format!("{}.{}", encode_file_name(name), ext))
    }

    async fn read(&self, path: PathBuf) -> Result<String> {
        debug!(path = %path.display(), "reading");
        match read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(err) => Err(ViewerError::StickyProblem(ErrorDetails {
                layer: ErrorLayer::DataLayer,
                message: format!("{}: {}", path.display(), err),
            })),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, path: PathBuf) -> Result<T> {
        let raw_str = self.read(path).await?;
        Ok(serde_json::from_str(&raw_str)?)
    }
}

#[async_trait]
impl DataSource for LocalSource {
    async fn scenario_names(&self) -> Result<Vec<String>> {
        self.read_json(self.root.join("scenarios.json")).await
    }

    async fn scenario_relationships(&self, scenario: &str) -> Result<Vec<RawRelationship>> {
        self.read_json(self.path_for("scenario", scenario, "json")).await
    }

    async fn hierarchy_by_parents(&self, scenario: &str) -> Result<HashMap<NodeId, Vec<NodeId>>> {
        self.read_json(self.path_for("hierarchy/by_parent", scenario, "json"))
            .await
    }

    async fn hierarchy_by_children(&self, scenario: &str) -> Result<HashMap<NodeId, NodeId>> {
        self.read_json(self.path_for("hierarchy/by_child", scenario, "json"))
            .await
    }

    async fn symbol(&self, kind: &str) -> Result<String> {
        self.read(self.path_for("symbol", kind, "svg")).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

pub fn make_local_source(data_dir: &str) -> Result<Box<dyn DataSource + Send + Sync>> {
    let root = PathBuf::from(data_dir);
    if !root.is_dir() {
        return Err(ViewerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::BadInput,
            message: format!("Data directory '{}' does not exist", data_dir),
        }));
    }
    let base_url = format!("file://{}", data_dir.trim_end_matches('/'));
    Ok(Box::new(LocalSource { root, base_url }))
}
