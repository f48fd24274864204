use std::collections::HashMap;

use tracing::{debug, warn};

use crate::data_source::DataSource;

/// SVG markup per node kind.  A kind whose symbol couldn't be fetched is
/// remembered as `None` so we don't ask again and the node gets the default
/// shape instead.
#[derive(Debug, Default)]
pub struct SymbolCache {
    symbols: HashMap<String, Option<String>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        SymbolCache::default()
    }

    /// Fetch the symbols for every kind not seen before.
    pub async fn ensure(&mut self, kinds: &[String], source: &(dyn DataSource + Send + Sync)) {
        for kind in kinds {
            if self.symbols.contains_key(kind) {
                continue;
            }
            let symbol = match source.symbol(kind).await {
                Ok(svg) => {
                    debug!(kind = %kind, bytes = svg.len(), "fetched symbol");
                    Some(svg)
                }
                Err(err) => {
                    warn!(kind = %kind, "symbol unavailable, using the default shape: {}", err);
                    None
                }
            };
            self.symbols.insert(kind.clone(), symbol);
        }
    }

    pub fn insert(&mut self, kind: &str, symbol: Option<String>) {
        self.symbols.insert(kind.to_string(), symbol);
    }

    pub fn get(&self, kind: &str) -> Option<&str> {
        self.symbols.get(kind).and_then(|s| s.as_deref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.symbols.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::errors::{missing_lookup, Result};
    use crate::graph_model::{NodeId, RawRelationship};

    /// Knows the "person" symbol only and counts how often it was asked.
    #[derive(Default)]
    struct OneSymbol {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DataSource for OneSymbol {
        async fn scenario_names(&self) -> Result<Vec<String>> {
            Ok(vec![])
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
            self.calls.fetch_add(1, Ordering::SeqCst);
            match kind {
                "person" => Ok("<svg/>".to_string()),
                _ => Err(missing_lookup(format!("no symbol {}", kind))),
            }
        }

        fn base_url(&self) -> &str {
            "memory:"
        }
    }

    #[tokio::test]
    async fn failed_symbols_are_remembered_as_missing() {
        let source = OneSymbol::default();
        let mut cache = SymbolCache::new();
        let kinds = vec!["person".to_string(), "ward".to_string()];

        cache.ensure(&kinds, &source).await;
        assert_eq!(cache.get("person"), Some("<svg/>"));
        assert_eq!(cache.get("ward"), None);
        assert!(cache.contains("ward"));
        assert_eq!(cache.len(), 2);

        cache.ensure(&kinds, &source).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
