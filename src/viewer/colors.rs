use std::collections::{HashMap, VecDeque};

use crate::config::Settings;
use crate::graph_model::{DataNode, ORIGIN_LABEL};

/// Key used for nodes that don't carry the coloring property.
pub const DEFAULT_COLOR_KEY: &str = "default";
/// Used only when the configured palette is empty.
pub const FALLBACK_COLOR: &str = "#808080";

/// Hands out colors per value of the coloring property.  Configured group
/// colors win; any other value takes the next palette color, and the palette
/// starts over once it is used up.
#[derive(Clone, Debug)]
pub struct ColorAssigner {
    assigned: HashMap<String, String>,
    palette: Vec<String>,
    remaining: VecDeque<String>,
}

impl ColorAssigner {
    pub fn new(group_colors: &HashMap<String, String>, palette: &[String]) -> Self {
        ColorAssigner {
            assigned: group_colors.clone(),
            palette: palette.to_vec(),
            remaining: palette.iter().cloned().collect(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        ColorAssigner::new(&settings.group_colors, &settings.graph.color_set)
    }

    pub fn color_for_key(&mut self, key: &str) -> String {
        if let Some(color) = self.assigned.get(key) {
            return color.clone();
        }
        if self.remaining.is_empty() {
            self.remaining = self.palette.iter().cloned().collect();
        }
        let color = self
            .remaining
            .pop_front()
            .unwrap_or_else(|| FALLBACK_COLOR.to_string());
        self.assigned.insert(key.to_string(), color.clone());
        color
    }

    /// Origin nodes share one color; everything else is colored by
    /// `coloring_key`.
    pub fn color_for_node(&mut self, node: &DataNode, coloring_key: &str) -> String {
        let key = if node.is_origin() {
            ORIGIN_LABEL.to_string()
        } else {
            node.properties
                .text(coloring_key)
                .unwrap_or_else(|| DEFAULT_COLOR_KEY.to_string())
        };
        self.color_for_key(&key)
    }

    pub fn assigned(&self, key: &str) -> Option<&str> {
        self.assigned.get(key).map(|s| s.as_str())
    }
}
