use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::Result;
use crate::graph_model::{attrs_from_json, Attrs};

/// Viewer settings.  Every field has a default so a settings file only needs
/// to mention what it changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub graph: GraphSettings,
    pub ui: UiSettings,
    /// Graphviz attributes for the scenario overview.  A block given in a
    /// settings file replaces the built-in block as a whole.
    pub overview_dot: DotSettings,
    /// Graphviz attributes for a single scenario.
    pub scenario_dot: DotSettings,
    /// Fixed colors per value of the coloring property.  Values not listed
    /// here get the next color of `graph.color_set`.
    pub group_colors: HashMap<String, String>,
    pub database: DatabaseSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Shown for relationships whose name is the literal "noname".
    pub placeholder_for_missing_edge_name: String,
    /// Graphviz shape for nodes without a symbol.
    pub default_shape: String,
    pub default_shape_color: String,
    /// Keep color assignments across scenario loads.
    pub color_consistency: bool,
    /// Node property whose value decides the cluster.
    pub grouping_variable: String,
    /// Node property whose value decides the color.
    pub node_coloring_attribute: String,
    pub color_set: Vec<String>,
    /// Start a scenario fully expanded (true) or fully collapsed (false).
    pub show_nodes: bool,
}

impl Default for GraphSettings {
    fn default() -> Self {
        GraphSettings {
            placeholder_for_missing_edge_name: String::new(),
            default_shape: "ribosite".to_string(),
            default_shape_color: "#808080".to_string(),
            color_consistency: false,
            grouping_variable: "institution".to_string(),
            node_coloring_attribute: "institution".to_string(),
            // ColorBrewer Set3
            color_set: [
                "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69",
                "#fccde5", "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            show_nodes: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Color per relation type used when describing edges.
    pub infobox_edge_colors: HashMap<String, String>,
    pub show_details_open: bool,
    pub show_default_tooltip: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        let infobox_edge_colors = [
            ("transfers", "#ffd73d"),
            ("produces", "rebeccapurple"),
            ("conditional", "#4D81BF"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        UiSettings {
            infobox_edge_colors,
            show_details_open: false,
            show_default_tooltip: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotSettings {
    pub graph: Attrs,
    pub node: Attrs,
    pub edge: Attrs,
}

const FONT: &str = "Helvetica,Arial,sans-serif";
const BACKGROUND: &str = "#262626";

impl DotSettings {
    pub fn overview() -> Self {
        DotSettings {
            graph: attrs_from_json(json!({
                "layout": "neato",
                "normalize": 0,
                "fontsize": 90,
                "bgcolor": BACKGROUND,
            })),
            node: attrs_from_json(json!({
                "fontname": FONT,
                "shape": "circle",
                "color": "yellow",
                "width": 2.5,
                "style": "filled",
            })),
            edge: attrs_from_json(json!({
                "len": 3.7,
                "color": "#00000088",
                "penwidth": 3,
            })),
        }
    }

    pub fn scenario() -> Self {
        DotSettings {
            graph: attrs_from_json(json!({
                "ranksep": 1,
                "rankdir": "LR",
                "fontname": FONT,
                "splines": "polyline",
                "bgcolor": BACKGROUND,
            })),
            node: attrs_from_json(json!({
                "fontname": FONT,
                "shape": "box",
                "color": "transparent",
                "style": "rounded",
            })),
            edge: attrs_from_json(json!({
                "fontname": FONT,
                "color": "#969696",
                "style": "bold",
                "penwidth": 7,
            })),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub base_url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            base_url: "http://localhost:8081".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        let group_colors = [
            ("origin", "#bc80bd"),
            ("KA", "#fdb462"),
            ("BMSGPK", "#ffed6f"),
            ("Gemeinde/Magistrat", "#ff4e41"),
            ("ELGA", "#80b1d3"),
            ("GÖG", "#fb8072"),
            ("default", "#bc80bd"),
            ("Landesgesundheitsfonds", "#d9d9d9"),
            ("SV", "#b3de69"),
            ("StatistikAT", "#fb9a99"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Settings {
            graph: GraphSettings::default(),
            ui: UiSettings::default(),
            overview_dot: DotSettings::overview(),
            scenario_dot: DotSettings::scenario(),
            group_colors,
            database: DatabaseSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(config_str: &str) -> Result<Settings> {
        Ok(toml::from_str(config_str)?)
    }

    pub fn load(path: &str) -> Result<Settings> {
        let config_str = std::fs::read_to_string(path)?;
        Settings::from_toml_str(&config_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorLayer, ViewerError};

    #[test]
    fn empty_file_yields_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.graph.grouping_variable, "institution");
        assert_eq!(settings.graph.color_set.len(), 12);
        assert!(settings.graph.show_nodes);
        assert_eq!(settings.group_colors["KA"], "#fdb462");
        assert_eq!(settings.ui.infobox_edge_colors["conditional"], "#4D81BF");
        assert_eq!(settings.scenario_dot, DotSettings::scenario());
        assert_eq!(settings.database.base_url, "http://localhost:8081");
    }

    #[test]
    fn partial_overrides() {
        let settings = Settings::from_toml_str(
            r##"
            [graph]
            show_nodes = false
            color_consistency = true

            [group_colors]
            KA = "#123456"

            [scenario_dot.graph]
            rankdir = "TB"
            "##,
        )
        .unwrap();
        assert!(!settings.graph.show_nodes);
        assert!(settings.graph.color_consistency);
        assert_eq!(settings.graph.default_shape, "ribosite");
        assert_eq!(settings.group_colors.len(), 1);
        assert_eq!(settings.scenario_dot.graph["rankdir"], json!("TB"));
        assert!(settings.scenario_dot.node.is_empty());
        assert_eq!(settings.overview_dot, DotSettings::overview());
    }

    #[test]
    fn bad_toml_is_a_config_problem() {
        match Settings::from_toml_str("[graph\nshow_nodes = ") {
            Err(ViewerError::StickyProblem(details)) => {
                assert!(matches!(details.layer, ErrorLayer::ConfigLayer))
            }
            other => panic!("expected a config problem, got {:?}", other),
        }
    }
}
