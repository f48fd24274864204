use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde_json::json;

use super::cluster::Node;
use crate::config::GraphSettings;

const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

/// Symbols are drawn into a 250x200 pixel box; graphviz wants inches at 180
/// pixels per inch for fixed size shapes.
pub const SYMBOL_WIDTH_PX: u32 = 250;
pub const SYMBOL_HEIGHT_PX: u32 = 200;
const PIXELS_PER_INCH: f64 = 180.0;

/// What a node looks like when it has no symbol.
#[derive(Clone, Debug)]
pub struct AppearanceDefaults {
    pub shape: String,
    pub fill_color: String,
}

impl AppearanceDefaults {
    pub fn from_settings(graph: &GraphSettings) -> Self {
        AppearanceDefaults {
            shape: graph.default_shape.clone(),
            fill_color: graph.default_shape_color.clone(),
        }
    }
}

impl Default for AppearanceDefaults {
    fn default() -> Self {
        AppearanceDefaults::from_settings(&GraphSettings::default())
    }
}

/// Recolor raw SVG markup and turn it into a data URI that graphviz can use as
/// a node image.  Explicit `fill="none"` attributes would shadow the injected
/// fill, so they are dropped.
pub fn tint_symbol(svg: &str, color: &str) -> String {
    let stripped = svg.trim().replace(r#"fill="none""#, "");
    let tinted = stripped.replacen("svg", &format!(r#"svg fill="{}""#, color), 1);
    format!("{}{}", SVG_DATA_URI_PREFIX, BASE64_STANDARD.encode(tinted))
}

/// Derive the rendering attributes of `node` from its symbol and color.  This
/// always starts from the raw symbol markup so calling it repeatedly produces
/// the same attributes.
pub fn resolve_appearance(node: &mut Node, defaults: &AppearanceDefaults) {
    match &node.symbol {
        Some(svg) => {
            let color = node.color.as_deref().unwrap_or(&defaults.fill_color);
            let image = tint_symbol(svg, color);
            node.attrs.insert("image".to_string(), json!(image));
        }
        None => {
            node.attrs.shift_remove("image");
            if !node.attrs.contains_key("shape") {
                node.attrs.insert("shape".to_string(), json!(defaults.shape));
                node.attrs.insert("color".to_string(), json!("black"));
                node.attrs.insert("fillcolor".to_string(), json!(defaults.fill_color));
                node.attrs.insert("style".to_string(), json!("filled"));
                node.attrs.insert("fixedsize".to_string(), json!("true"));
                node.attrs.insert(
                    "width".to_string(),
                    json!(SYMBOL_WIDTH_PX as f64 / PIXELS_PER_INCH),
                );
                node.attrs.insert(
                    "height".to_string(),
                    json!(SYMBOL_HEIGHT_PX as f64 / PIXELS_PER_INCH),
                );
            }
        }
    }
}
