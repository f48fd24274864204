use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property names with a meaning to the viewer.  Everything else in a
/// `PropertyBag` is opaque detail that only gets displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WellKnownField {
    Name,
    ShortName,
    /// Free text searched by the node details filter.
    Details,
    /// List of strings searched by the edge content filter.
    Content,
}

impl WellKnownField {
    pub fn key(&self) -> &'static str {
        match self {
            WellKnownField::Name => "name",
            WellKnownField::ShortName => "nameShort",
            WellKnownField::Details => "details",
            WellKnownField::Content => "content",
        }
    }
}

/// Resolution order for the label shown on a node; the short name wins.
pub const DISPLAY_NAME_PRIORITY: [WellKnownField; 2] =
    [WellKnownField::ShortName, WellKnownField::Name];

/// Typed wrapper around the arbitrary property map attached to nodes and
/// relationships by the graph database.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(Map<String, Value>);

impl PropertyBag {
    pub fn new(map: Map<String, Value>) -> Self {
        PropertyBag(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn field(&self, field: WellKnownField) -> Option<&Value> {
        self.0.get(field.key())
    }

    /// Textual value of a property.  Scalars are stringified, lists of scalars
    /// are joined with ", ", and null/objects are treated as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(value_text)
    }

    pub fn field_text(&self, field: WellKnownField) -> Option<String> {
        self.text(field.key())
    }

    pub fn display_name(&self) -> Option<String> {
        DISPLAY_NAME_PRIORITY
            .iter()
            .find_map(|field| self.field_text(*field))
    }

    pub fn details(&self) -> Option<String> {
        self.field_text(WellKnownField::Details)
    }

    /// The `content` entries of a relationship.  A lone string is treated as a
    /// single entry.
    pub fn content(&self) -> Vec<String> {
        match self.field(WellKnownField::Content) {
            Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => vec![],
        }
    }

    /// (key, text) pairs for display, in the order the backend sent them.
    pub fn rows(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), value_text(v).unwrap_or_default()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_text)
                .collect::<Vec<String>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}
