use serde_json::{Map, Value};

/// Ordered graphviz attribute map.  We lean on serde_json's "preserve_order"
/// feature so that keys are emitted in the order they were first set and
/// re-setting a key keeps its original position.
pub type Attrs = Map<String, Value>;

/// Convert a `json!({...})` object literal into an attribute map.  Anything
/// that's not an object produces an empty map.
pub fn attrs_from_json(value: Value) -> Attrs {
    match value {
        Value::Object(map) => map,
        _ => Attrs::new(),
    }
}

/// Merge `from` into `into`, overwriting existing keys in place.
pub fn merge_attrs(into: &mut Attrs, from: &Attrs) {
    for (key, value) in from {
        into.insert(key.clone(), value.clone());
    }
}

/// The textual form of an attribute value as it should appear between the
/// quotes in DOT output.
pub fn attr_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[test]
fn test_attr_text() {
    use serde_json::json;

    assert_eq!(attr_text(&json!("LR")), "LR");
    assert_eq!(attr_text(&json!(7)), "7");
    assert_eq!(attr_text(&json!(true)), "true");
    assert_eq!(attr_text(&json!(250.0 / 180.0)), "1.3888888888888888");
}

#[test]
fn test_merge_keeps_first_position() {
    use serde_json::json;

    let mut attrs = attrs_from_json(json!({ "a": 1, "b": 2 }));
    merge_attrs(&mut attrs, &attrs_from_json(json!({ "c": 3, "a": 4 })));
    let keys: Vec<&String> = attrs.keys().collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
    assert_eq!(attrs["a"], json!(4));
}
