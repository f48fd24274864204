//! Text-level helpers for emitting DOT.  `GraphState::serialize` decides what
//! to emit; this module only knows how to spell it.

use std::borrow::Cow;
use std::collections::HashSet;

use itertools::Itertools;
use regex::Regex;
use serde_json::Value;

use crate::graph_model::{attr_text, Attrs};

pub const DOT_PROLOGUE: &str = "digraph G {\n";
pub const DOT_EPILOGUE: &str = "}\n";

const DOT_KEYWORDS: [&str; 6] = ["node", "edge", "graph", "digraph", "subgraph", "strict"];

lazy_static! {
    static ref PLAIN_ID_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref NUMERAL_RE: Regex = Regex::new(r"^-?(\.[0-9]+|[0-9]+(\.[0-9]*)?)$").unwrap();
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^A-Za-z0-9]+").unwrap();
}

/// Escape a value for use between double quotes.  Backslashes go first so
/// the ones added in front of quotes are not doubled.
pub fn escape_quoted(value: &str) -> Cow<'_, str> {
    if value.contains(['"', '\\']) {
        Cow::Owned(value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        Cow::Borrowed(value)
    }
}

/// Spell a node identity as a DOT ID.  Plain identifiers and numerals are
/// emitted raw; everything else is quoted.
pub fn dot_id(id: &str) -> Cow<'_, str> {
    let is_keyword = DOT_KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(id));
    if !is_keyword && (PLAIN_ID_RE.is_match(id) || NUMERAL_RE.is_match(id)) {
        Cow::Borrowed(id)
    } else {
        Cow::Owned(format!("\"{}\"", escape_quoted(id)))
    }
}

/// Cluster names end up in `subgraph cluster_<name>`, which graphviz only
/// accepts as an unquoted identifier, so everything but ASCII alphanumerics is
/// dropped.
pub fn sanitize_cluster_name(name: &str) -> String {
    NON_ALNUM_RE.replace_all(name, "").into_owned()
}

/// Sanitized cluster names can collide ("A/B" and "AB"); later clusters get a
/// numeric suffix so each subgraph stays distinct.
pub fn unique_cluster_name(name: &str, used: &mut HashSet<String>) -> String {
    let base = sanitize_cluster_name(name);
    let mut candidate = base.clone();
    let mut suffix = 2;
    while used.contains(&candidate) {
        candidate = format!("{}{}", base, suffix);
        suffix += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// `key="value"` pairs joined with ", ".
pub fn format_attr_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Cow<'a, str>)>) -> String {
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, escape_quoted(&value)))
        .join(", ")
}

pub fn attr_pairs(attrs: &Attrs) -> impl Iterator<Item = (&str, Cow<'_, str>)> {
    attrs
        .iter()
        .map(|(k, v): (&String, &Value)| (k.as_str(), Cow::Owned(attr_text(v))))
}

/// Accumulates DOT statements one per line.
pub struct DotWriter {
    out: String,
}

impl DotWriter {
    pub fn new() -> Self {
        DotWriter {
            out: DOT_PROLOGUE.to_string(),
        }
    }

    /// `graph [...]`, `node [...]` or `edge [...]`.  Empty blocks are skipped.
    pub fn attr_block(&mut self, kind: &str, attrs: &Attrs) {
        if attrs.is_empty() {
            return;
        }
        self.out.push_str(&format!("{} [{}]\n", kind, format_attr_pairs(attr_pairs(attrs))));
    }

    pub fn begin_cluster(&mut self, name: &str) {
        self.out.push_str(&format!("subgraph cluster_{} {{\n", name));
    }

    /// A bare `key="value"` statement, used for cluster attributes.
    pub fn attr_stmt(&mut self, key: &str, value: &Value) {
        self.out.push_str(&format!("{}=\"{}\"\n", key, escape_quoted(&attr_text(value))));
    }

    pub fn node_stmt(&mut self, id: &str, attrs: String) {
        self.out.push_str(&format!("{} [{}]\n", dot_id(id), attrs));
    }

    pub fn edge_stmt(&mut self, source: &str, target: &str, attrs: String) {
        self.out.push_str(&format!("{} -> {} [{}]\n", dot_id(source), dot_id(target), attrs));
    }

    pub fn rank_source(&mut self, id: &str) {
        self.out.push_str(&format!("{{rank=source; {}}}\n", dot_id(id)));
    }

    pub fn end_block(&mut self) {
        self.out.push_str("}\n");
    }

    pub fn finish(mut self) -> String {
        self.out.push_str(DOT_EPILOGUE);
        self.out
    }
}

impl Default for DotWriter {
    fn default() -> Self {
        DotWriter::new()
    }
}
