//! The document and analysis-record data model.
//!
//! `Document` is the persisted, content-addressed unit submitted at
//! stage A. `AnalysisRecord` is the mutable working set a job carries
//! through extraction and analysis; it is also what gets indexed at
//! the end of stage C.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Traffic Light Protocol sharing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tlp {
    Red,
    Amber,
    Green,
    White,
}

impl Default for Tlp {
    fn default() -> Self {
        Tlp::Amber
    }
}

impl Tlp {
    pub fn parse(s: &str) -> Option<Tlp> {
        match s.to_uppercase().as_str() {
            "RED" => Some(Tlp::Red),
            "AMBER" => Some(Tlp::Amber),
            "GREEN" => Some(Tlp::Green),
            "WHITE" => Some(Tlp::White),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tlp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tlp::Red => "RED",
            Tlp::Amber => "AMBER",
            Tlp::Green => "GREEN",
            Tlp::White => "WHITE",
        };
        write!(f, "{s}")
    }
}

/// A tagged variant tree: the shape every analyzer result is folded
/// into at the wave boundary, and the shape `AnalysisRecord.metadata`
/// and per-analyzer keys take. Deliberately mirrors the loosely-typed
/// tree the source representation uses, but with a closed set of
/// variants instead of an open dynamic type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::List(v.into_iter().map(Value::String).collect())
    }
}

impl Value {
    /// Fold any `Serialize` analyzer result into the tagged tree via
    /// its JSON representation.
    pub fn from_serializable<T: Serialize>(value: &T) -> crate::Result<Value> {
        let json = serde_json::to_value(value)?;
        Ok(Value::from_json(json))
    }

    fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A persisted, content-addressed document as accepted at submit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub hexdigest: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub tlp: Tlp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub store: bool,
}

/// The in-memory working set of a single job, mutated by exactly one
/// stage at a time and populated with per-analyzer output keys by the
/// scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub hexdigest: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub tlp: Tlp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub store: bool,

    /// Extracted plain text. Empty until stage B runs.
    #[serde(default)]
    pub content: String,

    /// Extractor-produced metadata (dates, authors, producer, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "Analyzed-Date")]
    pub analyzed_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "Creation-Date")]
    pub creation_date: Option<DateTime<Utc>>,

    /// Per-analyzer output, keyed by analyzer name.
    #[serde(flatten)]
    pub results: BTreeMap<String, Value>,
}

impl AnalysisRecord {
    pub fn new(document: Document) -> Self {
        AnalysisRecord {
            hexdigest: document.hexdigest,
            filename: document.filename,
            content_type: document.content_type,
            uri: document.uri,
            tlp: document.tlp,
            owner: document.owner,
            store: document.store,
            content: String::new(),
            metadata: BTreeMap::new(),
            analyzed_date: None,
            creation_date: None,
            results: BTreeMap::new(),
        }
    }

    /// True once an analyzer has written its key, per the scheduler's
    /// contract that only successful analyzers appear here.
    pub fn has_result(&self, analyzer_name: &str) -> bool {
        self.results.contains_key(analyzer_name)
    }

    pub fn set_result(&mut self, analyzer_name: &str, value: Value) {
        self.results.insert(analyzer_name.to_string(), value);
    }
}

/// Matches `^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$`, the strict
/// ISO-8601 UTC form stage C requires of whitelisted date metadata
/// fields before indexing.
pub fn is_strict_iso8601_utc(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 20 {
        return false;
    }
    let digit = |i: usize| bytes[i].is_ascii_digit();
    (0..4).all(digit)
        && bytes[4] == b'-'
        && digit(5)
        && digit(6)
        && bytes[7] == b'-'
        && digit(8)
        && digit(9)
        && bytes[10] == b'T'
        && digit(11)
        && digit(12)
        && bytes[13] == b':'
        && digit(14)
        && digit(15)
        && bytes[16] == b':'
        && digit(17)
        && digit(18)
        && bytes[19] == b'Z'
}
