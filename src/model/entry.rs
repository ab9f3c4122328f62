use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One catalog item exactly as it appeared in the source index.
///
/// The catalog has no fixed schema, so every read goes through an
/// ordered alias list and tolerates missing or oddly typed fields.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct RawEntry(Map<String, Value>);

impl RawEntry {
    pub fn new(fields: Map<String, Value>) -> Self {
        RawEntry(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// First alias holding a string with non-whitespace content.
    pub fn first_non_blank_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .filter_map(Value::as_str)
            .find(|s| !s.trim().is_empty())
    }

    /// First alias that is present at all, even if null.
    pub fn first_present(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.0.get(*k))
    }

    /// First alias whose value is truthy (non-null, non-zero, non-empty).
    pub fn first_truthy(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find(|v| is_truthy(v))
    }

    /// Boolean-ish flag: the first present alias decides, default false.
    pub fn flag(&self, keys: &[&str]) -> bool {
        self.first_present(keys).map(coerce_bool).unwrap_or(false)
    }

    /// Nested `sources` sub-entries that are objects; anything else is ignored.
    pub fn sources(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.0
            .get("sources")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }
}

impl From<Map<String, Value>> for RawEntry {
    fn from(fields: Map<String, Value>) -> Self {
        RawEntry(fields)
    }
}

pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub fn coerce_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y" | "on"
        ),
        _ => false,
    }
}
