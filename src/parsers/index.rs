use serde_json::{Map, Value};

use crate::error::{GeneratorError, Result};
use crate::model::entry::RawEntry;

/// Container keys tried, in order, when the index root is an object.
const CONTAINER_KEYS: &[&str] = &["extensions", "entries", "sources", "data", "items"];

/// Decodes the raw index bytes (UTF-8, optional BOM) into a JSON document.
pub fn decode_payload(bytes: &[u8]) -> Result<Value> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(GeneratorError::Decode);
    }
    Ok(serde_json::from_str(&text)?)
}

/// Flattens an index document into entries.
///
/// Arrays yield their object elements. Objects are searched for the first
/// conventional container key holding an array, then for the first array
/// value in document order. Anything else yields nothing.
pub fn extract_entries(doc: &Value) -> Vec<RawEntry> {
    match doc {
        Value::Array(items) => objects(items),
        Value::Object(map) => container(map).map(|items| objects(items)).unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn container(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    CONTAINER_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_array))
        .or_else(|| map.values().find_map(Value::as_array))
}

fn objects(items: &[Value]) -> Vec<RawEntry> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|o| RawEntry::new(o.clone()))
        .collect()
}
