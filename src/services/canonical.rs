use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Compact form with keys sorted at every depth. This is the exact text
/// hashed for `templatesSha256` and written to `templates.min.json`.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String> {
    let v = sort_keys(serde_json::to_value(value)?);
    Ok(serde_json::to_string(&v)?)
}

/// Two-space indented, same key order as the canonical form.
pub fn to_pretty_string<T: Serialize>(value: &T) -> Result<String> {
    let v = sort_keys(serde_json::to_value(value)?);
    Ok(serde_json::to_string_pretty(&v)?)
}

fn sort_keys(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut fields: Vec<(String, Value)> = map.into_iter().collect();
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(fields.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_sorted_compact() {
        let v = json!({ "b": 1, "a": { "z": [ { "y": null, "x": "é" } ], "c": true } });
        assert_eq!(
            to_canonical_string(&v).unwrap(),
            r#"{"a":{"c":true,"z":[{"x":"é","y":null}]},"b":1}"#
        );
    }

    #[test]
    fn pretty_uses_two_spaces() {
        let v = json!({ "b": 1, "a": 2 });
        assert_eq!(to_pretty_string(&v).unwrap(), "{\n  \"a\": 2,\n  \"b\": 1\n}");
    }
}
