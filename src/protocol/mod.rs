use serde_json::{json, Value};

use crate::model::entry::RawEntry;
use crate::model::output::VersionState;
use crate::parsers::index;
use crate::services::{assemble, classify, normalize, pipeline, version};

mod command;
use command::Command;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn get_now_ms(payload: &Value) -> i64 {
    payload
        .get("now_ms")
        .and_then(|v| v.as_i64())
        .unwrap_or_else(pipeline::now_ms)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn parse_entry(payload: &Value) -> Result<RawEntry, String> {
    let entry = payload
        .get("entry")
        .and_then(|v| v.as_object())
        .ok_or_else(|| "payload.entry must be an object".to_string())?;
    Ok(RawEntry::new(entry.clone()))
}

fn parse_document(payload: &Value) -> Result<&Value, String> {
    payload
        .get("document")
        .ok_or_else(|| "payload.document is required".to_string())
}

/// Handles one JSON request line and returns one JSON response line.
pub fn handle(input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let payload = get_payload(&req);

    match Command::from(get_cmd(&req)) {
        Command::Ping => ok(id, json!({ "message": "templates-core alive" })),

        Command::NormalizeUrl => {
            let url = payload.get("url").and_then(|v| v.as_str()).unwrap_or("");
            match normalize::normalize_url(url) {
                Some(n) => ok(id, json!({ "baseUrl": n.base_url, "domain": n.domain })),
                None => ok(id, json!({ "baseUrl": null, "domain": null })),
            }
        }

        Command::ClassifyEntry => match parse_entry(payload) {
            Ok(entry) => ok(id, json!({ "engineType": classify::infer_engine_type(&entry) })),
            Err(e) => err(id, e),
        },

        Command::ExtractEntries => match parse_document(payload) {
            Ok(doc) => ok(id, json!({ "entries": index::extract_entries(doc) })),
            Err(e) => err(id, e),
        },

        Command::BuildTemplates => {
            let doc = match parse_document(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };
            let entries = index::extract_entries(doc);
            let (templates, skipped) = assemble::build_templates(&entries, get_now_ms(payload));
            ok(
                id,
                json!({
                    "totalEntries": entries.len(),
                    "templates": templates,
                    "skipped": skipped
                }),
            )
        }

        Command::CalculateVersion => {
            let source_sha = payload
                .get("source_sha256")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if source_sha.is_empty() {
                return err(id, "payload.source_sha256 is required");
            }

            let stored = match payload.get("state").cloned().unwrap_or(Value::Null) {
                Value::Null => None,
                v => match serde_json::from_value::<VersionState>(v) {
                    Ok(s) => Some(s),
                    Err(e) => return err(id, format!("invalid payload.state: {e}")),
                },
            };

            let decision = version::calculate_version(source_sha, stored.as_ref(), get_now_ms(payload));
            ok(id, json!({ "decision": decision }))
        }

        Command::Unknown => err(id, "unknown command"),
    }
}
