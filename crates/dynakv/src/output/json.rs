//! JSON output formatting.

use serde_json::{json, Value};

use dynakv_core::kv::{HashFields, KvValue, Lookup, WriteOutcome};

/// Format a value as JSON.
pub fn format_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Bytes as a JSON string, replacing invalid UTF-8.
fn bytes_json(bytes: &[u8]) -> Value {
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}

pub fn lookup_json(lookup: &Lookup) -> Value {
    match lookup {
        Lookup::Absent => json!({ "found": false, "value": null }),
        Lookup::Unrecognized => json!({ "found": true, "value": null }),
        Lookup::Found(KvValue::Int(n)) => json!({ "found": true, "value": n }),
        Lookup::Found(KvValue::Bytes(bytes)) => json!({ "found": true, "value": bytes_json(bytes) }),
    }
}

pub fn outcome_json(outcome: &WriteOutcome) -> Value {
    json!({
        "success": outcome.succeeded(),
        "error": outcome.error().map(ToString::to_string),
    })
}

pub fn field_json(value: Option<&[u8]>) -> Value {
    value.map(bytes_json).unwrap_or(Value::Null)
}

/// Hash fields as a JSON object with sorted keys.
pub fn fields_json(fields: &HashFields) -> Value {
    let mut sorted: Vec<_> = fields.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    Value::Object(
        sorted
            .into_iter()
            .map(|(field, value)| (field.clone(), bytes_json(value)))
            .collect(),
    )
}
