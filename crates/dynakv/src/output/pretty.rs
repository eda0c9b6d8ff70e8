//! Pretty output formatting.

use dynakv_core::kv::{HashFields, KvValue, Lookup, WriteOutcome};

use crate::storage::dynamodb::table::TableSummary;

/// Format a scalar lookup for display.
pub fn format_lookup(lookup: &Lookup) -> String {
    match lookup {
        Lookup::Absent => "(absent)".to_string(),
        Lookup::Unrecognized => "(no scalar value)".to_string(),
        Lookup::Found(KvValue::Int(n)) => format!("(integer) {n}"),
        Lookup::Found(KvValue::Bytes(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Format a write outcome for display.
pub fn format_outcome(outcome: &WriteOutcome) -> String {
    match outcome.error() {
        None => "OK".to_string(),
        Some(err) => format!("FAILED: {err}"),
    }
}

pub fn format_field(value: Option<&[u8]>) -> String {
    match value {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => "(absent)".to_string(),
    }
}

/// Format hash fields for display, sorted by field name.
pub fn format_fields(fields: &HashFields) -> String {
    if fields.is_empty() {
        return "No fields found.".to_string();
    }
    let mut sorted: Vec<_> = fields.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut output = format!("FIELDS ({})\n", fields.len());
    output.push_str(&"-".repeat(40));
    for (field, value) in sorted {
        output.push_str(&format!("\n{field}: {}", String::from_utf8_lossy(value)));
    }
    output
}

/// Format keys for display.
pub fn format_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        return "No keys found.".to_string();
    }
    let mut output = format!("KEYS ({})\n", keys.len());
    output.push_str(&"-".repeat(40));
    for key in keys {
        output.push_str(&format!("\n{key}"));
    }
    output
}

pub fn format_table(summary: &TableSummary) -> String {
    let mut output = format!("{}\n  Status: {}", summary.name, summary.status);
    if let Some(count) = summary.item_count {
        output.push_str(&format!("\n  Items: {count}"));
    }
    output.push_str(&format!(
        "\n  Key schema: {}",
        if summary.key_schema_matches {
            "ok"
        } else {
            "hash key `key` missing"
        }
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynakv_core::kv::KvError;

    #[test]
    fn test_format_lookup() {
        assert_eq!(format_lookup(&Lookup::Found(KvValue::Int(7))), "(integer) 7");
        assert_eq!(format_lookup(&Lookup::Found(KvValue::from("hi"))), "hi");
        assert_eq!(format_lookup(&Lookup::Absent), "(absent)");
    }

    #[test]
    fn test_format_outcome() {
        assert_eq!(format_outcome(&WriteOutcome::success()), "OK");
        assert_eq!(
            format_outcome(&WriteOutcome::failure(KvError::InvalidInput("empty".to_string()))),
            "FAILED: Invalid input: empty"
        );
    }

    #[test]
    fn test_format_keys() {
        assert_eq!(format_keys(&[]), "No keys found.");
        let output = format_keys(&["a".to_string(), "b".to_string()]);
        assert!(output.starts_with("KEYS (2)"));
        assert!(output.ends_with("\na\nb"));
    }

    #[test]
    fn test_format_fields_sorted() {
        let fields: HashFields = [
            ("z".to_string(), b"last".to_vec()),
            ("a".to_string(), b"first".to_vec()),
        ]
        .into_iter()
        .collect();

        assert!(format_fields(&fields).ends_with("\na: first\nz: last"));
    }

    #[test]
    fn test_format_table() {
        let summary = TableSummary {
            name: "kv".to_string(),
            status: "ACTIVE".to_string(),
            item_count: Some(3),
            key_schema_matches: true,
        };
        assert_eq!(
            format_table(&summary),
            "kv\n  Status: ACTIVE\n  Items: 3\n  Key schema: ok"
        );
    }
}
