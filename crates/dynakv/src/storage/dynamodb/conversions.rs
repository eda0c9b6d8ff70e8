//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and the
//! key/value model. These are testable in isolation without DynamoDB access
//! and are shared with the in-memory driver so both store the same shape.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use dynakv_core::kv::keys::{self, KEY_ATTRIBUTE, VALUE_ATTRIBUTE};
use dynakv_core::kv::{BinaryCodec, HashFields, KvError, KvValue, Lookup, Result};

/// A DynamoDB item, by attribute name.
pub type Item = HashMap<String, AttributeValue>;

/// Primary key attribute value for a logical key.
pub fn key_value(key: &str) -> AttributeValue {
    AttributeValue::S(key.to_string())
}

/// Encode a scalar value: integers as `N`, everything else as `B`.
pub fn encode_value(value: &KvValue, codec: &BinaryCodec) -> AttributeValue {
    match value {
        KvValue::Int(n) => AttributeValue::N(n.to_string()),
        KvValue::Bytes(bytes) => AttributeValue::B(Blob::new(codec.encode(bytes))),
    }
}

/// Encode a hash field value. Hash fields are always binary.
pub fn encode_hash_field(value: &[u8], codec: &BinaryCodec) -> AttributeValue {
    AttributeValue::B(Blob::new(codec.encode(value)))
}

/// Decode the scalar value of an item.
///
/// A missing item is [`Lookup::Absent`]; an item without a `value` attribute
/// or with a type other than `N`/`B` is [`Lookup::Unrecognized`].
pub fn item_to_lookup(item: Option<&Item>, codec: &BinaryCodec) -> Result<Lookup> {
    let Some(item) = item else {
        return Ok(Lookup::Absent);
    };

    match item.get(VALUE_ATTRIBUTE) {
        Some(AttributeValue::B(blob)) => Ok(Lookup::Found(KvValue::Bytes(
            codec.decode(blob.as_ref())?,
        ))),
        Some(AttributeValue::N(n)) => Ok(Lookup::Found(KvValue::Int(parse_number(n)?))),
        _ => Ok(Lookup::Unrecognized),
    }
}

/// Check that the value echoed back by an update is the value that was sent.
pub fn echo_matches(sent: &AttributeValue, returned: Option<&Item>) -> bool {
    returned
        .and_then(|attributes| attributes.get(VALUE_ATTRIBUTE))
        .is_some_and(|echoed| echoed == sent)
}

/// Read the counter returned by an atomic increment.
pub fn counter_from_attributes(attributes: Option<&Item>) -> Result<i64> {
    match attributes.and_then(|a| a.get(VALUE_ATTRIBUTE)) {
        Some(AttributeValue::N(n)) => parse_number(n),
        Some(_) => Err(KvError::InvalidData(
            "incremented value is not a number".to_string(),
        )),
        None => Err(KvError::InvalidData(
            "increment did not return the new value".to_string(),
        )),
    }
}

/// Decode a hash field attribute.
///
/// Hash fields are written as `B`; an attribute of any other type has no
/// value and decodes to `None`.
pub fn decode_hash_field(
    attribute: &AttributeValue,
    codec: &BinaryCodec,
) -> Result<Option<Vec<u8>>> {
    match attribute {
        AttributeValue::B(blob) => codec.decode(blob.as_ref()).map(Some),
        _ => Ok(None),
    }
}

/// Read one hash field out of an item.
pub fn item_hash_field(
    item: Option<&Item>,
    field: &str,
    codec: &BinaryCodec,
) -> Result<Option<Vec<u8>>> {
    let attribute = keys::hash_field_attribute(field);
    match item.and_then(|i| i.get(&attribute)) {
        Some(value) => decode_hash_field(value, codec),
        None => Ok(None),
    }
}

/// Collect the hash fields of an item, dropping the primary key, the scalar
/// value and every other attribute without the hash field prefix.
///
/// Prefixed attributes that are not binary are skipped.
pub fn item_to_hash_fields(item: Option<&Item>, codec: &BinaryCodec) -> Result<HashFields> {
    let Some(item) = item else {
        return Ok(HashFields::new());
    };

    let mut fields = HashFields::new();
    for (name, value) in item.iter().filter(|(name, _)| name.as_str() != KEY_ATTRIBUTE) {
        let Some(field) = keys::hash_field_name(name) else {
            continue;
        };
        if let Some(decoded) = decode_hash_field(value, codec)? {
            fields.insert(field.to_string(), decoded);
        }
    }
    Ok(fields)
}

/// The parts of an update expression setting several attributes at once.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateParts {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Build a `SET` expression writing every hash field of `fields`.
///
/// Field names go through placeholders so any UTF-8 field name is accepted.
/// Returns `None` when there is nothing to write.
pub fn hash_fields_update(fields: &HashFields, codec: &BinaryCodec) -> Option<UpdateParts> {
    if fields.is_empty() {
        return None;
    }

    let mut assignments = Vec::with_capacity(fields.len());
    let mut names = HashMap::with_capacity(fields.len());
    let mut values = HashMap::with_capacity(fields.len());

    for (i, (field, value)) in fields.iter().enumerate() {
        let name = format!("#f{i}");
        let placeholder = format!(":f{i}");
        assignments.push(format!("{name} = {placeholder}"));
        names.insert(name, keys::hash_field_attribute(field));
        values.insert(placeholder, encode_hash_field(value, codec));
    }

    Some(UpdateParts {
        expression: format!("SET {}", assignments.join(", ")),
        names,
        values,
    })
}

/// Extract the logical keys from scanned items.
pub fn scanned_keys(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.get(KEY_ATTRIBUTE))
        .filter_map(|key| key.as_s().ok())
        .cloned()
        .collect()
}

/// Create a fresh item holding only the primary key.
pub fn new_item(key: &str) -> Item {
    let mut item = Item::new();
    item.insert(KEY_ATTRIBUTE.to_string(), key_value(key));
    item
}

fn parse_number(n: &str) -> Result<i64> {
    n.parse()
        .map_err(|_| KvError::InvalidData(format!("stored number is not an integer: {n}")))
}
