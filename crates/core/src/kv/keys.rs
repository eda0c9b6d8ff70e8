//! Item key scheme.
//!
//! Pure functions mapping logical keys and hash fields onto attribute names.
//! These names are the stored wire shape and must not change.

/// Name of the primary key attribute (`S`).
pub const KEY_ATTRIBUTE: &str = "key";

/// Name of the scalar value attribute (`N` or `B`).
pub const VALUE_ATTRIBUTE: &str = "value";

/// Prefix of every hash field attribute (`B`).
pub const HASH_FIELD_PREFIX: &str = "hPrfx_";

/// Attribute name holding a hash field.
///
/// Pattern: `hPrfx_<field>`
pub fn hash_field_attribute(field: &str) -> String {
    format!("{HASH_FIELD_PREFIX}{field}")
}

/// Returns the field name of a hash field attribute, or `None` for the primary
/// key, the scalar value or any other attribute.
pub fn hash_field_name(attribute: &str) -> Option<&str> {
    attribute.strip_prefix(HASH_FIELD_PREFIX)
}
