use std::collections::HashMap;

use super::KvError;

/// Hash fields of a single key, by unprefixed field name.
pub type HashFields = HashMap<String, Vec<u8>>;

/// A scalar value stored under a key.
///
/// Integers are stored as DynamoDB numbers so they can be incremented
/// atomically; everything else is stored as binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvValue {
    Int(i64),
    Bytes(Vec<u8>),
}

impl KvValue {
    /// Returns the integer if this is a numeric value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            KvValue::Int(n) => Some(*n),
            KvValue::Bytes(_) => None,
        }
    }

    /// Returns the bytes if this is a binary value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            KvValue::Int(_) => None,
            KvValue::Bytes(bytes) => Some(bytes),
        }
    }
}

impl From<i64> for KvValue {
    fn from(n: i64) -> Self {
        KvValue::Int(n)
    }
}

impl From<Vec<u8>> for KvValue {
    fn from(bytes: Vec<u8>) -> Self {
        KvValue::Bytes(bytes)
    }
}

impl From<&[u8]> for KvValue {
    fn from(bytes: &[u8]) -> Self {
        KvValue::Bytes(bytes.to_vec())
    }
}

impl From<&str> for KvValue {
    fn from(s: &str) -> Self {
        KvValue::Bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for KvValue {
    fn from(s: String) -> Self {
        KvValue::Bytes(s.into_bytes())
    }
}

/// Result of a scalar read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// No item is stored under the key.
    Absent,
    /// The item exists but has no scalar value of a recognized type
    /// (e.g. an item holding only hash fields).
    Unrecognized,
    /// The decoded scalar value.
    Found(KvValue),
}

impl Lookup {
    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    /// Consumes the lookup, returning the value if one was found.
    pub fn into_value(self) -> Option<KvValue> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent | Lookup::Unrecognized => None,
        }
    }
}

/// Outcome of a write operation.
///
/// Writes never fail with an error: a store fault or a rejected input turns
/// into an unsuccessful outcome. The cause is kept for diagnostics and can be
/// ignored by callers that only care about the boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct WriteOutcome {
    error: Option<KvError>,
}

impl WriteOutcome {
    pub fn success() -> Self {
        Self { error: None }
    }

    pub fn failure(error: KvError) -> Self {
        Self { error: Some(error) }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// The cause of a failed write, if any.
    pub fn error(&self) -> Option<&KvError> {
        self.error.as_ref()
    }

    pub fn into_result(self) -> Result<(), KvError> {
        match self.error {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

impl From<WriteOutcome> for bool {
    fn from(outcome: WriteOutcome) -> Self {
        outcome.succeeded()
    }
}

impl<E: Into<KvError>> From<Result<(), E>> for WriteOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => WriteOutcome::success(),
            Err(err) => WriteOutcome::failure(err.into()),
        }
    }
}
