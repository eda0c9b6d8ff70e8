//! Binary payload codec.
//!
//! Binary values can be base64-encoded before they are handed to the store.
//! The flag is fixed for a driver's lifetime; data written with one setting
//! and read with the other comes back corrupted, which is not detected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{KvError, Result};

/// Encodes and decodes the payload of `B` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryCodec {
    base64: bool,
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BinaryCodec {
    pub fn new(base64: bool) -> Self {
        Self { base64 }
    }

    pub fn is_base64(&self) -> bool {
        self.base64
    }

    /// Prepares bytes for storage.
    pub fn encode(&self, value: &[u8]) -> Vec<u8> {
        if self.base64 {
            STANDARD.encode(value).into_bytes()
        } else {
            value.to_vec()
        }
    }

    /// Restores bytes read from storage.
    pub fn decode(&self, stored: &[u8]) -> Result<Vec<u8>> {
        if self.base64 {
            STANDARD
                .decode(stored)
                .map_err(|e| KvError::InvalidData(format!("value is not valid base64: {e}")))
        } else {
            Ok(stored.to_vec())
        }
    }
}
