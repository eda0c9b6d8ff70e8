use std::env;

use serde::Deserialize;

use dynakv_core::kv::{KvError, Result};

use crate::resolver::ClientSource;
use crate::storage::large_value::DEFAULT_MAX_VALUE_WIDTH;

/// Driver configuration, from a JSON document or environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// Where the DynamoDB client comes from (default: the shared AWS client)
    #[serde(default)]
    pub client: ClientSource,
    /// Table holding the key/value items (required)
    #[serde(default)]
    pub table: Option<String>,
    /// Base64-encode binary values before storage (default: true)
    #[serde(default = "default_base64_encoded")]
    pub base64_encoded: bool,
    /// Split values wider than `max_value_width` across several keys (default: false)
    #[serde(default)]
    pub enable_large_value: bool,
    /// Chunk width in bytes for large values (default: 300,000)
    #[serde(default = "default_max_value_width")]
    pub max_value_width: usize,
}

fn default_base64_encoded() -> bool {
    true
}

fn default_max_value_width() -> usize {
    DEFAULT_MAX_VALUE_WIDTH
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            client: ClientSource::Default,
            table: None,
            base64_encoded: default_base64_encoded(),
            enable_large_value: false,
            max_value_width: default_max_value_width(),
        }
    }
}

impl DriverConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNAKV_CLIENT` - Registry key of the AWS client to use
    /// - `DYNAKV_TABLE` - Table name
    /// - `DYNAKV_BASE64_ENCODED` - Base64-encode binary values (default: true)
    /// - `DYNAKV_ENABLE_LARGE_VALUE` - Chunk large values (default: false)
    /// - `DYNAKV_MAX_VALUE_WIDTH` - Chunk width in bytes (default: 300,000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Parse configuration from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| KvError::Configuration(format!("invalid driver configuration: {e}")))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            client: lookup("DYNAKV_CLIENT")
                .filter(|v| !v.is_empty())
                .map(ClientSource::NamedService)
                .unwrap_or_default(),
            table: lookup("DYNAKV_TABLE"),
            base64_encoded: lookup("DYNAKV_BASE64_ENCODED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.base64_encoded),
            enable_large_value: lookup("DYNAKV_ENABLE_LARGE_VALUE")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.enable_large_value),
            max_value_width: lookup("DYNAKV_MAX_VALUE_WIDTH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_value_width),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
