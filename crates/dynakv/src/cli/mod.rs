//! CLI command definitions.

pub mod table;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::client::AwsClientOptions;
use crate::config::DriverConfig;

/// Key/value store on a DynamoDB table.
#[derive(Debug, Parser)]
#[command(name = "dynakv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// DynamoDB table name.
    #[arg(long, env = "DYNAKV_TABLE")]
    pub table: Option<String>,

    /// JSON driver configuration file; environment variables are used otherwise.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Custom endpoint URL (for local DynamoDB).
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// AWS region.
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS shared config profile.
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Store binary values without base64 encoding.
    #[arg(long)]
    pub no_base64: bool,

    /// Split values wider than --max-value-width across several keys.
    #[arg(long)]
    pub large_value: bool,

    /// Chunk width in bytes for large values.
    #[arg(long)]
    pub max_value_width: Option<usize>,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Options for the default AWS client.
    pub fn client_options(&self) -> AwsClientOptions {
        AwsClientOptions {
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
            profile: self.profile.clone(),
            ..Default::default()
        }
    }

    /// Applies command-line overrides on top of `config`.
    pub fn apply_overrides(&self, mut config: DriverConfig) -> DriverConfig {
        if let Some(table) = &self.table {
            config.table = Some(table.clone());
        }
        if self.no_base64 {
            config.base64_encoded = false;
        }
        if self.large_value {
            config.enable_large_value = true;
        }
        if let Some(width) = self.max_value_width {
            config.max_value_width = width;
        }
        config
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read the value stored under a key.
    Get { key: String },
    /// Store a value under a key.
    Set {
        key: String,
        value: String,
        /// Store the value as an integer.
        #[arg(long)]
        int: bool,
    },
    /// Check whether a key exists.
    Exists { key: String },
    /// Delete a key.
    Del { key: String },
    /// Atomically increment an integer value.
    Incr { key: String },
    /// Read one hash field.
    Hget { key: String, field: String },
    /// Store one hash field.
    Hset {
        key: String,
        field: String,
        value: String,
    },
    /// Store several hash fields at once.
    Hmset {
        key: String,
        /// Fields as `field=value`.
        #[arg(required = true, value_parser = parse_field_assignment)]
        fields: Vec<(String, String)>,
    },
    /// Read every hash field of a key.
    Hgetall { key: String },
    /// Check whether a hash field exists.
    Hexists { key: String, field: String },
    /// List keys matching a pattern (`prefix*` or a substring).
    Keys { pattern: String },
    /// Table provisioning.
    Table(table::TableCommand),
}

/// Parses a `field=value` pair.
pub fn parse_field_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected field=value, got `{s}`")),
    }
}
