//! Resolves configuration into a connected key/value driver.

use std::num::NonZeroUsize;
use std::sync::Arc;

use aws_sdk_dynamodb::Client;
use serde::{Deserialize, Deserializer};

use dynakv_core::kv::{BinaryCodec, KvDriver, KvError, Result};

use crate::client::{AwsClient, AwsClientOptions, ServiceRegistry, DEFAULT_AWS_CLIENT_KEY};
use crate::config::DriverConfig;
use crate::storage::{DynamoDbDriver, LargeValueDriver};

/// Where the DynamoDB client comes from.
#[derive(Debug, Clone, Default)]
pub enum ClientSource {
    /// The shared client registered under [`DEFAULT_AWS_CLIENT_KEY`].
    #[default]
    Default,
    /// A client built from inline options.
    Inline(AwsClientOptions),
    /// An already constructed client factory.
    Factory(AwsClient),
    /// A client registered under this key.
    NamedService(String),
}

impl<'de> Deserialize<'de> for ClientSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Named(String),
            Inline(AwsClientOptions),
        }

        Ok(match Option::<Repr>::deserialize(deserializer)? {
            None => ClientSource::Default,
            Some(Repr::Named(key)) => ClientSource::NamedService(key),
            Some(Repr::Inline(options)) => ClientSource::Inline(options),
        })
    }
}

/// A driver ready for use, with the settings it was built from.
pub struct ConnectedDriver {
    pub driver: Arc<dyn KvDriver>,
    pub client: Client,
    pub table_name: String,
    pub codec: BinaryCodec,
    /// Chunk width when the large-value decorator is active.
    pub max_value_width: Option<NonZeroUsize>,
}

/// Builds drivers from a [`DriverConfig`] and a registry of named clients.
pub struct DriverResolver<'a> {
    registry: &'a ServiceRegistry,
}

impl<'a> DriverResolver<'a> {
    pub fn new(registry: &'a ServiceRegistry) -> Self {
        Self { registry }
    }

    /// Returns the configured table name.
    pub fn resolve_table(config: &DriverConfig) -> Result<String> {
        match config.table.as_deref() {
            Some(table) if !table.is_empty() => Ok(table.to_string()),
            _ => Err(KvError::Configuration(
                "DynamoDB table name is not configured".to_string(),
            )),
        }
    }

    /// Produces the DynamoDB client for `source`.
    pub async fn resolve_client(&self, source: &ClientSource) -> Result<Client> {
        match source {
            ClientSource::Default => self.named_client(DEFAULT_AWS_CLIENT_KEY),
            ClientSource::Inline(options) => {
                Ok(AwsClient::from_options(options).await.dynamo_client())
            }
            ClientSource::Factory(client) => Ok(client.dynamo_client()),
            ClientSource::NamedService(key) => self.named_client(key),
        }
    }

    fn named_client(&self, key: &str) -> Result<Client> {
        self.registry
            .get(key)
            .map(AwsClient::dynamo_client)
            .ok_or_else(|| {
                KvError::Configuration(format!(
                    "DynamoDB client config found but it's not loadable: {key}"
                ))
            })
    }

    /// Validates `config` and connects a driver.
    ///
    /// All configuration errors surface here.
    pub async fn connect(&self, config: &DriverConfig) -> Result<ConnectedDriver> {
        let table_name = Self::resolve_table(config)?;
        let max_value_width = large_value_width(config)?;
        let client = self.resolve_client(&config.client).await?;
        let codec = BinaryCodec::new(config.base64_encoded);

        let dynamo = DynamoDbDriver::new(client.clone(), table_name.clone(), codec);
        let driver = configure_persistence(dynamo, config)?;

        tracing::info!(
            table = %table_name,
            base64 = codec.is_base64(),
            large_value = max_value_width.is_some(),
            "Connected key/value driver"
        );

        Ok(ConnectedDriver {
            driver,
            client,
            table_name,
            codec,
            max_value_width,
        })
    }
}

/// Wraps `driver` in the large-value decorator when `config` asks for it.
pub fn configure_persistence<D>(driver: D, config: &DriverConfig) -> Result<Arc<dyn KvDriver>>
where
    D: KvDriver + 'static,
{
    match large_value_width(config)? {
        Some(width) => Ok(Arc::new(LargeValueDriver::new(Arc::new(driver), width))),
        None => Ok(Arc::new(driver)),
    }
}

fn large_value_width(config: &DriverConfig) -> Result<Option<NonZeroUsize>> {
    if !config.enable_large_value {
        return Ok(None);
    }
    NonZeroUsize::new(config.max_value_width)
        .map(Some)
        .ok_or_else(|| KvError::Configuration("max_value_width must be positive".to_string()))
}
