//! AWS client factory and the registry of named factories.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;
use serde::Deserialize;

/// Registry key of the shared AWS client used when no client is configured.
pub const DEFAULT_AWS_CLIENT_KEY: &str = "generis/awsClient";

/// Static access keys for an inline client.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct StaticCredentials {
    pub key: String,
    pub secret: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("key", &self.key)
            .field("secret", &"** redacted **")
            .field("token", &self.token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

/// Options for building an AWS client.
///
/// Anything left unset falls back to the SDK's default provider chains
/// (environment, shared profile files, instance metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AwsClientOptions {
    pub region: Option<String>,
    /// Custom endpoint URL (for local DynamoDB).
    pub endpoint_url: Option<String>,
    pub profile: Option<String>,
    pub credentials: Option<StaticCredentials>,
    /// Per-operation timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl AwsClientOptions {
    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match (&self.endpoint_url, &self.region) {
            (Some(url), _) => format!("Local DynamoDB ({url})"),
            (None, Some(region)) => format!("AWS DynamoDB (region: {region})"),
            (None, None) => "AWS DynamoDB (default region)".to_string(),
        }
    }
}

/// Shared AWS SDK configuration that hands out service clients.
#[derive(Debug, Clone)]
pub struct AwsClient {
    sdk_config: SdkConfig,
}

impl AwsClient {
    /// Loads SDK configuration from the default chains with `options` applied
    /// on top.
    pub async fn from_options(options: &AwsClientOptions) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &options.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &options.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(profile) = &options.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(credentials) = &options.credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.key.clone(),
                credentials.secret.clone(),
                credentials.token.clone(),
                None,
                "dynakv",
            ));
        }
        if let Some(timeout_ms) = options.timeout_ms {
            loader = loader.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_millis(timeout_ms))
                    .build(),
            );
        }

        tracing::debug!(target_env = %options.target_display(), "Loading AWS configuration");
        Self {
            sdk_config: loader.load().await,
        }
    }

    pub fn from_sdk_config(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.sdk_config
    }

    /// Creates a DynamoDB client sharing this configuration.
    pub fn dynamo_client(&self) -> Client {
        Client::new(&self.sdk_config)
    }
}

/// Named AWS client factories available to the driver resolver.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    clients: HashMap<String, AwsClient>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `client` under `name`, builder style.
    pub fn with_client(mut self, name: impl Into<String>, client: AwsClient) -> Self {
        self.register(name, client);
        self
    }

    /// Registers `client` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, client: AwsClient) {
        self.clients.insert(name.into(), client);
    }

    pub fn get(&self, name: &str) -> Option<&AwsClient> {
        self.clients.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }
}
