//! dynakv - key/value persistence on a DynamoDB table.

pub mod cli;
pub mod client;
pub mod config;
pub mod output;
pub mod resolver;
pub mod storage;

pub use client::{AwsClient, AwsClientOptions, ServiceRegistry, DEFAULT_AWS_CLIENT_KEY};
pub use config::DriverConfig;
pub use resolver::{configure_persistence, ClientSource, ConnectedDriver, DriverResolver};
