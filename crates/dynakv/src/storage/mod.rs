//! Key/value driver implementations.
//!
//! This module provides concrete implementations of the `KvDriver` trait
//! defined in `dynakv_core::kv`:
//!
//! - `dynamodb`: the production backend using `aws-sdk-dynamodb`
//! - `inmemory`: a process-local backend storing the same attribute shape
//! - `large_value`: a decorator over any driver that splits oversized values

pub mod dynamodb;
pub mod inmemory;
pub mod large_value;

pub use dynamodb::DynamoDbDriver;
pub use inmemory::InMemoryDriver;
pub use large_value::LargeValueDriver;
