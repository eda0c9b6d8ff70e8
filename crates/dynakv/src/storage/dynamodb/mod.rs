//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of the `KvDriver`
//! trait using `aws-sdk-dynamodb`.

pub mod conversions;
mod driver;
mod error;
pub mod table;

pub use driver::{DynamoDbDriver, KeyPage, SCAN_PAGE_SIZE};
