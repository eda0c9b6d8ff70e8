//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `KvError` from `dynakv_core::kv`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use dynakv_core::kv::KvError;

/// Map a GetItem SDK error to KvError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table: &str,
    key: &str,
) -> KvError {
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            KvError::StoreFault(format!("Table not found: {table}"))
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            KvError::StoreFault("Throughput exceeded, please retry".to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            KvError::StoreFault("Request limit exceeded, please retry".to_string())
        }
        GetItemError::InternalServerError(_) => {
            KvError::StoreFault("DynamoDB internal server error".to_string())
        }
        err => KvError::StoreFault(format!("GetItem failed for {key}: {:?}", err)),
    }
}

/// Map an UpdateItem SDK error to KvError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    table: &str,
    key: &str,
) -> KvError {
    match err.into_service_error() {
        UpdateItemError::ResourceNotFoundException(_) => {
            KvError::StoreFault(format!("Table not found: {table}"))
        }
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            KvError::StoreFault("Throughput exceeded, please retry".to_string())
        }
        UpdateItemError::RequestLimitExceeded(_) => {
            KvError::StoreFault("Request limit exceeded, please retry".to_string())
        }
        UpdateItemError::ItemCollectionSizeLimitExceededException(_) => {
            KvError::StoreFault("Item collection size limit exceeded".to_string())
        }
        UpdateItemError::TransactionConflictException(_) => {
            KvError::StoreFault("Transaction conflict, please retry".to_string())
        }
        UpdateItemError::InternalServerError(_) => {
            KvError::StoreFault("DynamoDB internal server error".to_string())
        }
        err => KvError::StoreFault(format!("UpdateItem failed for {key}: {:?}", err)),
    }
}

/// Map a DeleteItem SDK error to KvError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    table: &str,
    key: &str,
) -> KvError {
    match err.into_service_error() {
        DeleteItemError::ResourceNotFoundException(_) => {
            KvError::StoreFault(format!("Table not found: {table}"))
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            KvError::StoreFault("Throughput exceeded, please retry".to_string())
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            KvError::StoreFault("Request limit exceeded, please retry".to_string())
        }
        DeleteItemError::TransactionConflictException(_) => {
            KvError::StoreFault("Transaction conflict, please retry".to_string())
        }
        DeleteItemError::InternalServerError(_) => {
            KvError::StoreFault("DynamoDB internal server error".to_string())
        }
        err => KvError::StoreFault(format!("DeleteItem failed for {key}: {:?}", err)),
    }
}

/// Map a Scan SDK error to KvError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<ScanError, R>,
    table: &str,
) -> KvError {
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => {
            KvError::StoreFault(format!("Table not found: {table}"))
        }
        ScanError::ProvisionedThroughputExceededException(_) => {
            KvError::StoreFault("Throughput exceeded, please retry".to_string())
        }
        ScanError::RequestLimitExceeded(_) => {
            KvError::StoreFault("Request limit exceeded, please retry".to_string())
        }
        ScanError::InternalServerError(_) => {
            KvError::StoreFault("DynamoDB internal server error".to_string())
        }
        err => KvError::StoreFault(format!("Scan failed: {:?}", err)),
    }
}

/// Map a CreateTable SDK error to KvError.
pub fn map_create_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<CreateTableError, R>,
    table: &str,
) -> KvError {
    match err.into_service_error() {
        CreateTableError::ResourceInUseException(_) => {
            KvError::StoreFault(format!("Table already exists: {table}"))
        }
        CreateTableError::LimitExceededException(_) => {
            KvError::StoreFault("Table limit exceeded".to_string())
        }
        err => KvError::StoreFault(format!("CreateTable failed: {:?}", err)),
    }
}

/// Map a DescribeTable SDK error to KvError.
pub fn map_describe_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DescribeTableError, R>,
) -> KvError {
    KvError::StoreFault(format!("DescribeTable failed: {:?}", err.into_service_error()))
}
