//! In-memory key/value backend.
//!
//! Used in tests as a stand-in for a DynamoDB table.

mod driver;

pub use driver::InMemoryDriver;
