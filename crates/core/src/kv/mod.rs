mod codec;
mod error;
pub mod keys;
mod patterns;
mod traits;
mod types;

pub use codec::BinaryCodec;
pub use error::{KvError, Result};
pub use patterns::ScanFilter;
pub use traits::KvDriver;
pub use types::{HashFields, KvValue, Lookup, WriteOutcome};
