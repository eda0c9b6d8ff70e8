//! Transparent splitting of values wider than a configured byte width.

mod driver;
mod map;

pub use driver::{LargeValueDriver, DEFAULT_MAX_VALUE_WIDTH};
pub use map::{chunk_key, is_chunk_key, MAP_DELIMITER, MAP_IDENTIFIER};
