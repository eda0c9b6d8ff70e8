//! Chunk map encoding for values split across several keys.

use dynakv_core::kv::{KvError, Result};

/// Separates a key from its chunk index.
pub const MAP_IDENTIFIER: &str = "<<<<mapIdentifier>>>>";

/// Wraps the chunk index list stored under the original key.
pub const MAP_DELIMITER: &str = "<<<<mapDelimiter>>>>";

/// Key under which chunk `index` of `key` is stored.
pub fn chunk_key(key: &str, index: usize) -> String {
    format!("{key}{MAP_IDENTIFIER}{index}")
}

/// True for keys written by the decorator to hold a chunk.
pub fn is_chunk_key(key: &str) -> bool {
    key.contains(MAP_IDENTIFIER)
}

/// Encodes the list of chunk indices stored under the original key.
pub fn encode_map(indices: &[usize]) -> Result<Vec<u8>> {
    let json = serde_json::to_string(indices)
        .map_err(|e| KvError::InvalidData(format!("chunk map: {e}")))?;
    Ok(format!("{MAP_DELIMITER}{json}{MAP_DELIMITER}").into_bytes())
}

/// Decodes a chunk map.
///
/// Returns `Ok(None)` when `value` is an ordinary value rather than a map.
pub fn decode_map(value: &[u8]) -> Result<Option<Vec<usize>>> {
    let delimiter = MAP_DELIMITER.as_bytes();
    if value.len() < delimiter.len() * 2
        || !value.starts_with(delimiter)
        || !value.ends_with(delimiter)
    {
        return Ok(None);
    }

    let inner = &value[delimiter.len()..value.len() - delimiter.len()];
    serde_json::from_slice(inner)
        .map(Some)
        .map_err(|e| KvError::InvalidData(format!("malformed chunk map: {e}")))
}

/// Picks `count` consecutive chunk indices that share nothing with
/// `previous`, so a live map never points at a chunk being rewritten.
///
/// Starts at zero when that range is free, otherwise right after the highest
/// previous index.
pub fn fresh_indices(previous: &[usize], count: usize) -> Vec<usize> {
    let start = if previous.iter().any(|&index| index < count) {
        previous.iter().max().map_or(0, |max| max + 1)
    } else {
        0
    };
    (start..start + count).collect()
}

/// Splits `value` into chunks of at most `width` bytes.
pub fn split(value: &[u8], width: usize) -> Vec<&[u8]> {
    value.chunks(width.max(1)).collect()
}
