//! State codec (C3): versioned binary encode/decode of `(state, key,
//! result)`. Uses `bincode`, the same compact binary codec the ambient
//! stack relies on elsewhere for its on-disk cache format.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StatCacheError;

use super::MonitorStateFileSet;

/// Bumped whenever the on-disk layout of `MonitorStateFileSet`, or the hash
/// algorithm recorded against `HashedFile`/glob entries, changes.
pub const CACHE_VERSION: u32 = 1;

#[derive(Serialize)]
struct EncodeEnvelope<'a, K, V> {
    version: u32,
    state: &'a MonitorStateFileSet,
    key: &'a K,
    result: &'a V,
}

#[derive(Deserialize)]
struct DecodeEnvelope<K, V> {
    version: u32,
    state: MonitorStateFileSet,
    key: K,
    result: V,
}

/// Encodes `(state, key, result)` with a leading version tag. `bincode`
/// encodes the leading `u32` as 4 fixed-width little-endian bytes, so the
/// version can be sniffed without decoding the rest of the payload (see
/// `decode`).
pub fn encode<K: Serialize, V: Serialize>(
    state: &MonitorStateFileSet,
    key: &K,
    result: &V,
) -> Result<Vec<u8>, StatCacheError> {
    let envelope = EncodeEnvelope {
        version: CACHE_VERSION,
        state,
        key,
        result,
    };
    bincode::serialize(&envelope).map_err(StatCacheError::Encode)
}

/// Decodes a byte stream written by `encode`. A version mismatch is
/// detected before attempting to decode the body (which may not even be
/// byte-compatible across schema versions), and reported distinctly from a
/// generic decode failure — the public API folds both into `Changed`.
pub fn decode<K: DeserializeOwned, V: DeserializeOwned>(
    bytes: &[u8],
) -> Result<(MonitorStateFileSet, K, V), StatCacheError> {
    if bytes.len() < 4 {
        return Err(StatCacheError::Decode(Box::new(
            bincode::ErrorKind::SizeLimit,
        )));
    }
    let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if version != CACHE_VERSION {
        return Err(StatCacheError::UnsupportedVersion {
            found: version,
            expected: CACHE_VERSION,
        });
    }
    let envelope: DecodeEnvelope<K, V> =
        bincode::deserialize(bytes).map_err(StatCacheError::Decode)?;
    Ok((envelope.state, envelope.key, envelope.result))
}
