use thiserror::Error;

/// Errors the engine can surface to a caller.
///
/// Per the error-handling contract: only "does not exist" conditions are
/// recovered internally (folded into `Changed` or a sticky state). Anything
/// that reaches this type is an unexpected environmental fault — permission
/// denied, a truncated read, a bad glob pattern supplied by the caller — and
/// should be treated as fatal by the embedding application.
#[derive(Debug, Error)]
pub enum StatCacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode cache state: {0}")]
    Encode(bincode::Error),

    #[error("failed to decode cache state: {0}")]
    Decode(bincode::Error),

    #[error("unsupported cache version: found {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid glob pattern \"{pattern}\": {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

pub type Result<T> = std::result::Result<T, StatCacheError>;
