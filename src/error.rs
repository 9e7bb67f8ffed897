//! Error types for the selection codec.

use thiserror::Error;

use crate::selection::SelectionSet;

/// Errors produced while encoding, decoding, indexing or persisting a selection.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A payload token could not be parsed as an index.
    #[error("invalid token {token:?} at position {position}")]
    InvalidToken {
        /// The offending token, verbatim.
        token: String,
        /// Zero-based token position within the payload.
        position: usize,
    },

    /// A decoded index does not fit the current catalog.
    #[error("index {index} exceeds catalog size {universe_size}")]
    IndexOutOfRange {
        /// The decoded index.
        index: u64,
        /// Number of items in the catalog.
        universe_size: usize,
    },

    /// The bitset payload is not valid base64url.
    #[error("invalid base64url payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Two catalog items derive the same tiny key under a strict policy.
    #[error("duplicate key {key:?} at position {position} (first seen at {first})")]
    DuplicateKey {
        /// The colliding tiny key.
        key: String,
        /// Position of the later item.
        position: usize,
        /// Position of the item that claimed the key first.
        first: usize,
    },

    /// The transport URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A legacy fragment could not be decompressed or interpreted.
    #[error("legacy payload: {0}")]
    Legacy(String),

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The durable draft store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl CodecError {
    /// Create a legacy payload error.
    pub fn legacy(msg: impl Into<String>) -> Self {
        CodecError::Legacy(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        CodecError::Storage(msg.into())
    }

    pub(crate) fn invalid_token(token: &str, position: usize) -> Self {
        CodecError::InvalidToken {
            token: token.to_string(),
            position,
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Storage(err.to_string())
    }
}

/// A decode that hit malformed input but still recovered part of the selection.
///
/// Decoders never discard what they could read: the recovered indices ride
/// along with the first error encountered.
#[derive(Debug, Error)]
#[error("{error} (recovered {} indices)", .recovered.len())]
pub struct PartialDecode {
    /// Indices decoded before (or around) the malformed input.
    pub recovered: SelectionSet,
    /// The first problem encountered.
    #[source]
    pub error: CodecError,
}

impl PartialDecode {
    pub(crate) fn new(recovered: SelectionSet, error: CodecError) -> Self {
        Self { recovered, error }
    }
}
