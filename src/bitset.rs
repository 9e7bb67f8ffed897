//! Bitset encoding: one bit per catalog item, trailing zero bytes trimmed,
//! base64url without padding.
//!
//! Length depends only on the position of the highest selected index, so
//! this is the worst-case-safe fallback for scattered selections.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::error::{CodecError, PartialDecode};
use crate::selection::SelectionSet;
use crate::traits::SelectionEncoder;
use crate::EncodingMode;

/// URL-safe alphabet; writes no padding, accepts either form, and tolerates
/// non-zero trailing bits in the final symbol.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Little-endian-within-byte bitset encoder, query tag `b`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BitsetEncoder;

impl BitsetEncoder {
    /// Create a bitset encoder.
    pub fn new() -> Self {
        Self
    }

    /// Packed bytes for `selection`, trimmed of trailing zero bytes but
    /// never shorter than one byte. Empty for an empty catalog.
    pub fn to_bytes(selection: &SelectionSet, universe_size: usize) -> Vec<u8> {
        if universe_size == 0 {
            return Vec::new();
        }

        let mut bytes = vec![0u8; universe_size.div_ceil(8)];
        for index in selection.iter() {
            let index = index as usize;
            if index >= universe_size {
                tracing::debug!(index, universe_size, "bitset skips out-of-range index");
                continue;
            }
            bytes[index >> 3] |= 1 << (index & 7);
        }

        let used = bytes.iter().rposition(|&b| b != 0).map_or(1, |last| last + 1);
        bytes.truncate(used);
        bytes
    }

    /// Selected indices below `universe_size`; bits past the end of `bytes`
    /// read as unset.
    pub fn from_bytes(bytes: &[u8], universe_size: usize) -> SelectionSet {
        (0..universe_size.min(bytes.len() * 8))
            .filter(|&i| bytes[i >> 3] & (1 << (i & 7)) != 0)
            .map(|i| i as u32)
            .collect()
    }
}

impl SelectionEncoder for BitsetEncoder {
    fn mode(&self) -> EncodingMode {
        EncodingMode::Bitset
    }

    fn encode(&self, selection: &SelectionSet, universe_size: usize) -> String {
        URL_SAFE_LENIENT.encode(Self::to_bytes(selection, universe_size))
    }

    fn decode(&self, payload: &str, universe_size: usize) -> Result<SelectionSet, PartialDecode> {
        let bytes = URL_SAFE_LENIENT
            .decode(payload.trim())
            .map_err(|err| PartialDecode::new(SelectionSet::new(), CodecError::from(err)))?;
        Ok(Self::from_bytes(&bytes, universe_size))
    }
}
