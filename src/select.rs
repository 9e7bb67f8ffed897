//! Shortest-wins selection across the three encoders.

use serde::{Deserialize, Serialize};

use crate::bitset::BitsetEncoder;
use crate::delta::DeltaEncoder;
use crate::error::PartialDecode;
use crate::range::RangeEncoder;
use crate::selection::SelectionSet;
use crate::traits::SelectionEncoder;
use crate::EncodingMode;

/// A payload tagged with the encoder that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPayload {
    /// Which encoder wrote `payload`.
    pub mode: EncodingMode,
    /// ASCII payload; empty for an empty selection.
    pub payload: String,
}

impl EncodedPayload {
    /// Decode with the matching decoder.
    pub fn decode(&self, universe_size: usize) -> Result<SelectionSet, PartialDecode> {
        decode(self.mode, &self.payload, universe_size)
    }
}

/// Decode `payload` with the decoder for `mode`.
pub fn decode(
    mode: EncodingMode,
    payload: &str,
    universe_size: usize,
) -> Result<SelectionSet, PartialDecode> {
    match mode {
        EncodingMode::Range => RangeEncoder.decode(payload, universe_size),
        EncodingMode::Delta => DeltaEncoder.decode(payload, universe_size),
        EncodingMode::Bitset => BitsetEncoder.decode(payload, universe_size),
    }
}

/// Encode `selection` all three ways and keep the shortest.
///
/// Ties go to range, then delta, then bitset. An empty selection encodes
/// as `(Range, "")` so "nothing selected" stays distinguishable from "no
/// state" on restore.
pub fn encode_shortest(selection: &SelectionSet, universe_size: usize) -> EncodedPayload {
    let mut best = EncodedPayload {
        mode: EncodingMode::Range,
        payload: RangeEncoder.encode(selection, universe_size),
    };

    let challengers: [&dyn SelectionEncoder; 2] = [&DeltaEncoder, &BitsetEncoder];
    for encoder in challengers {
        let payload = encoder.encode(selection, universe_size);
        if !payload.is_empty() && payload.len() < best.payload.len() {
            best = EncodedPayload {
                mode: encoder.mode(),
                payload,
            };
        }
    }

    tracing::trace!(mode = %best.mode, len = best.payload.len(), "encoded selection");
    best
}
