//! Delta encoding: first index absolute, then gaps, all in base 36.
//!
//! `{0, 2, 4, 6}` encodes to `0.2.2.2`. Wins for evenly spaced selections
//! that range encoding would spell out one singleton at a time.

use crate::error::{CodecError, PartialDecode};
use crate::selection::SelectionSet;
use crate::traits::SelectionEncoder;
use crate::EncodingMode;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Base-36 gap encoder, query tag `d`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeltaEncoder;

impl DeltaEncoder {
    /// Create a delta encoder.
    pub fn new() -> Self {
        Self
    }
}

/// Render `value` in lowercase base 36.
pub(crate) fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.iter().rev().map(|&b| b as char).collect()
}

impl SelectionEncoder for DeltaEncoder {
    fn mode(&self) -> EncodingMode {
        EncodingMode::Delta
    }

    fn encode(&self, selection: &SelectionSet, _universe_size: usize) -> String {
        let mut parts = Vec::with_capacity(selection.len());
        let mut prev = None;
        for cur in selection.iter() {
            let gap = match prev {
                None => cur,
                Some(prev) => cur - prev,
            };
            parts.push(to_base36(gap));
            prev = Some(cur);
        }
        parts.join(".")
    }

    /// Stops at the first token that is not a base-36 number or that
    /// carries the running total past the catalog. Gaps are non-negative,
    /// so every later index would be out of range as well.
    fn decode(&self, payload: &str, universe_size: usize) -> Result<SelectionSet, PartialDecode> {
        let mut selection = SelectionSet::new();
        if payload.is_empty() {
            return Ok(selection);
        }

        let mut total: u64 = 0;
        for (position, token) in payload.split('.').enumerate() {
            let gap = match u64::from_str_radix(token.trim(), 36) {
                Ok(gap) => gap,
                Err(_) => {
                    return Err(PartialDecode::new(
                        selection,
                        CodecError::invalid_token(token, position),
                    ))
                }
            };

            total = total.saturating_add(gap);
            if total >= universe_size as u64 {
                return Err(PartialDecode::new(
                    selection,
                    CodecError::IndexOutOfRange {
                        index: total,
                        universe_size,
                    },
                ));
            }
            selection.insert(total as u32);
        }

        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base36_digits() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1295), "zz");
    }

    #[test]
    fn test_encode_gaps() {
        let enc = DeltaEncoder::new();
        assert_eq!(enc.encode(&[0u32, 1, 2, 7].into(), 10), "0.1.1.5");
        assert_eq!(enc.encode(&[40u32, 76].into(), 100), "14.10");
        assert_eq!(enc.encode(&SelectionSet::new(), 100), "");
    }

    #[test]
    fn test_round_trip() {
        let enc = DeltaEncoder::new();
        let set: SelectionSet = [3u32, 11, 22, 40, 61, 1000].into();
        let payload = enc.encode(&set, 2000);
        assert_eq!(enc.decode(&payload, 2000).unwrap(), set);
    }

    #[test]
    fn test_uppercase_digits_accepted() {
        let enc = DeltaEncoder::new();
        assert_eq!(enc.decode("A.Z", 100).unwrap().to_sorted_vec(), vec![10, 45]);
    }

    #[test]
    fn test_stops_at_first_bad_token() {
        let enc = DeltaEncoder::new();
        let err = enc.decode("2.!.3", 100).unwrap_err();
        assert_eq!(err.recovered.to_sorted_vec(), vec![2]);
        assert!(matches!(err.error, CodecError::InvalidToken { position: 1, .. }));

        // `x` is a base-36 digit (33), which pushes past a ten-item catalog.
        assert_eq!(enc.decode_lossy("2.x.3", 10).to_sorted_vec(), vec![2]);

        // Empty token between separators.
        assert_eq!(enc.decode_lossy("1..2", 10).to_sorted_vec(), vec![1]);
    }

    #[test]
    fn test_negative_gap_rejected() {
        let enc = DeltaEncoder::new();
        assert_eq!(enc.decode_lossy("5.-1", 10).to_sorted_vec(), vec![5]);
    }
}
